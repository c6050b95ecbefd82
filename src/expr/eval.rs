//! Tree-walking evaluator.

use std::cmp::Ordering;
use std::f64::consts::PI;

use super::{BinaryOp, CompareOp, Expr, LogicOp, Scope, UnaryOp, Value};
use crate::errors::ExprError;

/// Evaluate `expr` against `scope`.
pub(crate) fn evaluate<S: Scope + ?Sized>(expr: &Expr, scope: &S) -> Result<Value, ExprError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Name(name) => lookup(name, scope),
        Expr::Unary { op, operand } => unary(*op, evaluate(operand, scope)?),
        Expr::Binary { op, left, right } => {
            let left = evaluate(left, scope)?;
            let right = evaluate(right, scope)?;
            binary(*op, &left, &right)
        }
        Expr::Logic { op, left, right } => {
            let left = evaluate(left, scope)?;
            match (op, left.is_truthy()) {
                (LogicOp::And, false) | (LogicOp::Or, true) => Ok(left),
                _ => evaluate(right, scope),
            }
        }
        Expr::Compare { first, rest } => {
            let mut left = evaluate(first, scope)?;
            for (op, operand) in rest {
                let right = evaluate(operand, scope)?;
                if !compare(*op, &left, &right)? {
                    return Ok(Value::Bool(false));
                }
                left = right;
            }
            Ok(Value::Bool(true))
        }
        Expr::Conditional {
            condition,
            then,
            otherwise,
        } => {
            if evaluate(condition, scope)?.is_truthy() {
                evaluate(then, scope)
            } else {
                evaluate(otherwise, scope)
            }
        }
        Expr::Call { function, args } => {
            let args = args
                .iter()
                .map(|arg| evaluate(arg, scope))
                .collect::<Result<Vec<_>, _>>()?;
            call(function, args, scope)
        }
        Expr::Tuple(items) => items
            .iter()
            .map(|item| evaluate(item, scope))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Tuple),
    }
}

/// Scope variables shadow the builtin constants.
fn lookup<S: Scope + ?Sized>(name: &str, scope: &S) -> Result<Value, ExprError> {
    if let Some(value) = scope.lookup(name) {
        return Ok(value);
    }
    match name {
        "pi" => Ok(Value::Number(PI)),
        _ => Err(ExprError::UndefinedName(name.to_owned())),
    }
}

/// Apply `not`, unary minus or unary plus.
fn unary(op: UnaryOp, operand: Value) -> Result<Value, ExprError> {
    if op == UnaryOp::Not {
        return Ok(Value::Bool(!operand.is_truthy()));
    }
    let number = operand.as_number().ok_or_else(|| {
        let symbol = if op == UnaryOp::Neg { '-' } else { '+' };
        ExprError::Type(format!(
            "bad operand type for unary {symbol}: '{}'",
            operand.type_name()
        ))
    })?;
    Ok(Value::Number(if op == UnaryOp::Neg { -number } else { number }))
}

/// Arithmetic on two numeric operands, with `+` also joining strings.
fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, ExprError> {
    if let (BinaryOp::Add, Value::Str(a), Value::Str(b)) = (op, left, right) {
        return Ok(Value::Str(format!("{a}{b}")));
    }
    let (Some(a), Some(b)) = (left.as_number(), right.as_number()) else {
        return Err(ExprError::Type(format!(
            "unsupported operand type(s) for {}: '{}' and '{}'",
            binary_symbol(op),
            left.type_name(),
            right.type_name()
        )));
    };
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(ExprError::DivisionByZero);
            }
            a / b
        }
        BinaryOp::FloorDiv => {
            if b == 0.0 {
                return Err(ExprError::DivisionByZero);
            }
            (a / b).floor()
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                return Err(ExprError::DivisionByZero);
            }
            // Result takes the sign of the divisor.
            a - b * (a / b).floor()
        }
        BinaryOp::Pow => {
            if a == 0.0 && b < 0.0 {
                return Err(ExprError::DivisionByZero);
            }
            if a < 0.0 && b.fract() != 0.0 {
                return Err(ExprError::MathDomain("**".into()));
            }
            a.powf(b)
        }
    };
    Ok(Value::Number(result))
}

/// Source text of an arithmetic operator.
fn binary_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::FloorDiv => "//",
        BinaryOp::Mod => "%",
        BinaryOp::Pow => "**",
    }
}

/// One link of a comparison chain.
fn compare(op: CompareOp, left: &Value, right: &Value) -> Result<bool, ExprError> {
    let ordering = |left: &Value, right: &Value| left.try_cmp(right, op.symbol());
    Ok(match op {
        CompareOp::Eq => left.loose_eq(right),
        CompareOp::Ne => !left.loose_eq(right),
        CompareOp::Lt => ordering(left, right)? == Ordering::Less,
        CompareOp::Le => ordering(left, right)? != Ordering::Greater,
        CompareOp::Gt => ordering(left, right)? == Ordering::Greater,
        CompareOp::Ge => ordering(left, right)? != Ordering::Less,
        CompareOp::In => contains(right, left)?,
        CompareOp::NotIn => !contains(right, left)?,
    })
}

/// `item in container` for tuples and substrings.
fn contains(container: &Value, item: &Value) -> Result<bool, ExprError> {
    match (container, item) {
        (Value::Tuple(items), _) => Ok(items.iter().any(|candidate| candidate.loose_eq(item))),
        (Value::Str(haystack), Value::Str(needle)) => Ok(haystack.contains(needle.as_str())),
        (Value::Str(_), _) => Err(ExprError::Type(format!(
            "'in <string>' requires string as left operand, not {}",
            item.type_name()
        ))),
        _ => Err(ExprError::Type(format!(
            "argument of type '{}' is not iterable",
            container.type_name()
        ))),
    }
}

/// Call a builtin function. Names bound in `scope` are not callable.
fn call<S: Scope + ?Sized>(function: &str, args: Vec<Value>, scope: &S) -> Result<Value, ExprError> {
    if let Some(shadow) = scope.lookup(function) {
        return Err(ExprError::Type(format!(
            "'{}' object is not callable",
            shadow.type_name()
        )));
    }
    match function {
        "max" => extremum(function, args, Ordering::Greater),
        "min" => extremum(function, args, Ordering::Less),
        "abs" => {
            let [value] = exact_args::<1>(function, args, "exactly one argument")?;
            Ok(Value::Number(number_arg(function, &value)?.abs()))
        }
        "sqrt" => {
            let [value] = exact_args::<1>(function, args, "exactly one argument")?;
            let number = number_arg(function, &value)?;
            if number < 0.0 {
                return Err(ExprError::MathDomain("sqrt".into()));
            }
            Ok(Value::Number(number.sqrt()))
        }
        "round" => round(args),
        _ => Err(ExprError::UndefinedName(function.to_owned())),
    }
}

/// Exactly `N` arguments or an arity error.
fn exact_args<const N: usize>(
    function: &str,
    args: Vec<Value>,
    expected: &'static str,
) -> Result<[Value; N], ExprError> {
    let received = args.len();
    args.try_into().map_err(|_| ExprError::Arity {
        function: function.to_owned(),
        expected,
        received,
    })
}

/// Numeric argument of `function`, or a type error naming it.
fn number_arg(function: &str, value: &Value) -> Result<f64, ExprError> {
    value.as_number().ok_or_else(|| {
        ExprError::Type(format!(
            "{function}() argument must be a number, not '{}'",
            value.type_name()
        ))
    })
}

/// `max()`/`min()` over the arguments, or over a single tuple argument.
fn extremum(function: &str, args: Vec<Value>, wanted: Ordering) -> Result<Value, ExprError> {
    let candidates = match args.len() {
        0 => {
            return Err(ExprError::Arity {
                function: function.to_owned(),
                expected: "at least one argument",
                received: 0,
            })
        }
        1 => match args.into_iter().next() {
            Some(Value::Tuple(items)) => items,
            Some(other) => {
                return Err(ExprError::Type(format!(
                    "'{}' object is not iterable",
                    other.type_name()
                )))
            }
            None => Vec::new(),
        },
        _ => args,
    };
    let mut iter = candidates.into_iter();
    let mut best = iter
        .next()
        .ok_or_else(|| ExprError::EmptySequence(function.to_owned()))?;
    let symbol = if wanted == Ordering::Greater { ">" } else { "<" };
    for candidate in iter {
        if candidate.try_cmp(&best, symbol)? == wanted {
            best = candidate;
        }
    }
    Ok(best)
}

/// `round(x)` and `round(x, n)`, resolving ties to even.
fn round(args: Vec<Value>) -> Result<Value, ExprError> {
    let received = args.len();
    let mut iter = args.into_iter();
    let (Some(value), digits, None) = (iter.next(), iter.next(), iter.next()) else {
        return Err(ExprError::Arity {
            function: "round".into(),
            expected: "one or two arguments",
            received,
        });
    };
    let number = number_arg("round", &value)?;
    let Some(digits) = digits else {
        return Ok(Value::Number(number.round_ties_even()));
    };
    let digits = number_arg("round", &digits)?;
    if digits.fract() != 0.0 {
        return Err(ExprError::Type(
            "round() digit count must be an integer".into(),
        ));
    }
    let scale = 10f64.powf(digits);
    if scale == 0.0 {
        return Ok(Value::Number(0.0_f64.copysign(number)));
    }
    let scaled = number * scale;
    if !scaled.is_finite() {
        // More digits than an f64 carries.
        return Ok(Value::Number(number));
    }
    Ok(Value::Number(scaled.round_ties_even() / scale))
}
