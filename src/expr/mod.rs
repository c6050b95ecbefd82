//! A small, side-effect free expression language for catalog rules.
//!
//! Rule conditions in the piece catalog are written in a compact infix notation
//! such as `margen_perforacion >= diametro_perforacion * 1.5` or
//! `not tiene_ranuras or largo_ranura <= largo * 0.6`. This module lexes,
//! parses and evaluates those strings against a [`Scope`] of parameter values.
//! Nothing in an expression can reach outside the interpreter: the only names
//! available are the scope's variables, the constant `pi` and the builtins
//! `max`, `min`, `abs`, `round` and `sqrt`.
//!
//! # Examples
//! ```
//! use std::collections::BTreeMap;
//! use paramcad::expr::{parse, Value};
//!
//! let rule = parse("largo >= 2 * margen + d").expect("rule parses");
//! let mut scope = BTreeMap::new();
//! scope.insert("largo".to_string(), Value::Number(300.0));
//! scope.insert("margen".to_string(), Value::Number(30.0));
//! scope.insert("d".to_string(), Value::Number(18.0));
//! assert!(rule.evaluate(&scope).expect("rule evaluates").is_truthy());
//! ```

/// Tree-walking evaluator.
mod eval;
/// Tokenizer.
mod lexer;
/// Recursive descent parser.
mod parser;
/// Runtime values.
mod value;

use std::collections::{BTreeMap, BTreeSet};

use crate::errors::ExprError;

pub use value::Value;

/// Names of the builtin functions callable from an expression.
pub const BUILTIN_FUNCTIONS: [&str; 5] = ["max", "min", "abs", "round", "sqrt"];

/// Names of the builtin constants.
pub const BUILTIN_CONSTANTS: [&str; 1] = ["pi"];

/// Parse an expression string into an [`Expr`].
///
/// # Errors
///
/// Returns [`ExprError`] when `source` is not a well-formed expression.
pub fn parse(source: &str) -> Result<Expr, ExprError> {
    let tokens = lexer::tokenize(source)?;
    parser::Parser::new(tokens).parse()
}

/// Source of variable values for expression evaluation.
pub trait Scope {
    /// Look up the value bound to `name`, if any.
    fn lookup(&self, name: &str) -> Option<Value>;
}

impl Scope for BTreeMap<String, Value> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl<S: Scope + ?Sized> Scope for &S {
    fn lookup(&self, name: &str) -> Option<Value> {
        (**self).lookup(name)
    }
}

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation.
    Neg,
    /// Unary plus.
    Pos,
    /// Logical negation.
    Not,
}

/// Binary arithmetic operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `//`
    FloorDiv,
    /// `%`
    Mod,
    /// `**`
    Pow,
}

/// Short-circuit logical operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicOp {
    /// `and`
    And,
    /// `or`
    Or,
}

/// Comparison operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `in`
    In,
    /// `not in`
    NotIn,
}

impl CompareOp {
    /// Source spelling of the operator.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::In => "in",
            Self::NotIn => "not in",
        }
    }
}

/// Parsed expression tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A literal value.
    Literal(Value),
    /// A variable or constant reference.
    Name(String),
    /// A unary operation.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Expr>,
    },
    /// A binary arithmetic operation.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// `and` / `or`.
    Logic {
        /// Operator.
        op: LogicOp,
        /// Left operand, always evaluated.
        left: Box<Expr>,
        /// Right operand, evaluated only when `left` does not decide.
        right: Box<Expr>,
    },
    /// A comparison chain such as `a < b <= c`.
    Compare {
        /// Leftmost operand.
        first: Box<Expr>,
        /// Each subsequent operator and operand.
        rest: Vec<(CompareOp, Expr)>,
    },
    /// `then if condition else otherwise`.
    Conditional {
        /// Selector.
        condition: Box<Expr>,
        /// Value when the condition is truthy.
        then: Box<Expr>,
        /// Value when the condition is falsy.
        otherwise: Box<Expr>,
    },
    /// A builtin call.
    Call {
        /// Function name.
        function: String,
        /// Positional arguments.
        args: Vec<Expr>,
    },
    /// A tuple display.
    Tuple(Vec<Expr>),
}

impl Expr {
    /// Evaluate the expression against `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError`] for undefined names, type mismatches, division by
    /// zero and math domain errors.
    pub fn evaluate<S: Scope + ?Sized>(&self, scope: &S) -> Result<Value, ExprError> {
        eval::evaluate(self, scope)
    }

    /// Collect the free variable names referenced by the expression.
    ///
    /// Builtin function names and the `pi` constant are excluded.
    #[must_use]
    pub fn names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_names(&mut names);
        names
    }

    /// Add the names referenced by this node and its children to `names`.
    fn collect_names(&self, names: &mut BTreeSet<String>) {
        match self {
            Self::Literal(_) => {}
            Self::Name(name) => {
                if !BUILTIN_CONSTANTS.contains(&name.as_str()) {
                    names.insert(name.clone());
                }
            }
            Self::Unary { operand, .. } => operand.collect_names(names),
            Self::Binary { left, right, .. } | Self::Logic { left, right, .. } => {
                left.collect_names(names);
                right.collect_names(names);
            }
            Self::Compare { first, rest } => {
                first.collect_names(names);
                for (_, operand) in rest {
                    operand.collect_names(names);
                }
            }
            Self::Conditional {
                condition,
                then,
                otherwise,
            } => {
                condition.collect_names(names);
                then.collect_names(names);
                otherwise.collect_names(names);
            }
            Self::Call { args, .. } => {
                for arg in args {
                    arg.collect_names(names);
                }
            }
            Self::Tuple(items) => {
                for item in items {
                    item.collect_names(names);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_skip_builtins() {
        let expr = parse("sqrt(largo ** 2 + ancho ** 2) > pi * max(d, 1)").expect("parses");
        let names: Vec<String> = expr.names().into_iter().collect();
        assert_eq!(names, vec!["ancho", "d", "largo"]);
    }

    #[test]
    fn names_walk_conditionals_and_tuples() {
        let expr = parse("a if b in (c, 'x') else not d").expect("parses");
        let names: Vec<String> = expr.names().into_iter().collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
    }
}
