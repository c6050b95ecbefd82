//! Runtime values produced by rule expressions.

use std::cmp::Ordering;
use std::fmt;

use crate::errors::ExprError;

/// A value flowing through a rule expression.
///
/// Parameters enter the interpreter as numbers, booleans or strings; tuples only
/// appear as literals on the right-hand side of `in` or as the argument to
/// `max()`/`min()`.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// A float. Integers in the source are read as floats as well.
    Number(f64),
    /// A boolean, which takes part in arithmetic as 0 or 1.
    Bool(bool),
    /// A string, used for enum parameters.
    Str(String),
    /// An immutable sequence.
    Tuple(Vec<Value>),
}

impl Value {
    /// Return the name of the value's type as shown in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "float",
            Self::Bool(_) => "bool",
            Self::Str(_) => "str",
            Self::Tuple(_) => "tuple",
        }
    }

    /// Truthiness: zero, `False`, empty strings and empty tuples are falsy.
    ///
    /// # Examples
    /// ```
    /// use paramcad::Value;
    ///
    /// assert!(Value::Number(0.5).is_truthy());
    /// assert!(!Value::Str(String::new()).is_truthy());
    /// ```
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Number(n) => *n != 0.0,
            Self::Bool(b) => *b,
            Self::Str(s) => !s.is_empty(),
            Self::Tuple(items) => !items.is_empty(),
        }
    }

    /// Numeric view of the value; booleans count as 0 and 1.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Str(_) | Self::Tuple(_) => None,
        }
    }

    /// Equality that never fails: unrelated types simply compare unequal.
    #[must_use]
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Tuple(a), Self::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            _ => match (self.as_number(), other.as_number()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    /// Ordering between numbers or between strings.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::Type`] when the operands cannot be ordered, naming
    /// `op` in the message.
    pub fn try_cmp(&self, other: &Value, op: &str) -> Result<Ordering, ExprError> {
        let unorderable = || {
            ExprError::Type(format!(
                "'{op}' not supported between instances of '{}' and '{}'",
                self.type_name(),
                other.type_name()
            ))
        };
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => Ok(a.cmp(b)),
            _ => {
                let a = self.as_number().ok_or_else(unorderable)?;
                let b = other.as_number().ok_or_else(unorderable)?;
                // NaN cannot be ordered; treat it like mismatched types.
                a.partial_cmp(&b).ok_or_else(unorderable)
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Str(s) => write!(f, "'{s}'"),
            Self::Tuple(items) => {
                f.write_str("(")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}
