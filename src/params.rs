//! Parameter sets: raw user input coerced against a piece definition.

use std::collections::{BTreeMap, HashMap};

use crate::catalog::{ParameterKind, ParameterSpec, PieceSpec};
use crate::errors::{CatalogError, ParameterError};
use crate::expr::{Scope, Value};

impl ParameterSpec {
    /// Coerce a JSON value into a typed parameter value.
    ///
    /// Floats accept numbers and numeric strings, enums accept one of their
    /// option values and booleans accept JSON booleans or the words accepted by
    /// [`ParameterSpec::coerce_str`].
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError`] when the value has the wrong type, lies
    /// outside the declared bounds or is not a declared option.
    pub fn coerce(&self, raw: &serde_json::Value) -> Result<Value, ParameterError> {
        match (&self.kind, raw) {
            (ParameterKind::Float { .. }, serde_json::Value::Number(number)) => {
                let value = number.as_f64().ok_or_else(|| self.wrong_type(raw))?;
                self.check_range(value)
            }
            (ParameterKind::Bool, serde_json::Value::Bool(flag)) => Ok(Value::Bool(*flag)),
            (_, serde_json::Value::String(text)) => self.coerce_str(text),
            _ => Err(self.wrong_type(raw)),
        }
    }

    /// Coerce text, as typed on a command line, into a typed parameter value.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError`] under the same conditions as
    /// [`ParameterSpec::coerce`].
    pub fn coerce_str(&self, text: &str) -> Result<Value, ParameterError> {
        let trimmed = text.trim();
        match &self.kind {
            ParameterKind::Float { .. } => {
                let value = trimmed
                    .parse::<f64>()
                    .map_err(|_| self.wrong_type_text(text))?;
                self.check_range(value)
            }
            ParameterKind::Enum { options } => options
                .iter()
                .find(|option| option.value == trimmed)
                .map(|option| Value::Str(option.value.clone()))
                .ok_or_else(|| ParameterError::UnknownOption {
                    parameter: self.name.clone(),
                    value: trimmed.to_owned(),
                    options: options
                        .iter()
                        .map(|option| option.value.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                }),
            ParameterKind::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(Value::Bool(true)),
                "false" | "no" | "0" => Ok(Value::Bool(false)),
                _ => Err(self.wrong_type_text(text)),
            },
        }
    }

    /// Reject non-finite values and values outside the declared bounds.
    fn check_range(&self, value: f64) -> Result<Value, ParameterError> {
        if !value.is_finite() {
            return Err(self.wrong_type_text(&value.to_string()));
        }
        if let ParameterKind::Float { min, max, .. } = &self.kind {
            let low = min.unwrap_or(f64::NEG_INFINITY);
            let high = max.unwrap_or(f64::INFINITY);
            if value < low || value > high {
                return Err(ParameterError::OutOfRange {
                    parameter: self.name.clone(),
                    value,
                    min: low,
                    max: high,
                });
            }
        }
        Ok(Value::Number(value))
    }

    /// What a value of this kind looks like, for error messages.
    fn expected(&self) -> &'static str {
        match self.kind {
            ParameterKind::Float { .. } => "a finite number",
            ParameterKind::Enum { .. } => "an option string",
            ParameterKind::Bool => "a boolean",
        }
    }

    /// Wrong type error for a JSON value.
    fn wrong_type(&self, raw: &serde_json::Value) -> ParameterError {
        self.wrong_type_text(&raw.to_string())
    }

    /// Wrong type error for raw text.
    fn wrong_type_text(&self, received: &str) -> ParameterError {
        ParameterError::WrongType {
            parameter: self.name.clone(),
            expected: self.expected(),
            received: received.to_owned(),
        }
    }
}

/// Convert a JSON value into an expression value; `null` and objects have no
/// counterpart.
#[must_use]
pub fn json_to_value(raw: &serde_json::Value) -> Option<Value> {
    match raw {
        serde_json::Value::Number(number) => number.as_f64().map(Value::Number),
        serde_json::Value::Bool(flag) => Some(Value::Bool(*flag)),
        serde_json::Value::String(text) => Some(Value::Str(text.clone())),
        serde_json::Value::Array(items) => items
            .iter()
            .map(json_to_value)
            .collect::<Option<Vec<_>>>()
            .map(Value::Tuple),
        serde_json::Value::Null | serde_json::Value::Object(_) => None,
    }
}

/// Inverse of [`json_to_value`].
fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Number(n) => serde_json::Number::from_f64(*n)
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        Value::Bool(flag) => serde_json::Value::Bool(*flag),
        Value::Str(text) => serde_json::Value::String(text.clone()),
        Value::Tuple(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
    }
}

/// Typed parameter values for one piece, keyed by parameter name.
///
/// # Examples
/// ```
/// use paramcad::{Catalog, ParameterSet, Value};
///
/// let catalog = Catalog::builtin().expect("embedded catalog is valid");
/// let plate = catalog.piece("base_plate").expect("base plate is listed");
/// let mut params = ParameterSet::defaults(plate).expect("defaults coerce");
/// params.set_str(plate, "espesor", "16").expect("16 mm is in range");
/// assert_eq!(params.get("espesor"), Some(&Value::Number(16.0)));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterSet {
    /// Values by parameter name.
    values: BTreeMap<String, Value>,
}

impl ParameterSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The default values of every parameter of `piece`.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError`] when a catalog default does not coerce.
    pub fn defaults(piece: &PieceSpec) -> Result<Self, ParameterError> {
        let values = piece
            .parameters
            .iter()
            .map(|spec| {
                spec.coerce(&spec.default)
                    .map(|value| (spec.name.clone(), value))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(Self { values })
    }

    /// Defaults of `piece` overlaid with the entries of a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError`] for unknown names and values that do not
    /// coerce.
    pub fn from_json_object(
        piece: &PieceSpec,
        object: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self, ParameterError> {
        let mut params = Self::defaults(piece)?;
        for (name, raw) in object {
            params.set(piece, name, raw)?;
        }
        Ok(params)
    }

    /// Coerce and store a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::Unknown`] when `piece` has no parameter
    /// `name`, or the coercion error otherwise.
    pub fn set(
        &mut self,
        piece: &PieceSpec,
        name: &str,
        raw: &serde_json::Value,
    ) -> Result<(), ParameterError> {
        let spec = lookup(piece, name)?;
        let value = spec.coerce(raw)?;
        self.values.insert(spec.name.clone(), value);
        Ok(())
    }

    /// Coerce and store a textual value.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::Unknown`] when `piece` has no parameter
    /// `name`, or the coercion error otherwise.
    pub fn set_str(&mut self, piece: &PieceSpec, name: &str, text: &str) -> Result<(), ParameterError> {
        let spec = lookup(piece, name)?;
        let value = spec.coerce_str(text)?;
        self.values.insert(spec.name.clone(), value);
        Ok(())
    }

    /// Apply a `name=value` assignment.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::MalformedAssignment`] when there is no `=`,
    /// otherwise the errors of [`ParameterSet::set_str`].
    pub fn apply_assignment(&mut self, piece: &PieceSpec, assignment: &str) -> Result<(), ParameterError> {
        let (name, text) = assignment
            .split_once('=')
            .ok_or_else(|| ParameterError::MalformedAssignment(assignment.to_owned()))?;
        self.set_str(piece, name.trim(), text)
    }

    /// Value stored under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Numeric value stored under `name`, if it is a number.
    #[must_use]
    pub fn number(&self, name: &str) -> Option<f64> {
        match self.values.get(name) {
            Some(Value::Number(n)) => Some(*n),
            _ => None,
        }
    }

    /// Number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the set holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Parameters of `piece` that should be shown given the current values.
    ///
    /// A parameter is visible when each of its `depends_on` controllers is
    /// visible and holds the required value. Hidden parameters keep their
    /// value and remain available to rules. The result follows the piece's
    /// parameter order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the piece's dependencies are broken.
    pub fn visible<'a>(&self, piece: &'a PieceSpec) -> Result<Vec<&'a ParameterSpec>, CatalogError> {
        let mut shown: HashMap<&str, bool> = HashMap::new();
        for spec in piece.dependency_order()? {
            let holds = spec.depends_on.iter().all(|(controller, required)| {
                let controller_shown = shown.get(controller.as_str()).copied().unwrap_or(false);
                let matches = match (self.values.get(controller), json_to_value(required)) {
                    (Some(actual), Some(required)) => actual.loose_eq(&required),
                    _ => false,
                };
                controller_shown && matches
            });
            shown.insert(spec.name.as_str(), holds);
        }
        Ok(piece
            .parameters
            .iter()
            .filter(|spec| shown.get(spec.name.as_str()).copied().unwrap_or(false))
            .collect())
    }

    /// The set as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Map<String, serde_json::Value> {
        self.values
            .iter()
            .map(|(name, value)| (name.clone(), value_to_json(value)))
            .collect()
    }
}

impl Scope for ParameterSet {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }
}

/// The parameter `name` of `piece`, or [`ParameterError::Unknown`].
fn lookup<'a>(piece: &'a PieceSpec, name: &str) -> Result<&'a ParameterSpec, ParameterError> {
    piece
        .parameter(name)
        .ok_or_else(|| ParameterError::Unknown(name.to_owned()))
}
