//! Manufacturability validation engine.
//!
//! The engine evaluates each catalog rule against a parameter scope and
//! collects a message for every rule that does not hold. A rule that cannot be
//! evaluated never aborts validation: it is reported as an error so a broken
//! catalog entry cannot let invalid parameters through.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::{PieceSpec, ValidationRule};
use crate::expr::Scope;
use crate::layout::{self, PlateLayout};
use crate::params::ParameterSet;

/// How serious a failed rule is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The piece can be produced but deserves a second look.
    Warning,
    /// The piece cannot be produced as specified.
    #[default]
    Error,
}

impl Severity {
    /// Lowercase name, as written in the catalog.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finding reported by validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationMessage {
    /// Id of the rule or check that produced the finding.
    pub rule_id: String,
    /// Severity of the finding.
    pub severity: Severity,
    /// Text shown to the user.
    pub message: String,
}

impl ValidationMessage {
    /// Create a message.
    #[must_use]
    pub fn new(rule_id: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            severity,
            message: message.into(),
        }
    }
}

/// Outcome of validating a parameter set.
///
/// `is_valid` is kept in step with `messages`: it is true exactly when no
/// message has [`Severity::Error`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    /// True when no message is an error.
    is_valid: bool,
    /// Messages in rule order.
    messages: Vec<ValidationMessage>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::from_messages(Vec::new())
    }
}

impl ValidationResult {
    /// Build a result from messages in reporting order.
    #[must_use]
    pub fn from_messages(messages: Vec<ValidationMessage>) -> Self {
        let is_valid = messages.iter().all(|m| m.severity != Severity::Error);
        Self { is_valid, messages }
    }

    /// Whether no message is an error.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// All messages in reporting order.
    #[must_use]
    pub fn messages(&self) -> &[ValidationMessage] {
        &self.messages
    }

    /// Messages with [`Severity::Error`].
    #[must_use]
    pub fn errors(&self) -> Vec<&ValidationMessage> {
        self.with_severity(Severity::Error)
    }

    /// Messages with [`Severity::Warning`].
    #[must_use]
    pub fn warnings(&self) -> Vec<&ValidationMessage> {
        self.with_severity(Severity::Warning)
    }

    /// Append further messages.
    pub fn extend(&mut self, messages: impl IntoIterator<Item = ValidationMessage>) {
        self.messages.extend(messages);
        self.is_valid = self.messages.iter().all(|m| m.severity != Severity::Error);
    }

    /// Treat every warning as an error.
    #[must_use]
    pub fn promote_warnings(self) -> Self {
        Self::from_messages(
            self.messages
                .into_iter()
                .map(|m| ValidationMessage {
                    severity: Severity::Error,
                    ..m
                })
                .collect(),
        )
    }

    /// Messages of one severity, in order.
    fn with_severity(&self, severity: Severity) -> Vec<&ValidationMessage> {
        self.messages
            .iter()
            .filter(|m| m.severity == severity)
            .collect()
    }
}

/// Evaluates catalog rules against parameter values.
#[derive(Clone, Copy, Debug, Default)]
pub struct ValidationEngine;

impl ValidationEngine {
    /// Create an engine.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Evaluate `rules` in order against `scope`.
    ///
    /// # Examples
    /// ```
    /// use paramcad::{Catalog, ParameterSet, ValidationEngine};
    ///
    /// let catalog = Catalog::builtin().expect("embedded catalog is valid");
    /// let plate = catalog.piece("base_plate").expect("base plate is listed");
    /// let mut params = ParameterSet::defaults(plate).expect("defaults coerce");
    /// params.set_str(plate, "espesor", "2").expect("2 mm is in range");
    ///
    /// let result = ValidationEngine::new().validate(&params, &plate.validation_rules);
    /// assert!(!result.is_valid());
    /// assert_eq!(result.errors()[0].rule_id, "VR-BP-01");
    /// ```
    #[must_use]
    pub fn validate<S: Scope + ?Sized>(&self, scope: &S, rules: &[ValidationRule]) -> ValidationResult {
        let mut messages = Vec::new();
        for rule in rules {
            match rule.compile().and_then(|expr| expr.evaluate(scope)) {
                Ok(value) if value.is_truthy() => {
                    debug!(rule_id = %rule.rule_id, "rule holds");
                }
                Ok(value) => {
                    debug!(rule_id = %rule.rule_id, %value, severity = %rule.severity, "rule violated");
                    messages.push(ValidationMessage::new(
                        rule.rule_id.clone(),
                        rule.severity,
                        rule.message.clone(),
                    ));
                }
                Err(err) => {
                    warn!(rule_id = %rule.rule_id, error = %err, "rule evaluation failed");
                    messages.push(ValidationMessage::new(
                        rule.rule_id.clone(),
                        Severity::Error,
                        format!("[rule evaluation failed: {err}] {}", rule.message),
                    ));
                }
            }
        }
        ValidationResult::from_messages(messages)
    }

    /// Validate a piece: its catalog rules, then its layout checks when the
    /// piece has a plate layout.
    #[must_use]
    pub fn check_piece(&self, piece: &PieceSpec, params: &ParameterSet) -> ValidationResult {
        let mut result = self.validate(params, &piece.validation_rules);
        if layout::has_plate_layout(piece) {
            match PlateLayout::from_parameters(params) {
                Ok(plate) => result.extend(plate.check()),
                Err(err) => result.extend([ValidationMessage::new(
                    layout::LAYOUT_UNAVAILABLE,
                    Severity::Error,
                    format!("Plate layout could not be computed: {err}"),
                )]),
            }
        }
        info!(
            piece = %piece.code,
            valid = result.is_valid(),
            errors = result.errors().len(),
            warnings = result.warnings().len(),
            "validated parameters"
        );
        result
    }
}
