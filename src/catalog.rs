//! Typed access to the JSON piece catalog.
//!
//! A catalog lists the parametric pieces the tool knows about. Each piece
//! declares its parameters (with types, bounds and defaults), the
//! manufacturability rules that apply to it and a template for its bill of
//! materials. Structural problems are rejected when the catalog is loaded;
//! problems confined to rule expressions are reported by [`Catalog::audit`].

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::Path;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{CatalogError, ExprError, ParameterError};
use crate::expr::{self, Expr};
use crate::params::ParameterSet;
use crate::validation::Severity;

/// Catalog shipped with the crate, used when no catalog path is configured.
const BUILTIN_CATALOG: &str = include_str!("../catalog/piece_catalog.json");

/// Catalog version assumed when the file has none.
fn default_version() -> String {
    "1.0".to_owned()
}

/// First position on a drawing.
fn default_item_number() -> u32 {
    1
}

/// One unit per piece.
fn default_quantity() -> f64 {
    1.0
}

/// Each.
fn default_unit() -> String {
    "UN".to_owned()
}

/// A collection of parametric pieces.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Catalog {
    /// Version string of the catalog file.
    #[serde(default = "default_version")]
    pub catalog_version: String,
    /// Pieces in file order.
    #[serde(default)]
    pub pieces: Vec<PieceSpec>,
}

/// Definition of one parametric piece.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PieceSpec {
    /// Unique piece code, e.g. `base_plate`.
    pub code: String,
    /// Human readable name.
    pub display_name: String,
    /// Engineering discipline the piece belongs to.
    pub discipline: String,
    /// Category within the discipline.
    pub category: String,
    /// Free text description.
    #[serde(default)]
    pub description: String,
    /// Parameters in presentation order.
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
    /// Manufacturability rules in evaluation order.
    #[serde(default)]
    pub validation_rules: Vec<ValidationRule>,
    /// Bill of materials template.
    #[serde(default)]
    pub bom_template: Vec<BomTemplateItem>,
    /// Name of the CAD generation script for the piece.
    #[serde(default)]
    pub cad_script: String,
    /// Drawing views the piece is documented with.
    #[serde(default)]
    pub drawing_views: Vec<String>,
}

/// Definition of one piece parameter.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ParameterSpec {
    /// Parameter name as used in rule expressions.
    pub name: String,
    /// Label shown to the user.
    pub display_name: String,
    /// Unit of measure; empty for unitless parameters.
    #[serde(default)]
    pub unit: String,
    /// Value type and its constraints.
    #[serde(flatten)]
    pub kind: ParameterKind,
    /// Default value as written in the catalog.
    pub default: serde_json::Value,
    /// Help text.
    #[serde(default)]
    pub description: String,
    /// Path of a schematic picture explaining the parameter.
    #[serde(default)]
    pub schematic_image: Option<String>,
    /// Parameters that must hold the given values for this one to be shown.
    #[serde(default)]
    pub depends_on: BTreeMap<String, serde_json::Value>,
}

/// Type of a parameter, selected by the `type` key.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ParameterKind {
    /// A real number with optional bounds.
    Float {
        /// Inclusive lower bound.
        #[serde(default)]
        min: Option<f64>,
        /// Inclusive upper bound.
        #[serde(default)]
        max: Option<f64>,
        /// Suggested increment for interactive input.
        #[serde(default)]
        step: Option<f64>,
    },
    /// One value out of a fixed list.
    Enum {
        /// Allowed values.
        options: Vec<ParameterOption>,
    },
    /// A yes/no switch.
    Bool,
}

impl ParameterKind {
    /// Short name of the kind as written in the catalog.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Float { .. } => "float",
            Self::Enum { .. } => "enum",
            Self::Bool => "bool",
        }
    }
}

/// One allowed value of an enum parameter.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ParameterOption {
    /// Value stored in the parameter set and compared in rules.
    pub value: String,
    /// Label shown to the user.
    pub label: String,
}

/// A manufacturability rule attached to a piece.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ValidationRule {
    /// Identifier reported with the rule's message.
    pub rule_id: String,
    /// Short description of what the rule checks.
    #[serde(default)]
    pub description: String,
    /// Condition that must be truthy for the parameters to pass.
    pub expression: String,
    /// Severity reported when the condition does not hold.
    #[serde(default)]
    pub severity: Severity,
    /// Message reported when the condition does not hold.
    pub message: String,
}

impl ValidationRule {
    /// Parse the rule expression.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError`] when the expression is malformed.
    pub fn compile(&self) -> Result<Expr, ExprError> {
        expr::parse(&self.expression)
    }
}

/// One line of a piece's bill of materials template.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BomTemplateItem {
    /// Position number on the drawing.
    #[serde(default = "default_item_number")]
    pub item_number: u32,
    /// Part code.
    #[serde(default)]
    pub part_code: String,
    /// Description of the item.
    #[serde(default)]
    pub description: String,
    /// Quantity per piece.
    #[serde(default = "default_quantity")]
    pub quantity: f64,
    /// Unit of the quantity.
    #[serde(default = "default_unit")]
    pub unit: String,
    /// Parameter holding the item's material, if any.
    #[serde(default)]
    pub material_param: Option<String>,
    /// Standard the item follows.
    #[serde(default)]
    pub standard: String,
    /// Free text notes.
    #[serde(default)]
    pub observations: String,
}

/// A non-fatal problem found by [`Catalog::audit`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CatalogFinding {
    /// Piece the finding belongs to.
    pub piece: String,
    /// Rule the finding belongs to.
    pub rule_id: String,
    /// What is wrong.
    pub problem: String,
}

impl Catalog {
    /// Parse and check a catalog from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Json`] when the text does not match the catalog
    /// schema, or another [`CatalogError`] variant when a structural invariant
    /// is broken.
    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(text)?;
        catalog.check()?;
        Ok(catalog)
    }

    /// Read and check a catalog file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Read`] when the file cannot be read, otherwise
    /// the same errors as [`Catalog::from_json`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json(&text)?;
        info!(
            path = %path.display(),
            version = %catalog.catalog_version,
            pieces = catalog.pieces.len(),
            "loaded piece catalog"
        );
        Ok(catalog)
    }

    /// The catalog embedded in the crate.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] only if the embedded file is broken.
    ///
    /// # Examples
    /// ```
    /// use paramcad::Catalog;
    ///
    /// let catalog = Catalog::builtin().expect("embedded catalog is valid");
    /// assert!(catalog.piece("base_plate").is_some());
    /// ```
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// All pieces in file order.
    #[must_use]
    pub fn pieces(&self) -> &[PieceSpec] {
        &self.pieces
    }

    /// Look up a piece by code.
    #[must_use]
    pub fn piece(&self, code: &str) -> Option<&PieceSpec> {
        self.pieces.iter().find(|piece| piece.code == code)
    }

    /// Look up a piece by code, failing when it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownPiece`] when no piece has this code.
    pub fn require_piece(&self, code: &str) -> Result<&PieceSpec, CatalogError> {
        self.piece(code)
            .ok_or_else(|| CatalogError::UnknownPiece(code.to_owned()))
    }

    /// Parameters of a piece; empty when the piece is unknown.
    #[must_use]
    pub fn parameters(&self, code: &str) -> &[ParameterSpec] {
        self.piece(code)
            .map(|piece| piece.parameters.as_slice())
            .unwrap_or_default()
    }

    /// Validation rules of a piece; empty when the piece is unknown.
    #[must_use]
    pub fn validation_rules(&self, code: &str) -> &[ValidationRule] {
        self.piece(code)
            .map(|piece| piece.validation_rules.as_slice())
            .unwrap_or_default()
    }

    /// Distinct disciplines, sorted.
    #[must_use]
    pub fn disciplines(&self) -> Vec<&str> {
        self.pieces
            .iter()
            .map(|piece| piece.discipline.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Pieces of one discipline, in file order.
    #[must_use]
    pub fn pieces_by_discipline(&self, discipline: &str) -> Vec<&PieceSpec> {
        self.pieces
            .iter()
            .filter(|piece| piece.discipline == discipline)
            .collect()
    }

    /// Pieces of one category within a discipline, in file order.
    #[must_use]
    pub fn pieces_by_category(&self, discipline: &str, category: &str) -> Vec<&PieceSpec> {
        self.pieces
            .iter()
            .filter(|piece| piece.discipline == discipline && piece.category == category)
            .collect()
    }

    /// Report rules that cannot parse or that reference names the piece does
    /// not declare.
    ///
    /// Such rules still load; the validation engine reports them as errors
    /// whenever they are evaluated.
    #[must_use]
    pub fn audit(&self) -> Vec<CatalogFinding> {
        let mut findings = Vec::new();
        for piece in &self.pieces {
            let declared: HashSet<&str> =
                piece.parameters.iter().map(|p| p.name.as_str()).collect();
            for rule in &piece.validation_rules {
                let finding = |problem: String| CatalogFinding {
                    piece: piece.code.clone(),
                    rule_id: rule.rule_id.clone(),
                    problem,
                };
                match rule.compile() {
                    Err(err) => findings.push(finding(format!("expression does not parse: {err}"))),
                    Ok(compiled) => {
                        for name in compiled.names() {
                            if !declared.contains(name.as_str()) {
                                findings.push(finding(format!(
                                    "expression references unknown parameter '{name}'"
                                )));
                            }
                        }
                        for call in called_functions(&compiled) {
                            if !expr::BUILTIN_FUNCTIONS.contains(&call.as_str()) {
                                findings.push(finding(format!(
                                    "expression calls unknown function '{call}'"
                                )));
                            }
                        }
                    }
                }
            }
        }
        debug!(findings = findings.len(), "audited catalog");
        findings
    }

    /// Load-time invariants across pieces.
    fn check(&self) -> Result<(), CatalogError> {
        let mut codes = HashSet::new();
        for piece in &self.pieces {
            if !codes.insert(piece.code.as_str()) {
                return Err(CatalogError::DuplicatePiece(piece.code.clone()));
            }
            piece.check()?;
        }
        Ok(())
    }
}

/// Names of every function called anywhere in `expr`.
fn called_functions(expr: &Expr) -> BTreeSet<String> {
    /// Depth-first collection of call names.
    fn walk(expr: &Expr, out: &mut BTreeSet<String>) {
        match expr {
            Expr::Literal(_) | Expr::Name(_) => {}
            Expr::Unary { operand, .. } => walk(operand, out),
            Expr::Binary { left, right, .. } | Expr::Logic { left, right, .. } => {
                walk(left, out);
                walk(right, out);
            }
            Expr::Compare { first, rest } => {
                walk(first, out);
                rest.iter().for_each(|(_, operand)| walk(operand, out));
            }
            Expr::Conditional {
                condition,
                then,
                otherwise,
            } => {
                walk(condition, out);
                walk(then, out);
                walk(otherwise, out);
            }
            Expr::Call { function, args } => {
                out.insert(function.clone());
                args.iter().for_each(|arg| walk(arg, out));
            }
            Expr::Tuple(items) => items.iter().for_each(|item| walk(item, out)),
        }
    }
    let mut out = BTreeSet::new();
    walk(expr, &mut out);
    out
}

impl PieceSpec {
    /// Look up a parameter by name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|parameter| parameter.name == name)
    }

    /// The piece's default parameter set.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError`] when a default does not coerce. Catalogs
    /// built through [`Catalog::from_json`] never fail here.
    pub fn defaults(&self) -> Result<ParameterSet, ParameterError> {
        ParameterSet::defaults(self)
    }

    /// Parameters ordered so that every `depends_on` controller precedes the
    /// parameters it controls.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownDependency`] when a controller is not a
    /// parameter of this piece and [`CatalogError::DependencyCycle`] when the
    /// relations are circular.
    pub fn dependency_order(&self) -> Result<Vec<&ParameterSpec>, CatalogError> {
        let mut graph: DiGraph<usize, ()> = DiGraph::new();
        let nodes: Vec<NodeIndex> = (0..self.parameters.len())
            .map(|idx| graph.add_node(idx))
            .collect();
        let by_name: HashMap<&str, NodeIndex> = self
            .parameters
            .iter()
            .zip(&nodes)
            .map(|(parameter, node)| (parameter.name.as_str(), *node))
            .collect();

        for (parameter, node) in self.parameters.iter().zip(&nodes) {
            for dependency in parameter.depends_on.keys() {
                let controller = by_name.get(dependency.as_str()).ok_or_else(|| {
                    CatalogError::UnknownDependency {
                        piece: self.code.clone(),
                        parameter: parameter.name.clone(),
                        dependency: dependency.clone(),
                    }
                })?;
                graph.add_edge(*controller, *node, ());
            }
        }

        let order = toposort(&graph, None).map_err(|cycle| CatalogError::DependencyCycle {
            piece: self.code.clone(),
            parameter: self.parameters[graph[cycle.node_id()]].name.clone(),
        })?;
        Ok(order
            .into_iter()
            .map(|node| &self.parameters[graph[node]])
            .collect())
    }

    /// Load-time invariants of one piece: unique names and ids, valid kinds and
    /// defaults, acyclic dependencies.
    fn check(&self) -> Result<(), CatalogError> {
        let mut names = HashSet::new();
        for parameter in &self.parameters {
            if !names.insert(parameter.name.as_str()) {
                return Err(CatalogError::DuplicateParameter {
                    piece: self.code.clone(),
                    parameter: parameter.name.clone(),
                });
            }
            self.check_kind(parameter)?;
            parameter
                .coerce(&parameter.default)
                .map_err(|source| CatalogError::InvalidDefault {
                    piece: self.code.clone(),
                    parameter: parameter.name.clone(),
                    source,
                })?;
        }

        let mut rule_ids = HashSet::new();
        for rule in &self.validation_rules {
            if !rule_ids.insert(rule.rule_id.as_str()) {
                return Err(CatalogError::DuplicateRule {
                    piece: self.code.clone(),
                    rule_id: rule.rule_id.clone(),
                });
            }
        }

        self.dependency_order().map(|_| ())
    }

    /// Bounds and option list of one parameter.
    fn check_kind(&self, parameter: &ParameterSpec) -> Result<(), CatalogError> {
        match &parameter.kind {
            ParameterKind::Float {
                min: Some(min),
                max: Some(max),
                ..
            } if min > max => Err(CatalogError::InvertedRange {
                piece: self.code.clone(),
                parameter: parameter.name.clone(),
                min: *min,
                max: *max,
            }),
            ParameterKind::Enum { options } => {
                let invalid = |reason: String| CatalogError::InvalidOptions {
                    piece: self.code.clone(),
                    parameter: parameter.name.clone(),
                    reason,
                };
                if options.is_empty() {
                    return Err(invalid("no options declared".to_owned()));
                }
                let mut seen = HashSet::new();
                for option in options {
                    if !seen.insert(option.value.as_str()) {
                        return Err(invalid(format!("option '{}' repeated", option.value)));
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
