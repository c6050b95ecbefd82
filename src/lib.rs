#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_doc_code_examples)]
#![warn(clippy::missing_docs_in_private_items)]
#![doc = include_str!("../README.md")]

pub mod catalog;
pub mod config;
pub mod errors;
pub mod expr;
pub mod geometry;
pub mod layout;
pub mod logging;
pub mod params;
pub mod report;
pub mod validation;

pub use catalog::{
    BomTemplateItem, Catalog, CatalogFinding, ParameterKind, ParameterOption, ParameterSpec,
    PieceSpec, ValidationRule,
};
pub use errors::{CatalogError, ExprError, LayoutError, ParameterError};
pub use expr::{Expr, Scope, Value};
pub use geometry::{point, Circle, Point, Rect};
pub use layout::{HolePattern, Material, PlateLayout};
pub use params::ParameterSet;
pub use validation::{Severity, ValidationEngine, ValidationMessage, ValidationResult};
