//! Error types produced while loading catalogs, coercing parameters and
//! evaluating rule expressions.

use thiserror::Error;

/// Error returned when a rule expression cannot be parsed or evaluated.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ExprError {
    /// Returned when the lexer meets a character that starts no token.
    #[error("unexpected character {found:?} at offset {offset}")]
    UnexpectedChar {
        /// The offending character.
        found: char,
        /// Byte offset into the expression source.
        offset: usize,
    },
    /// Returned when a string literal is missing its closing quote.
    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString {
        /// Byte offset of the opening quote.
        offset: usize,
    },
    /// Returned when a numeric literal cannot be read as a float.
    #[error("invalid number literal {literal:?} at offset {offset}")]
    InvalidNumber {
        /// The literal as written.
        literal: String,
        /// Byte offset of the literal.
        offset: usize,
    },
    /// Returned when the parser meets a token it cannot place.
    #[error("unexpected {found} at offset {offset}")]
    UnexpectedToken {
        /// Description of the token that was found.
        found: String,
        /// Byte offset of the token.
        offset: usize,
    },
    /// Returned when the expression ends before it is complete.
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    /// Returned when a name is neither a parameter nor a builtin.
    #[error("name '{0}' is not defined")]
    UndefinedName(String),
    /// Returned when an operator or builtin receives operands it cannot handle.
    #[error("{0}")]
    Type(String),
    /// Returned when a builtin is called with the wrong number of arguments.
    #[error("{function}() takes {expected} but {received} were given")]
    Arity {
        /// Name of the builtin.
        function: String,
        /// Human readable description of the accepted argument count.
        expected: &'static str,
        /// Number of arguments that were supplied.
        received: usize,
    },
    /// Returned on division or modulo by zero.
    #[error("division by zero")]
    DivisionByZero,
    /// Returned when a math function is evaluated outside of its domain.
    #[error("math domain error in {0}")]
    MathDomain(String),
    /// Returned when `max()` or `min()` receives an empty sequence.
    #[error("{0}() arg is an empty sequence")]
    EmptySequence(String),
}

/// Error returned when a piece catalog is malformed.
///
/// Structural problems (duplicate codes, dependency cycles, defaults that do not
/// match their own parameter type) make a catalog unusable, so they are reported
/// at load time. Problems confined to a single rule expression are left to
/// [`Catalog::audit`](crate::Catalog::audit) and to the validation engine.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Returned when the catalog file cannot be read.
    #[error("failed to read catalog at {path}: {source}")]
    Read {
        /// Path that was read.
        path: std::path::PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// Returned when the catalog JSON does not match the expected schema.
    #[error("invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Returned when two pieces share a code.
    #[error("duplicate piece code '{0}'")]
    DuplicatePiece(String),
    /// Returned when two parameters of a piece share a name.
    #[error("piece '{piece}' declares parameter '{parameter}' twice")]
    DuplicateParameter {
        /// Piece code.
        piece: String,
        /// Repeated parameter name.
        parameter: String,
    },
    /// Returned when two rules of a piece share an id.
    #[error("piece '{piece}' declares rule '{rule_id}' twice")]
    DuplicateRule {
        /// Piece code.
        piece: String,
        /// Repeated rule id.
        rule_id: String,
    },
    /// Returned when a float parameter has `min > max`.
    #[error("parameter '{parameter}' of piece '{piece}' has min {min} greater than max {max}")]
    InvertedRange {
        /// Piece code.
        piece: String,
        /// Parameter name.
        parameter: String,
        /// Declared lower bound.
        min: f64,
        /// Declared upper bound.
        max: f64,
    },
    /// Returned when an enum parameter has no options or repeats one.
    #[error("enum parameter '{parameter}' of piece '{piece}' has invalid options: {reason}")]
    InvalidOptions {
        /// Piece code.
        piece: String,
        /// Parameter name.
        parameter: String,
        /// What is wrong with the option list.
        reason: String,
    },
    /// Returned when a parameter default does not coerce against its own kind.
    #[error("default of parameter '{parameter}' in piece '{piece}' is invalid: {source}")]
    InvalidDefault {
        /// Piece code.
        piece: String,
        /// Parameter name.
        parameter: String,
        /// Coercion failure.
        #[source]
        source: ParameterError,
    },
    /// Returned when `depends_on` names a parameter the piece does not have.
    #[error("parameter '{parameter}' of piece '{piece}' depends on unknown parameter '{dependency}'")]
    UnknownDependency {
        /// Piece code.
        piece: String,
        /// Dependent parameter.
        parameter: String,
        /// Missing controller parameter.
        dependency: String,
    },
    /// Returned when `depends_on` relations form a cycle.
    #[error("parameters of piece '{piece}' have a depends_on cycle through '{parameter}'")]
    DependencyCycle {
        /// Piece code.
        piece: String,
        /// A parameter on the cycle.
        parameter: String,
    },
    /// Returned when a piece code is not present in the catalog.
    #[error("unknown piece '{0}'")]
    UnknownPiece(String),
}

/// Error returned when a raw parameter value cannot be accepted for a piece.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ParameterError {
    /// Returned when the piece declares no parameter with this name.
    #[error("unknown parameter '{0}'")]
    Unknown(String),
    /// Returned when the value has the wrong JSON type or does not parse.
    #[error("parameter '{parameter}' expects {expected}, received {received}")]
    WrongType {
        /// Parameter name.
        parameter: String,
        /// The kind of value that was expected.
        expected: &'static str,
        /// The rejected value as written.
        received: String,
    },
    /// Returned when a float lies outside its declared bounds.
    #[error("parameter '{parameter}' must lie within [{min}, {max}] (received {value})")]
    OutOfRange {
        /// Parameter name.
        parameter: String,
        /// The rejected value.
        value: f64,
        /// Lower bound, `-inf` when open.
        min: f64,
        /// Upper bound, `inf` when open.
        max: f64,
    },
    /// Returned when an enum value is not one of the declared options.
    #[error("parameter '{parameter}' has no option '{value}' (expected one of: {options})")]
    UnknownOption {
        /// Parameter name.
        parameter: String,
        /// The rejected value.
        value: String,
        /// Comma separated list of valid option values.
        options: String,
    },
    /// Returned when a `name=value` assignment is missing its `=`.
    #[error("expected name=value, received '{0}'")]
    MalformedAssignment(String),
}

/// Error returned when a base plate layout cannot be computed.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum LayoutError {
    /// Returned when the parameter set lacks a value the layout needs.
    #[error("layout requires parameter '{0}'")]
    MissingParameter(String),
    /// Returned when a parameter has a value of the wrong type.
    #[error("layout parameter '{parameter}' must be {expected}")]
    WrongType {
        /// Parameter name.
        parameter: String,
        /// The expected value type.
        expected: &'static str,
    },
    /// Returned when the plate dimensions are not strictly positive.
    #[error("plate dimension '{parameter}' must be positive (received {value})")]
    NonPositiveDimension {
        /// Parameter name.
        parameter: String,
        /// Rejected value in millimetres.
        value: f64,
    },
    /// Returned when the piece has no layout model.
    #[error("piece '{0}' has no plate layout")]
    Unsupported(String),
}
