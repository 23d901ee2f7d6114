use rulebook_core::Arity;
use serde::Serialize;

/// Error type for code generation of a single field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CodeGenError {
    /// Two distinct field names map to the same Python identifier.
    #[error("fields '{first}' and '{second}' both map to identifier '{identifier}'")]
    NameCollision {
        first: String,
        second: String,
        identifier: String,
    },

    /// The formula calls a function the Python runtime does not provide.
    #[error("unsupported function {name}")]
    UnsupportedFunction { name: String },

    #[error("{function} expects {expected} argument(s), got {got}")]
    ArityMismatch {
        function: String,
        expected: Arity,
        got: usize,
    },

    /// The formula reads a field missing from the parameter list.
    #[error("field '{field}' is not among the function parameters")]
    UnboundField { field: String },
}
