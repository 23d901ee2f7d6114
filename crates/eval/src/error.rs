use rulebook_core::{Arity, FormulaError};
use serde::Serialize;

/// Evaluation failure of a single formula.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvalError {
    /// An operand of the wrong kind, e.g. `'a' + 1` or `1 < 'a'`.
    #[error("type mismatch in {operation}: expected {expected}, got {got}")]
    TypeMismatch {
        operation: String,
        expected: String,
        got: String,
    },

    /// Integer arithmetic left the i64 range.
    #[error("integer overflow in {operation}")]
    Overflow { operation: String },

    #[error("unknown function {name}")]
    UnknownFunction { name: String },

    #[error("{function} expects {expected} argument(s), got {got}")]
    ArityMismatch {
        function: String,
        expected: Arity,
        got: usize,
    },

    /// An input value does not fit the field's declared datatype.
    #[error("invalid input for field '{field}': expected {expected}, got {got}")]
    InvalidInput {
        field: String,
        expected: String,
        got: String,
    },
}

impl EvalError {
    pub(crate) fn type_mismatch(
        operation: impl Into<String>,
        expected: impl Into<String>,
        got: impl Into<String>,
    ) -> Self {
        EvalError::TypeMismatch {
            operation: operation.into(),
            expected: expected.into(),
            got: got.into(),
        }
    }

    pub(crate) fn overflow(operation: impl Into<String>) -> Self {
        EvalError::Overflow {
            operation: operation.into(),
        }
    }
}

/// Why a calculated field has no value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum FieldFailure {
    #[error("{0}")]
    Formula(FormulaError),
    #[error("{0}")]
    Eval(EvalError),
}
