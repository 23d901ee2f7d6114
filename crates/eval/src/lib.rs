//! Reference evaluator for rulebook formulas.
//!
//! Gives every formula its canonical value for a concrete record. Other
//! backends (generated code, explanation traces) are checked against it.
//!
//! - [`evaluate()`] -- one AST against one record
//! - [`evaluate_entity()`] -- all calculated fields of a record, level by level
//! - [`record_from_json()`] -- typed record assembly from a JSON row

pub mod assemble;
pub mod entity;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod numeric;
pub mod value;

pub use assemble::{record_from_json, record_from_json_value};
pub use entity::{evaluate_entity, EntityEvaluation};
pub use error::{EvalError, FieldFailure};
pub use evaluator::{apply_binary, evaluate};
pub use functions::call_builtin;
pub use value::{Record, Value};
