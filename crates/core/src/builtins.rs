//! The function catalogue shared by every backend.

use crate::error::Arity;
use crate::parser::keyword_arity;

/// Names callable as `NAME(...)`, in the order they are documented.
pub const FUNCTION_NAMES: &[&str] = &[
    "IF",
    "AND",
    "OR",
    "NOT",
    "TRUE",
    "FALSE",
    "BLANK",
    "CONCATENATE",
    "LEN",
    "LOWER",
    "UPPER",
    "TRIM",
    "FIND",
];

/// Arity of a known function, `None` for names no backend supports.
/// `name` must already be upper-cased, as the lexer produces it.
pub fn function_arity(name: &str) -> Option<Arity> {
    keyword_arity(name).or(match name {
        "BLANK" => Some(Arity::Exactly(0)),
        "CONCATENATE" => Some(Arity::AtLeast(1)),
        "LEN" | "LOWER" | "UPPER" | "TRIM" => Some(Arity::Exactly(1)),
        "FIND" => Some(Arity::Exactly(2)),
        _ => None,
    })
}
