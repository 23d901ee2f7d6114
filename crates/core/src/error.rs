//! Error types for the formula front end and schema construction.
//!
//! Positions are byte offsets into the formula text as written (before
//! the optional leading `=` is skipped).

use std::fmt;

use serde::Serialize;

/// A malformed token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LexError {
    #[error("unterminated string literal starting at {position}")]
    UnterminatedString { position: usize },

    #[error("unterminated field reference starting at {position}")]
    UnterminatedFieldRef { position: usize },

    #[error("empty field reference at {position}")]
    EmptyFieldRef { position: usize },

    #[error("integer literal out of range at {position}")]
    IntegerOutOfRange { position: usize },

    #[error("unexpected character '{character}' at {position}")]
    UnexpectedCharacter { character: char, position: usize },
}

/// How many arguments a keyword function accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, got: usize) -> bool {
        match self {
            Arity::Exactly(n) => got == n,
            Arity::AtLeast(n) => got >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "{}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

/// A malformed expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseError {
    #[error("expected {expected}, found {found} at {position}")]
    UnexpectedToken {
        expected: String,
        found: String,
        position: usize,
    },

    #[error("{function} expects {expected} argument(s), got {got}")]
    ArityMismatch {
        function: String,
        expected: Arity,
        got: usize,
    },
}

/// Either stage of turning formula text into an AST.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum FormulaError {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}

/// A schema that violates the field invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("entity '{entity}' declares field '{field}' more than once")]
    DuplicateField { entity: String, field: String },

    #[error("calculated field '{entity}.{field}' has no formula")]
    MissingFormula { entity: String, field: String },

    #[error("raw field '{entity}.{field}' must not carry a formula")]
    UnexpectedFormula { entity: String, field: String },
}
