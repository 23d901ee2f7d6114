//! rulebook-interchange: rulebook JSON document deserialization.
//!
//! Turns the rulebook document (one JSON object holding every entity's
//! field schema and sample rows) into validated [`EntitySchema`]s that the
//! compiler crates consume. Rows stay as JSON objects; the evaluator types
//! them against the schema.
//!
//! [`EntitySchema`]: rulebook_core::EntitySchema

pub mod deserialize;
pub mod types;

pub use deserialize::{from_json, load_rulebook, parse_rulebook, InterchangeError};
pub use types::*;
