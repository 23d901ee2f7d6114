//! Typed structs for the rulebook JSON document.
//!
//! The document is a single object. Entities are the keys whose value is
//! an object carrying a `schema` array; rows live next to it under
//! `data`. Rows stay as JSON objects: typing them against the schema is
//! the evaluator's job.

use rulebook_core::EntitySchema;
use serde::Deserialize;

/// One entry of an entity's `schema` array, as written in the document.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(default = "default_datatype")]
    pub datatype: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub formula: Option<String>,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default, alias = "Description")]
    pub description: Option<String>,
}

fn default_datatype() -> String {
    "string".to_string()
}

fn default_kind() -> String {
    "raw".to_string()
}

fn default_nullable() -> bool {
    true
}

pub type Row = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone)]
pub struct RulebookEntity {
    pub schema: EntitySchema,
    pub description: Option<String>,
    /// First field declared non-nullable, used as the record identifier.
    pub id_field: Option<String>,
    pub data: Vec<Row>,
}

impl RulebookEntity {
    pub fn name(&self) -> &str {
        &self.schema.name
    }
}

/// A parsed rulebook. `source` is the document as read, kept for content
/// hashing.
#[derive(Debug, Clone)]
pub struct Rulebook {
    pub name: Option<String>,
    /// Sorted by entity name.
    pub entities: Vec<RulebookEntity>,
    pub source: serde_json::Value,
}

impl Rulebook {
    pub fn entity(&self, name: &str) -> Option<&RulebookEntity> {
        self.entities.iter().find(|e| e.name() == name)
    }

    pub fn schemas(&self) -> Vec<EntitySchema> {
        self.entities.iter().map(|e| e.schema.clone()).collect()
    }
}
