//! Deserialization from the rulebook JSON document into typed structs.
//!
//! The main entry point is [`from_json`]; [`load_rulebook`] and
//! [`parse_rulebook`] wrap it for files and text.

use std::path::Path;

use rulebook_core::{DataType, EntitySchema, Field, FieldKind, SchemaError};

use crate::types::*;

/// Top-level keys that are document metadata, never entities.
const SKIP_KEYS: &[&str] = &["$schema", "model_name", "Description", "_meta"];

/// Errors while reading a rulebook document.
#[derive(Debug, thiserror::Error)]
pub enum InterchangeError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The document is not a JSON object.
    #[error("invalid rulebook: {0}")]
    InvalidRulebook(String),

    /// A field descriptor is malformed.
    #[error("entity '{entity}': {message}")]
    FieldError { entity: String, message: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Read and parse a rulebook file.
pub fn load_rulebook(path: &Path) -> Result<Rulebook, InterchangeError> {
    let text = std::fs::read_to_string(path).map_err(|source| InterchangeError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_rulebook(&text)
}

/// Parse rulebook JSON text.
pub fn parse_rulebook(text: &str) -> Result<Rulebook, InterchangeError> {
    let doc: serde_json::Value = serde_json::from_str(text)?;
    from_json(doc)
}

/// Build a [`Rulebook`] from a parsed document.
///
/// Every top-level key whose value is an object with a `schema` array is
/// an entity. Other keys are metadata and are skipped.
pub fn from_json(doc: serde_json::Value) -> Result<Rulebook, InterchangeError> {
    let obj = doc.as_object().ok_or_else(|| {
        InterchangeError::InvalidRulebook("top level must be a JSON object".to_string())
    })?;

    let name = ["Name", "name", "model_name"]
        .iter()
        .find_map(|k| obj.get(*k).and_then(|v| v.as_str()))
        .map(str::to_string);

    let mut entities = Vec::new();
    for (key, value) in obj {
        if SKIP_KEYS.contains(&key.as_str()) {
            continue;
        }
        let Some(schema) = value.get("schema").and_then(|s| s.as_array()) else {
            continue;
        };
        entities.push(parse_entity(key, value, schema)?);
    }

    tracing::debug!(entities = entities.len(), "loaded rulebook");
    Ok(Rulebook {
        name,
        entities,
        source: doc,
    })
}

fn parse_entity(
    name: &str,
    value: &serde_json::Value,
    schema: &[serde_json::Value],
) -> Result<RulebookEntity, InterchangeError> {
    let descriptors = schema
        .iter()
        .map(|f| {
            serde_json::from_value::<FieldDescriptor>(f.clone()).map_err(|e| {
                InterchangeError::FieldError {
                    entity: name.to_string(),
                    message: e.to_string(),
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let id_field = descriptors
        .iter()
        .find(|d| !d.nullable)
        .map(|d| d.name.clone());

    let fields = descriptors
        .into_iter()
        .map(|d| to_field(name, d))
        .collect::<Result<Vec<_>, _>>()?;
    let schema = EntitySchema::new(name, fields)?;

    let data = match value.get("data") {
        None | Some(serde_json::Value::Null) => Vec::new(),
        Some(serde_json::Value::Array(rows)) => rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row.as_object()
                    .cloned()
                    .ok_or_else(|| InterchangeError::FieldError {
                        entity: name.to_string(),
                        message: format!("data row {} is not an object", i),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(InterchangeError::FieldError {
                entity: name.to_string(),
                message: "'data' must be an array".to_string(),
            })
        }
    };

    let description = value
        .get("Description")
        .or_else(|| value.get("description"))
        .and_then(|d| d.as_str())
        .map(str::to_string);

    Ok(RulebookEntity {
        schema,
        description,
        id_field,
        data,
    })
}

fn to_field(entity: &str, d: FieldDescriptor) -> Result<Field, InterchangeError> {
    let datatype = match d.datatype.to_ascii_lowercase().as_str() {
        "boolean" | "bool" => DataType::Boolean,
        "integer" | "int" => DataType::Integer,
        "string" | "text" => DataType::String,
        other => {
            tracing::warn!(
                entity,
                field = %d.name,
                datatype = other,
                "unknown datatype, treating as string"
            );
            DataType::String
        }
    };
    let kind = match d.kind.to_ascii_lowercase().as_str() {
        "raw" => FieldKind::Raw,
        "calculated" => FieldKind::Calculated,
        other => {
            return Err(InterchangeError::FieldError {
                entity: entity.to_string(),
                message: format!("field '{}' has unknown type '{}'", d.name, other),
            })
        }
    };
    // an empty formula is the same as none
    let formula = d.formula.filter(|f| !f.trim().is_empty());
    Ok(Field {
        name: d.name,
        datatype,
        kind,
        formula,
        nullable: d.nullable,
        description: d.description,
    })
}
