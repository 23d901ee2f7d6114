//! Field and entity schema model.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Boolean,
    Integer,
    String,
}

impl DataType {
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Boolean => "boolean",
            DataType::Integer => "integer",
            DataType::String => "string",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Raw,
    Calculated,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Raw => "raw",
            FieldKind::Calculated => "calculated",
        }
    }
}

/// One column of an entity. Raw fields never carry a formula and
/// calculated fields always do; [`EntitySchema::new`] rejects anything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub datatype: DataType,
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Field {
    pub fn raw(name: impl Into<String>, datatype: DataType) -> Self {
        Field {
            name: name.into(),
            datatype,
            kind: FieldKind::Raw,
            formula: None,
            nullable: true,
            description: None,
        }
    }

    pub fn calculated(
        name: impl Into<String>,
        datatype: DataType,
        formula: impl Into<String>,
    ) -> Self {
        Field {
            name: name.into(),
            datatype,
            kind: FieldKind::Calculated,
            formula: Some(formula.into()),
            nullable: true,
            description: None,
        }
    }

    pub fn is_calculated(&self) -> bool {
        self.kind == FieldKind::Calculated
    }
}

/// The ordered field list of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitySchema {
    pub name: String,
    fields: Vec<Field>,
}

impl EntitySchema {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Result<Self, SchemaError> {
        let name = name.into();
        let mut seen = BTreeSet::new();
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    entity: name,
                    field: field.name.clone(),
                });
            }
            match (field.kind, field.formula.as_deref()) {
                (FieldKind::Raw, Some(_)) => {
                    return Err(SchemaError::UnexpectedFormula {
                        entity: name,
                        field: field.name.clone(),
                    })
                }
                (FieldKind::Calculated, None) => {
                    return Err(SchemaError::MissingFormula {
                        entity: name,
                        field: field.name.clone(),
                    })
                }
                _ => {}
            }
        }
        Ok(EntitySchema { name, fields })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn raw_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| !f.is_calculated())
    }

    pub fn calculated_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_calculated())
    }

    pub fn raw_field_names(&self) -> BTreeSet<String> {
        self.raw_fields().map(|f| f.name.clone()).collect()
    }
}
