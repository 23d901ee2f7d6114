//! Record assembly from JSON rows with datatype checking.
//!
//! For each raw field of the entity:
//! - JSON `null` or an absent key becomes `Null`
//! - booleans also accept the strings `"true"` / `"false"` (any case)
//! - integers accept integral JSON numbers and numeric strings
//! - strings accept JSON strings only
//!
//! Calculated fields present in the row are ignored; they are recomputed
//! from the raw fields. Keys the schema does not declare are ignored too.

use rulebook_core::{DataType, EntitySchema};

use crate::error::EvalError;
use crate::value::{Record, Value};

/// Assemble a [`Record`] from one JSON row object.
pub fn record_from_json(
    schema: &EntitySchema,
    row: &serde_json::Map<String, serde_json::Value>,
) -> Result<Record, EvalError> {
    let mut record = Record::new();
    for field in schema.raw_fields() {
        let value = match row.get(&field.name) {
            None | Some(serde_json::Value::Null) => Value::Null,
            Some(v) => parse_typed(&field.name, v, field.datatype)?,
        };
        record.insert(field.name.clone(), value);
    }
    Ok(record)
}

/// Same as [`record_from_json`] for an arbitrary JSON value, which must be
/// an object.
pub fn record_from_json_value(
    schema: &EntitySchema,
    row: &serde_json::Value,
) -> Result<Record, EvalError> {
    let obj = row.as_object().ok_or_else(|| EvalError::InvalidInput {
        field: String::new(),
        expected: "a JSON object".to_string(),
        got: json_type_name(row).to_string(),
    })?;
    record_from_json(schema, obj)
}

fn parse_typed(field: &str, v: &serde_json::Value, datatype: DataType) -> Result<Value, EvalError> {
    let parsed = match (datatype, v) {
        (DataType::Boolean, serde_json::Value::Bool(b)) => Some(Value::Bool(*b)),
        (DataType::Boolean, serde_json::Value::String(s)) => {
            match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            }
        }
        (DataType::Integer, serde_json::Value::Number(n)) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                    .map(|f| f as i64)
            })
            .map(Value::Int),
        (DataType::Integer, serde_json::Value::String(s)) => {
            s.trim().parse::<i64>().ok().map(Value::Int)
        }
        (DataType::String, serde_json::Value::String(s)) => Some(Value::String(s.clone())),
        _ => None,
    };
    parsed.ok_or_else(|| EvalError::InvalidInput {
        field: field.to_string(),
        expected: datatype.to_string(),
        got: v.to_string(),
    })
}

/// JSON type name for error messages.
fn json_type_name(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
