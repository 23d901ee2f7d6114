//! Whole-record evaluation of an entity's calculated fields.

use std::collections::BTreeMap;

use rulebook_core::{CompiledEntity, DataType};
use serde::Serialize;

use crate::error::FieldFailure;
use crate::evaluator::evaluate;
use crate::value::{Record, Value};

/// The record after all levels ran, plus the fields that failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityEvaluation {
    pub values: Record,
    pub errors: BTreeMap<String, FieldFailure>,
}

impl EntityEvaluation {
    pub fn value(&self, field: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.values.get(field).unwrap_or(&NULL)
    }
}

/// Evaluate every calculated field of `compiled`, level by level.
///
/// Each field sees the input record extended with the values computed
/// before it. A failing field becomes `Null` and its error is recorded;
/// siblings keep going. Empty-string results of `String` fields are
/// normalized to `Null` once all levels are done.
pub fn evaluate_entity(compiled: &CompiledEntity, record: &Record) -> EntityEvaluation {
    let mut values = record.clone();
    let mut errors = BTreeMap::new();

    for level in compiled.level_fields() {
        for field in level {
            let result = match &field.ast {
                Ok(ast) => evaluate(ast, &values).map_err(FieldFailure::Eval),
                Err(e) => Err(FieldFailure::Formula(e.clone())),
            };
            let value = match result {
                Ok(v) => v,
                Err(failure) => {
                    tracing::debug!(
                        entity = %compiled.name(),
                        field = %field.name(),
                        error = %failure,
                        "calculated field failed"
                    );
                    errors.insert(field.name().to_string(), failure);
                    Value::Null
                }
            };
            values.insert(field.name().to_string(), value);
        }
    }

    for field in compiled.fields.values() {
        if field.field.datatype == DataType::String {
            if let Some(v) = values.get_mut(field.name()) {
                if *v == Value::String(String::new()) {
                    *v = Value::Null;
                }
            }
        }
    }

    EntityEvaluation { values, errors }
}
