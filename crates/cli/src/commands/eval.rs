use std::collections::BTreeMap;
use std::path::Path;
use std::process;

use rulebook_core::compile_entity;
use rulebook_eval::{evaluate_entity, record_from_json_value, Value};
use serde::Serialize;

use crate::{load_or_exit, print_json, report_error, OutputFormat};

#[derive(Serialize)]
struct RecordResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Value>,
    /// Calculated field values.
    values: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    errors: BTreeMap<String, String>,
}

fn read_records(path: &Path, output: OutputFormat, quiet: bool) -> Vec<serde_json::Value> {
    let text = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("error: cannot read records file {}: {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(serde_json::Value::Array(rows)) => rows,
        Ok(_) => {
            let msg = format!("error: {} must hold a JSON array of records", path.display());
            report_error(&msg, output, quiet);
            process::exit(1);
        }
        Err(e) => {
            let msg = format!("error: invalid JSON in {}: {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

pub(crate) fn cmd_eval(
    path: &Path,
    entity_name: &str,
    records_path: Option<&Path>,
    output: OutputFormat,
    quiet: bool,
) {
    let rulebook = load_or_exit(path, output, quiet);
    let Some(entity) = rulebook.entity(entity_name) else {
        let msg = format!("error: no entity '{}' in {}", entity_name, path.display());
        report_error(&msg, output, quiet);
        process::exit(1);
    };

    let rows: Vec<serde_json::Value> = match records_path {
        Some(p) => read_records(p, output, quiet),
        None => entity
            .data
            .iter()
            .cloned()
            .map(serde_json::Value::Object)
            .collect(),
    };

    let compiled = compile_entity(&entity.schema);
    let mut results = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let record = match record_from_json_value(&entity.schema, row) {
            Ok(r) => r,
            Err(e) => {
                let msg = format!("error: record {}: {}", i + 1, e);
                report_error(&msg, output, quiet);
                process::exit(1);
            }
        };
        let evaluation = evaluate_entity(&compiled, &record);
        results.push(RecordResult {
            id: entity
                .id_field
                .as_deref()
                .map(|id| record.get(id).cloned().unwrap_or_default()),
            values: compiled
                .fields
                .keys()
                .map(|name| (name.clone(), evaluation.value(name).clone()))
                .collect(),
            errors: evaluation
                .errors
                .iter()
                .map(|(name, e)| (name.clone(), e.to_string()))
                .collect(),
        });
    }

    match output {
        OutputFormat::Json => print_json(&results),
        OutputFormat::Text => {
            for (i, result) in results.iter().enumerate() {
                match &result.id {
                    Some(id) => println!("[{}] {}", i + 1, id),
                    None => println!("[{}]", i + 1),
                }
                for name in compiled.leveling.order() {
                    if let Some(value) = result.values.get(name) {
                        println!("  {} = {}", name, value);
                    }
                }
                if !quiet {
                    for (name, e) in &result.errors {
                        println!("  error: {}: {}", name, e);
                    }
                }
            }
        }
    }
}
