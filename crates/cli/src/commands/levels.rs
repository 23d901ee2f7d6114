use std::collections::BTreeMap;
use std::path::Path;

use rulebook_core::{compile_entities, CompiledEntity, DependencyCycle, UnknownReference};
use serde::Serialize;

use crate::{load_or_exit, print_json, OutputFormat};

#[derive(Serialize)]
struct EntityLevels<'a> {
    levels: &'a [Vec<String>],
    #[serde(skip_serializing_if = "Option::is_none")]
    cycle: Option<&'a DependencyCycle>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    unknown_references: &'a [UnknownReference],
    /// Fields whose formula did not parse.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    errors: BTreeMap<&'a str, String>,
}

impl<'a> EntityLevels<'a> {
    fn new(entity: &'a CompiledEntity) -> Self {
        EntityLevels {
            levels: &entity.leveling.levels,
            cycle: entity.leveling.cycle.as_ref(),
            unknown_references: &entity.unknown_references,
            errors: entity
                .failed_fields()
                .map(|(name, e)| (name, e.to_string()))
                .collect(),
        }
    }
}

pub(crate) fn cmd_levels(path: &Path, output: OutputFormat, quiet: bool) {
    let rulebook = load_or_exit(path, output, quiet);
    let compiled = compile_entities(&rulebook.schemas());

    match output {
        OutputFormat::Json => {
            let entities: BTreeMap<&str, EntityLevels> = compiled
                .iter()
                .map(|e| (e.name(), EntityLevels::new(e)))
                .collect();
            print_json(&serde_json::json!({ "entities": entities }));
        }
        OutputFormat::Text => {
            for entity in &compiled {
                println!("{}", entity.name());
                if entity.leveling.levels.is_empty() {
                    println!("  (no calculated fields)");
                }
                for (i, level) in entity.leveling.levels.iter().enumerate() {
                    println!("  Level {}: {}", i + 1, level.join(", "));
                }
                if quiet {
                    continue;
                }
                if let Some(cycle) = &entity.leveling.cycle {
                    println!(
                        "  warning: unresolved dependencies among {}",
                        cycle.fields.join(", ")
                    );
                }
                for u in &entity.unknown_references {
                    println!("  warning: {} references undeclared field {}", u.field, u.reference);
                }
                for (name, e) in entity.failed_fields() {
                    println!("  error: {}: {}", name, e);
                }
            }
        }
    }
}
