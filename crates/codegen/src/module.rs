//! Whole-module emission.
//!
//! Layout of a generated module:
//! 1. header docstring
//! 2. runtime prelude
//! 3. per entity: the calc functions level by level, then a
//!    `compute_<entity>_fields(record)` driver
//! 4. `compute_all_calculated_fields(record, entity_name)` dispatcher

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use rulebook_core::{to_snake_case, CompiledEntity, CompiledField, DataType};
use serde::Serialize;

use crate::error::CodeGenError;
use crate::prelude::PRELUDE;
use crate::pyexpr::{docstring, string_literal};
use crate::translate::{function_name, generate_with_formula, generate_stub, python_identifier};

/// Configuration for Python module generation.
#[derive(Debug, Clone)]
pub struct PythonConfig {
    /// Shown in the header as the rulebook the module was generated from.
    pub source_name: String,
    /// Emit the `compute_all_calculated_fields` dispatcher.
    pub emit_dispatcher: bool,
}

impl Default for PythonConfig {
    fn default() -> Self {
        PythonConfig {
            source_name: "rulebook".to_string(),
            emit_dispatcher: true,
        }
    }
}

/// A field (or a whole entity, when `field` is `None`) that was not
/// generated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationIssue {
    pub entity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedModule {
    pub source: String,
    pub issues: Vec<GenerationIssue>,
}

const RULE: &str =
    "# =============================================================================";

/// Generate one Python module covering `entities`, in the given order.
/// Fields that cannot be generated become stubs and are listed in
/// [`GeneratedModule::issues`]; generation itself never fails.
pub fn generate_module(entities: &[CompiledEntity], config: &PythonConfig) -> GeneratedModule {
    let mut out = String::new();
    let mut issues = Vec::new();

    out.push_str(&docstring(&format!(
        "\nRulebook calculation module (GENERATED - DO NOT EDIT)\n\
         Generated from: {}\n\n\
         Pure functions computing calculated fields from raw field values.\n",
        config.source_name
    )));
    out.push_str("\n\n");
    out.push_str(PRELUDE);

    let mut drivers = Vec::new();
    for entity in entities {
        if entity.fields.is_empty() {
            continue;
        }
        match emit_entity(&mut out, entity, &mut issues) {
            Ok(driver) => drivers.push((entity.name().to_string(), driver)),
            Err(e) => {
                tracing::warn!(entity = %entity.name(), error = %e, "entity skipped");
                issues.push(GenerationIssue {
                    entity: entity.name().to_string(),
                    field: None,
                    message: e.to_string(),
                });
            }
        }
    }

    if config.emit_dispatcher {
        emit_dispatcher(&mut out, &drivers);
    }

    GeneratedModule {
        source: out,
        issues,
    }
}

/// Record keys of the entity's fields, checked for collisions.
fn record_keys(entity: &CompiledEntity) -> Result<BTreeMap<String, String>, CodeGenError> {
    let mut by_key: BTreeMap<String, &str> = BTreeMap::new();
    let mut keys = BTreeMap::new();
    let mut fn_names: BTreeMap<String, &str> = BTreeMap::new();
    for field in entity.schema.fields() {
        let key = to_snake_case(&field.name);
        if let Some(first) = by_key.insert(key.clone(), &field.name) {
            return Err(CodeGenError::NameCollision {
                first: first.to_string(),
                second: field.name.clone(),
                identifier: key,
            });
        }
        if field.is_calculated() {
            let name = function_name(entity.name(), &field.name);
            if let Some(first) = fn_names.insert(name.clone(), &field.name) {
                return Err(CodeGenError::NameCollision {
                    first: first.to_string(),
                    second: field.name.clone(),
                    identifier: name,
                });
            }
        }
        keys.insert(field.name.clone(), key);
    }
    Ok(keys)
}

fn emit_entity(
    out: &mut String,
    entity: &CompiledEntity,
    issues: &mut Vec<GenerationIssue>,
) -> Result<String, CodeGenError> {
    let keys = record_keys(entity)?;
    let mut generated: BTreeSet<&str> = BTreeSet::new();

    let _ = write!(out, "\n\n{}\n# ENTITY: {}\n{}\n", RULE, entity.name(), RULE);
    for (i, level) in entity.level_fields().enumerate() {
        let _ = write!(out, "\n# Level {}\n", i + 1);
        for field in level {
            let source = match &field.ast {
                Ok(ast) => generate_with_formula(
                    entity.name(),
                    field.name(),
                    field.formula(),
                    ast,
                    &field.dependencies,
                )
                .map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            out.push('\n');
            match source {
                Ok(src) => {
                    out.push_str(&src);
                    generated.insert(field.name());
                }
                Err(msg) => {
                    issue(issues, entity, field, &msg);
                    out.push_str(&generate_stub(
                        entity.name(),
                        field.name(),
                        field.formula(),
                        &msg,
                    ));
                }
            }
        }
    }

    Ok(emit_driver(out, entity, &keys, &generated))
}

fn issue(
    issues: &mut Vec<GenerationIssue>,
    entity: &CompiledEntity,
    field: &CompiledField,
    msg: &str,
) {
    tracing::warn!(
        entity = %entity.name(),
        field = %field.name(),
        error = %msg,
        "field not generated"
    );
    issues.push(GenerationIssue {
        entity: entity.name().to_string(),
        field: Some(field.name().to_string()),
        message: msg.to_string(),
    });
}

/// Emit `compute_<entity>_fields` and return its name.
fn emit_driver(
    out: &mut String,
    entity: &CompiledEntity,
    keys: &BTreeMap<String, String>,
    generated: &BTreeSet<&str>,
) -> String {
    let driver = format!(
        "compute_{}_fields",
        python_identifier(entity.name()).trim_end_matches('_')
    );
    let key = |name: &str| {
        string_literal(&keys.get(name).cloned().unwrap_or_else(|| to_snake_case(name)))
    };

    let _ = write!(
        out,
        "\n\ndef {}(record):\n    {}\n    result = dict(record)\n",
        driver,
        docstring(&format!(
            "Compute every calculated field of one {} record (snake_case keys).",
            entity.name()
        ))
    );
    for (i, level) in entity.level_fields().enumerate() {
        let _ = write!(out, "\n    # Level {}\n", i + 1);
        for field in level {
            if generated.contains(field.name()) {
                let args: Vec<String> = field
                    .dependencies
                    .iter()
                    .map(|d| match keys.get(d) {
                        Some(k) => format!("result.get({})", string_literal(k)),
                        // undeclared fields read as null
                        None => "None".to_string(),
                    })
                    .collect();
                let mut call = vec![function_name(entity.name(), field.name())];
                call.extend(args);
                let _ = writeln!(
                    out,
                    "    result[{}] = _rb_guard({})",
                    key(field.name()),
                    call.join(", ")
                );
            } else {
                let _ = writeln!(out, "    result[{}] = None", key(field.name()));
            }
        }
    }

    let string_keys: Vec<String> = entity
        .fields
        .values()
        .filter(|f| f.field.datatype == DataType::String)
        .map(|f| key(f.name()))
        .collect();
    if !string_keys.is_empty() {
        let _ = write!(
            out,
            "\n    # Convert empty strings to None for string fields\n    for key in ({},):\n        if result.get(key) == '':\n            result[key] = None\n",
            string_keys.join(", ")
        );
    }
    out.push_str("\n    return result\n");
    driver
}

fn emit_dispatcher(out: &mut String, drivers: &[(String, String)]) {
    let _ = write!(out, "\n\n{}\n# DISPATCH\n{}\n\n_COMPUTE = {{\n", RULE, RULE);
    for (entity, driver) in drivers {
        let _ = writeln!(out, "    {}: {},", string_literal(entity), driver);
    }
    out.push_str("}\n\n\n");
    out.push_str("def compute_all_calculated_fields(record, entity_name):\n");
    out.push_str(&format!(
        "    {}\n",
        docstring("Compute all calculated fields of a record of the named entity.")
    ));
    out.push_str(
        "    compute = _COMPUTE.get(entity_name)\n    if compute is None:\n        raise ValueError('unknown entity: %s' % entity_name)\n    return compute(record)\n",
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulebook_core::{compile_entity, EntitySchema, Field};

    fn entity() -> CompiledEntity {
        compile_entity(
            &EntitySchema::new(
                "LanguageCandidate",
                vec![
                    Field::raw("Name", DataType::String),
                    Field::raw("HasSyntax", DataType::Boolean),
                    Field::calculated("HasGrammar", DataType::Boolean, "={{HasSyntax}} = TRUE()"),
                    Field::calculated(
                        "Question",
                        DataType::String,
                        r#"="Is " & {{Name}} & " a language?""#,
                    ),
                    Field::calculated("Broken", DataType::Integer, "=1 +"),
                    Field::calculated("Unsupported", DataType::Integer, "=SUM({{Name}})"),
                ],
            )
            .unwrap(),
        )
    }

    #[test]
    fn module_has_header_prelude_and_dispatcher() {
        let module = generate_module(&[entity()], &PythonConfig::default());
        assert!(module.source.starts_with("\"\"\"\nRulebook calculation module"));
        assert!(module.source.contains("Generated from: rulebook"));
        assert!(module.source.contains("def _rb_guard(fn, *args):"));
        assert!(module.source.contains("def calc_language_candidate_has_grammar(has_syntax):"));
        assert!(module.source.contains("def compute_language_candidate_fields(record):"));
        assert!(module
            .source
            .contains("    'LanguageCandidate': compute_language_candidate_fields,"));
        assert!(module
            .source
            .contains("def compute_all_calculated_fields(record, entity_name):"));
    }

    #[test]
    fn driver_calls_in_level_order() {
        let module = generate_module(&[entity()], &PythonConfig::default());
        let driver = module
            .source
            .split("def compute_language_candidate_fields")
            .nth(1)
            .unwrap();
        assert!(driver.contains(
            "result['has_grammar'] = _rb_guard(calc_language_candidate_has_grammar, result.get('has_syntax'))"
        ));
        assert!(driver.contains("result['broken'] = None"));
        assert!(driver.contains("for key in ('question',):"));
    }

    #[test]
    fn undeclared_references_are_passed_as_none() {
        let entity = compile_entity(
            &EntitySchema::new(
                "E",
                vec![
                    Field::raw("HasSyntax", DataType::Boolean),
                    Field::calculated("Echo", DataType::Boolean, "={{has_syntax}} = TRUE()"),
                ],
            )
            .unwrap(),
        );
        let module = generate_module(&[entity], &PythonConfig::default());
        assert!(module.issues.is_empty());
        assert!(
            module.source.contains("result['echo'] = _rb_guard(calc_e_echo, None)"),
            "{}",
            module.source
        );
    }

    #[test]
    fn broken_fields_become_stubs_and_issues() {
        let module = generate_module(&[entity()], &PythonConfig::default());
        assert!(module.source.contains("def calc_language_candidate_broken(*args):"));
        assert!(module.source.contains("raise NotImplementedError("));
        let fields: Vec<_> = module
            .issues
            .iter()
            .map(|i| i.field.as_deref().unwrap())
            .collect();
        assert_eq!(fields, vec!["Broken", "Unsupported"]);
        assert!(module.issues[1].message.contains("SUM"));
    }

    #[test]
    fn colliding_record_keys_skip_the_entity() {
        let colliding = compile_entity(
            &EntitySchema::new(
                "E",
                vec![
                    Field::raw("HasSyntax", DataType::Boolean),
                    Field::raw("has_syntax", DataType::Boolean),
                    Field::calculated("X", DataType::Boolean, "={{HasSyntax}}"),
                ],
            )
            .unwrap(),
        );
        let module = generate_module(&[colliding], &PythonConfig::default());
        assert_eq!(module.issues.len(), 1);
        assert_eq!(module.issues[0].field, None);
        assert!(!module.source.contains("def compute_e_fields"));
    }

    #[test]
    fn dispatcher_is_optional() {
        let config = PythonConfig {
            source_name: "candidates.json".to_string(),
            emit_dispatcher: false,
        };
        let module = generate_module(&[entity()], &config);
        assert!(module.source.contains("Generated from: candidates.json"));
        assert!(!module.source.contains("_COMPUTE"));
    }

    #[test]
    fn output_is_deterministic() {
        let a = generate_module(&[entity()], &PythonConfig::default());
        let b = generate_module(&[entity()], &PythonConfig::default());
        assert_eq!(a.source, b.source);
    }
}
