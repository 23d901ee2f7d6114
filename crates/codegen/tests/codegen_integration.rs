//! Integration tests for Python module generation.
//!
//! The generated module is compared against the reference evaluator on the
//! shared fixture and on an arithmetic-heavy entity. The comparison runs
//! the module under `python3` and is skipped when no interpreter is
//! available.

use std::io::Write as _;
use std::path::Path;
use std::process::{Command, Stdio};

use rulebook_codegen::{generate_module, PythonConfig};
use rulebook_core::{
    compile_entities, compile_entity, to_snake_case, CompiledEntity, DataType, EntitySchema, Field,
};
use rulebook_eval::{evaluate_entity, record_from_json, Record};
use rulebook_interchange::load_rulebook;

/// Locate the workspace root by walking up from CARGO_MANIFEST_DIR.
fn workspace_root() -> &'static Path {
    // crates/codegen -> workspace root is two levels up
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
}

fn fixture() -> rulebook_interchange::Rulebook {
    load_rulebook(&workspace_root().join("fixtures/language_candidates.json")).expect("fixture")
}

fn python_available() -> bool {
    Command::new("python3")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Record with snake_case keys, as the generated drivers expect.
fn snake_record(record: &Record) -> serde_json::Value {
    record
        .iter()
        .map(|(k, v)| (to_snake_case(k), v.to_json()))
        .collect::<serde_json::Map<_, _>>()
        .into()
}

/// Run `compute_all_calculated_fields` over `records` in python3.
fn run_python(source: &str, entity: &str, records: &[serde_json::Value]) -> Vec<serde_json::Value> {
    let dir = tempfile::tempdir().expect("temp dir");
    std::fs::write(dir.path().join("rulebook_calcs.py"), source).expect("write module");

    let script = "import json, sys\n\
                  import rulebook_calcs\n\
                  entity = sys.argv[1]\n\
                  rows = json.load(sys.stdin)\n\
                  print(json.dumps([rulebook_calcs.compute_all_calculated_fields(r, entity) for r in rows]))\n";
    let mut child = Command::new("python3")
        .arg("-c")
        .arg(script)
        .arg(entity)
        .current_dir(dir.path())
        .env("PYTHONPATH", dir.path())
        .env("PYTHONDONTWRITEBYTECODE", "1")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn python3");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(serde_json::to_string(records).unwrap().as_bytes())
        .expect("write records");
    let output = child.wait_with_output().expect("python3 output");
    assert!(
        output.status.success(),
        "python3 failed:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("python3 prints JSON")
}

/// Generated code and the reference evaluator agree on every calculated
/// field of every record.
fn assert_equivalent(entity: &CompiledEntity, records: &[Record]) {
    let module = generate_module(std::slice::from_ref(entity), &PythonConfig::default());
    assert!(module.issues.is_empty(), "issues: {:?}", module.issues);

    let inputs: Vec<_> = records.iter().map(snake_record).collect();
    let outputs = run_python(&module.source, entity.name(), &inputs);
    assert_eq!(outputs.len(), records.len());

    for (record, py) in records.iter().zip(&outputs) {
        let expected = evaluate_entity(entity, record);
        for name in entity.fields.keys() {
            let key = to_snake_case(name);
            assert_eq!(
                py.get(&key).cloned().unwrap_or(serde_json::Value::Null),
                expected.value(name).to_json(),
                "field {} of record {:?}",
                name,
                record
            );
        }
    }
}

#[test]
fn fixture_module_generates_without_issues() {
    let rulebook = fixture();
    let compiled = compile_entities(&rulebook.schemas());
    let config = PythonConfig {
        source_name: "language_candidates.json".to_string(),
        emit_dispatcher: true,
    };
    let module = generate_module(&compiled, &config);

    assert!(module.issues.is_empty(), "issues: {:?}", module.issues);
    assert!(module.source.contains("Generated from: language_candidates.json"));
    assert!(module
        .source
        .contains("def calc_language_candidates_has_grammar(has_syntax):"));
    assert!(module
        .source
        .contains("def compute_language_candidates_fields(record):"));
    assert!(module.source.contains("'LanguageCandidates': compute_language_candidates_fields,"));

    // every calculated field has exactly one function
    for entity in &compiled {
        for field in entity.fields.values() {
            let def = format!(
                "def {}(",
                rulebook_codegen::function_name(entity.name(), field.name())
            );
            assert_eq!(module.source.matches(&def).count(), 1, "{}", def);
        }
    }
}

#[test]
fn fixture_module_matches_reference_evaluator() {
    if !python_available() {
        eprintln!("python3 not found; skipping");
        return;
    }
    let rulebook = fixture();
    let entity = rulebook.entity("LanguageCandidates").expect("entity");
    let compiled = compile_entity(&entity.schema);

    let mut records: Vec<Record> = entity
        .data
        .iter()
        .map(|row| record_from_json(&entity.schema, row).expect("row"))
        .collect();
    // all raw fields unset
    records.push(Record::new());

    assert_equivalent(&compiled, &records);
}

#[test]
fn arithmetic_module_matches_reference_evaluator() {
    if !python_available() {
        eprintln!("python3 not found; skipping");
        return;
    }
    let schema = EntitySchema::new(
        "Ledger",
        vec![
            Field::raw("A", DataType::Integer),
            Field::raw("B", DataType::Integer),
            Field::raw("Flag", DataType::Boolean),
            Field::raw("Label", DataType::String),
            Field::calculated("Total", DataType::Integer, "={{A}} + {{B}} * 2"),
            Field::calculated("Ratio", DataType::Integer, "={{A}} / {{B}}"),
            Field::calculated("Negated", DataType::Integer, "=-{{A}}"),
            Field::calculated("Less", DataType::Boolean, "={{A}} < {{B}}"),
            Field::calculated("Same", DataType::Boolean, "={{A}} = {{B}}"),
            Field::calculated("Differs", DataType::Boolean, "={{Label}} <> \"x\""),
            Field::calculated("Text", DataType::String, "={{A}} & \"/\" & {{Flag}} & {{Label}}"),
            Field::calculated("Pick", DataType::Integer, "=IF({{Flag}}, {{A}} * 2, {{B}} - 1)"),
            Field::calculated("Mixed", DataType::Integer, "={{A}} + {{Label}}"),
            Field::calculated("Both", DataType::Boolean, "=AND({{Flag}}, NOT({{Less}}))"),
            Field::calculated("Either", DataType::Boolean, "=OR({{Flag}}, {{Same}})"),
            Field::calculated("Trimmed", DataType::String, "=UPPER(TRIM({{Label}}))"),
            Field::calculated("Length", DataType::Integer, "=LEN({{Label}}) + LEN({{Text}})"),
            Field::calculated("Found", DataType::Integer, "=FIND(\"b\", LOWER({{Label}}))"),
            Field::calculated("Blank", DataType::String, "=IF({{Flag}}, {{Label}}, BLANK())"),
        ],
    )
    .expect("schema");
    let compiled = compile_entity(&schema);

    let row = |json: serde_json::Value| {
        record_from_json(&schema, json.as_object().expect("object")).expect("row")
    };
    let records = vec![
        row(serde_json::json!({"A": 7, "B": 2, "Flag": true, "Label": "  ab  "})),
        row(serde_json::json!({"A": -7, "B": 2, "Flag": false, "Label": "x"})),
        row(serde_json::json!({"A": 5, "B": 0, "Flag": null, "Label": ""})),
        row(serde_json::json!({"A": 3, "B": 3})),
        row(serde_json::json!({"A": i64::MAX, "B": 1, "Flag": true, "Label": "B"})),
        row(serde_json::json!({"A": i64::MIN, "B": -1})),
        Record::new(),
    ];

    assert_equivalent(&compiled, &records);
}

#[test]
fn undeclared_references_read_null_in_both_backends() {
    if !python_available() {
        eprintln!("python3 not found; skipping");
        return;
    }
    let schema = EntitySchema::new(
        "Typos",
        vec![
            Field::raw("HasSyntax", DataType::Boolean),
            Field::calculated("Echo", DataType::Boolean, "={{has_syntax}} = TRUE()"),
            Field::calculated("Camel", DataType::Boolean, "=NOT({{hasSyntax}})"),
            Field::calculated("Declared", DataType::Boolean, "={{HasSyntax}} = TRUE()"),
        ],
    )
    .expect("schema");
    let compiled = compile_entity(&schema);
    assert_eq!(compiled.unknown_references.len(), 2);

    let record = record_from_json(
        &schema,
        serde_json::json!({"HasSyntax": true}).as_object().expect("object"),
    )
    .expect("row");
    let evaluation = evaluate_entity(&compiled, &record);
    assert_eq!(evaluation.value("Echo"), &rulebook_eval::Value::Bool(false));
    assert_eq!(evaluation.value("Declared"), &rulebook_eval::Value::Bool(true));

    assert_equivalent(&compiled, &[record, Record::new()]);
}
