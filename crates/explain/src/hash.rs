//! Canonical hashing of graphs and rulebook documents.
//!
//! Hashes are taken over JSON text in the form Python's
//! `json.dumps(obj, sort_keys=True)` writes it: `", "` and `": "`
//! separators, and every character outside printable ASCII escaped as
//! `\uXXXX` (surrogate pairs above the BMP). Keys come out sorted because
//! `serde_json::Map` is ordered.

use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;
use sha2::{Digest, Sha256};

use crate::graph::ProvenanceGraph;

/// Length of a template hash, in hex characters.
const TEMPLATE_HASH_LEN: usize = 16;
/// Length of a rulebook hash, in hex characters.
const RULEBOOK_HASH_LEN: usize = 32;

#[derive(Debug, Clone, Copy, Default)]
pub struct PythonJsonFormatter;

impl Formatter for PythonJsonFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            if (' '..='~').contains(&c) {
                continue;
            }
            writer.write_all(fragment[start..i].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = i + c.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Serialize `value` the way Python's `json.dumps(value, sort_keys=True)`
/// does.
pub fn to_canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PythonJsonFormatter);
    value.serialize(&mut ser)?;
    // the formatter only writes ASCII
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn sha256_prefix(text: &str, len: usize) -> String {
    let digest = format!("{:x}", Sha256::digest(text.as_bytes()));
    format!("sha256:{}", &digest[..len])
}

/// Canonical JSON a template hash is computed over: the formula text, the
/// nodes as `[id, node]` pairs sorted by id and the sorted edges.
pub fn template_canonical_json(graph: &ProvenanceGraph, formula: &str) -> String {
    let mut nodes: Vec<(&str, serde_json::Value)> = graph
        .ids
        .iter()
        .zip(&graph.nodes)
        .map(|(id, node)| {
            (
                id.as_str(),
                serde_json::to_value(node).unwrap_or(serde_json::Value::Null),
            )
        })
        .collect();
    nodes.sort_by(|a, b| a.0.cmp(b.0));
    let mut edges: Vec<&(String, String)> = graph.edges.iter().collect();
    edges.sort();

    let canonical = serde_json::json!({
        "formula": formula,
        "nodes": nodes,
        "edges": edges,
    });
    to_canonical_json(&canonical).unwrap_or_default()
}

/// `sha256:` followed by the first 16 hex characters of the SHA-256 of the
/// graph's canonical form. Identical for structurally identical formulas
/// with the same text.
pub fn template_hash(graph: &ProvenanceGraph, formula: &str) -> String {
    sha256_prefix(&template_canonical_json(graph, formula), TEMPLATE_HASH_LEN)
}

/// `sha256:` followed by the first 32 hex characters of the SHA-256 of the
/// whole rulebook document in canonical form.
pub fn rulebook_hash(document: &serde_json::Value) -> String {
    sha256_prefix(
        &to_canonical_json(document).unwrap_or_default(),
        RULEBOOK_HASH_LEN,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::to_graph;
    use rulebook_core::parse_formula;

    #[test]
    fn canonical_json_uses_python_separators_and_ascii_escapes() {
        let value = serde_json::json!({"b": [1, true, null], "a": "naïve \u{1F600}\n\"q\"\u{7f}"});
        assert_eq!(
            to_canonical_json(&value).unwrap(),
            r#"{"a": "na\u00efve \ud83d\ude00\n\"q\"\u007f", "b": [1, true, null]}"#
        );
    }

    #[test]
    fn template_canonical_form() {
        let formula = "={{A}} = 1";
        let graph = to_graph(&parse_formula(formula).unwrap(), "F");
        assert_eq!(
            template_canonical_json(&graph, formula),
            concat!(
                r#"{"edges": [["n_const_2", "n_op_3"], ["n_op_3", "n_result_F"], ["n_ref_1", "n_op_3"]], "#,
                r#""formula": "={{A}} = 1", "#,
                r#""nodes": [["n_const_2", {"kind": "const", "type": "integer", "value": 1}], "#,
                r#"["n_op_3", {"args": ["n_ref_1", "n_const_2"], "kind": "op", "name": "="}], "#,
                r#"["n_ref_1", {"field": "A", "field_snake": "a", "kind": "field_ref"}], "#,
                r#"["n_result_F", {"field": "F", "field_snake": "f", "in": ["n_op_3"], "kind": "result"}]]}"#
            )
        );
        assert_eq!(template_hash(&graph, formula), "sha256:00ab204bc2ad6c55");
    }

    #[test]
    fn hash_format() {
        let formula = "={{A}} & \"x\"";
        let hash = template_hash(&to_graph(&parse_formula(formula).unwrap(), "F"), formula);
        assert!(hash.starts_with("sha256:"));
        assert_eq!(hash.len(), "sha256:".len() + 16);
        assert!(hash[7..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

        let doc_hash = rulebook_hash(&serde_json::json!({"Name": "x"}));
        assert_eq!(doc_hash.len(), "sha256:".len() + 32);
    }

    #[test]
    fn hash_is_idempotent_and_order_sensitive() {
        let hash = |formula: &str| {
            template_hash(&to_graph(&parse_formula(formula).unwrap(), "F"), formula)
        };
        assert_eq!(hash("={{A}} - {{B}}"), hash("={{A}} - {{B}}"));
        assert_ne!(hash("={{A}} - {{B}}"), hash("={{B}} - {{A}}"));
    }
}
