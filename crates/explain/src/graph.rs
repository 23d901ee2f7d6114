//! AST to provenance graph conversion.
//!
//! Nodes are numbered in post-order with one counter shared by every kind;
//! a node's id is `n_<prefix>_<n>` where the prefix names its kind
//! (`const`, `ref`, `fn`, `op`). The expression root feeds a final
//! `n_result_<field>` node.

use std::collections::BTreeMap;

use rulebook_core::{to_snake_case, walk, AstNode, AstVisitor, BinaryOp, UnaryOp};
use serde::Serialize;

use crate::hash::template_hash;

pub const GRAPH_SCHEMA_VERSION: &str = "erb.provenance_graph.v1";

// ──────────────────────────────────────────────
// Graph types
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeDescriptor {
    Const {
        value: serde_json::Value,
        #[serde(rename = "type")]
        datatype: String,
    },
    FieldRef {
        field: String,
        field_snake: String,
    },
    /// Unary operators and function calls.
    Fn { name: String, args: Vec<String> },
    /// Binary operators and concatenation.
    Op { name: String, args: Vec<String> },
    Result {
        field: String,
        field_snake: String,
        #[serde(rename = "in")]
        inputs: Vec<String>,
    },
}

impl NodeDescriptor {
    /// Ids of the nodes this one consumes.
    pub fn inputs(&self) -> &[String] {
        match self {
            NodeDescriptor::Const { .. } | NodeDescriptor::FieldRef { .. } => &[],
            NodeDescriptor::Fn { args, .. } | NodeDescriptor::Op { args, .. } => args,
            NodeDescriptor::Result { inputs, .. } => inputs,
        }
    }
}

/// A formula as a DAG of operations. `nodes` is an arena in creation
/// order; `ids[i]` names `nodes[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvenanceGraph {
    pub root_node: String,
    pub ids: Vec<String>,
    pub nodes: Vec<NodeDescriptor>,
    /// `(source, target)`: the source's value flows into the target.
    pub edges: Vec<(String, String)>,
}

impl ProvenanceGraph {
    pub fn node(&self, id: &str) -> Option<&NodeDescriptor> {
        self.ids.iter().position(|i| i == id).map(|i| &self.nodes[i])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes keyed by id.
    pub fn node_map(&self) -> BTreeMap<&str, &NodeDescriptor> {
        self.ids
            .iter()
            .map(String::as_str)
            .zip(self.nodes.iter())
            .collect()
    }

    /// `{root_node, nodes, edges}` with `nodes` as an object keyed by id.
    pub fn body_json(&self) -> serde_json::Value {
        let nodes: serde_json::Map<String, serde_json::Value> = self
            .ids
            .iter()
            .zip(&self.nodes)
            .map(|(id, node)| {
                (
                    id.clone(),
                    serde_json::to_value(node).unwrap_or(serde_json::Value::Null),
                )
            })
            .collect();
        serde_json::json!({
            "root_node": self.root_node,
            "nodes": nodes,
            "edges": self.edges.iter().map(|(s, t)| [s, t]).collect::<Vec<_>>(),
        })
    }

    /// Full graph document, hashed against `formula`.
    pub fn to_json(&self, formula: &str) -> serde_json::Value {
        let mut doc = self.body_json();
        if let Some(obj) = doc.as_object_mut() {
            obj.insert("schema_version".into(), GRAPH_SCHEMA_VERSION.into());
            obj.insert("template_hash".into(), template_hash(self, formula).into());
        }
        doc
    }
}

// ──────────────────────────────────────────────
// Builder
// ──────────────────────────────────────────────

struct GraphBuilder {
    ids: Vec<String>,
    nodes: Vec<NodeDescriptor>,
    edges: Vec<(String, String)>,
}

impl GraphBuilder {
    fn push(&mut self, prefix: &str, node: NodeDescriptor) -> String {
        let id = format!("n_{}_{}", prefix, self.nodes.len() + 1);
        for input in node.inputs() {
            self.edges.push((input.clone(), id.clone()));
        }
        self.ids.push(id.clone());
        self.nodes.push(node);
        id
    }

    fn constant(&mut self, value: serde_json::Value, datatype: &str) -> String {
        self.push(
            "const",
            NodeDescriptor::Const {
                value,
                datatype: datatype.to_string(),
            },
        )
    }
}

impl AstVisitor for GraphBuilder {
    type Output = String;

    fn literal_bool(&mut self, value: bool) -> String {
        self.constant(value.into(), "boolean")
    }

    fn literal_int(&mut self, value: i64) -> String {
        self.constant(value.into(), "integer")
    }

    fn literal_string(&mut self, value: &str) -> String {
        self.constant(value.into(), "string")
    }

    fn field_ref(&mut self, name: &str) -> String {
        self.push(
            "ref",
            NodeDescriptor::FieldRef {
                field: name.to_string(),
                field_snake: to_snake_case(name),
            },
        )
    }

    fn unary_op(&mut self, op: UnaryOp, operand: String) -> String {
        self.push(
            "fn",
            NodeDescriptor::Fn {
                name: op.symbol().to_string(),
                args: vec![operand],
            },
        )
    }

    fn binary_op(&mut self, op: BinaryOp, left: String, right: String) -> String {
        self.push(
            "op",
            NodeDescriptor::Op {
                name: op.symbol().to_string(),
                args: vec![left, right],
            },
        )
    }

    fn concat(&mut self, parts: Vec<String>) -> String {
        self.push(
            "op",
            NodeDescriptor::Op {
                name: "CONCAT".to_string(),
                args: parts,
            },
        )
    }

    fn func_call(&mut self, name: &str, args: Vec<String>) -> String {
        self.push(
            "fn",
            NodeDescriptor::Fn {
                name: name.to_string(),
                args,
            },
        )
    }
}

/// Convert `ast` into the provenance graph of calculated field `field`.
/// Structurally equal ASTs give identical graphs.
pub fn to_graph(ast: &AstNode, field: &str) -> ProvenanceGraph {
    let mut builder = GraphBuilder {
        ids: Vec::new(),
        nodes: Vec::new(),
        edges: Vec::new(),
    };
    let expr_root = walk(&mut builder, ast);

    let root_node = format!("n_result_{}", field);
    builder.edges.push((expr_root.clone(), root_node.clone()));
    builder.ids.push(root_node.clone());
    builder.nodes.push(NodeDescriptor::Result {
        field: field.to_string(),
        field_snake: to_snake_case(field),
        inputs: vec![expr_root],
    });

    ProvenanceGraph {
        root_node,
        ids: builder.ids,
        nodes: builder.nodes,
        edges: builder.edges,
    }
}
