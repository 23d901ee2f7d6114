//! Derivation traces: the value each graph node takes for one record.
//!
//! Node ids line up with [`to_graph`](crate::graph::to_graph). Every node
//! is evaluated as its own subtree, so an untaken `IF` branch still shows
//! the value it would have had.

use std::collections::BTreeMap;

use rulebook_core::AstNode;
use rulebook_eval::{evaluate, Record, Value};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Witness {
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Derivation {
    pub field: String,
    pub root_node: String,
    /// Keyed by graph node id.
    pub witnessed: BTreeMap<String, Witness>,
}

impl Derivation {
    /// The value of the field itself.
    pub fn value(&self) -> &Value {
        static NULL: Value = Value::Null;
        self.witnessed
            .get(&self.root_node)
            .map(|w| &w.value)
            .unwrap_or(&NULL)
    }
}

struct Tracer<'a> {
    record: &'a Record,
    count: usize,
    witnessed: BTreeMap<String, Witness>,
}

impl Tracer<'_> {
    fn visit(&mut self, node: &AstNode) -> String {
        for child in node.children() {
            self.visit(child);
        }
        self.count += 1;
        let prefix = match node {
            AstNode::LiteralBool { .. }
            | AstNode::LiteralInt { .. }
            | AstNode::LiteralString { .. } => "const",
            AstNode::FieldRef { .. } => "ref",
            AstNode::UnaryOp { .. } | AstNode::FuncCall { .. } => "fn",
            AstNode::BinaryOp { .. } | AstNode::Concat { .. } => "op",
        };
        let id = format!("n_{}_{}", prefix, self.count);
        let witness = match evaluate(node, self.record) {
            Ok(value) => Witness { value, error: None },
            Err(e) => Witness {
                value: Value::Null,
                error: Some(e.to_string()),
            },
        };
        self.witnessed.insert(id.clone(), witness);
        id
    }
}

/// Trace `ast`, the formula of `field`, over `record`.
pub fn derive(ast: &AstNode, field: &str, record: &Record) -> Derivation {
    let mut tracer = Tracer {
        record,
        count: 0,
        witnessed: BTreeMap::new(),
    };
    let expr_root = tracer.visit(ast);
    let root_node = format!("n_result_{}", field);
    if let Some(root) = tracer.witnessed.get(&expr_root).cloned() {
        tracer.witnessed.insert(root_node.clone(), root);
    }
    Derivation {
        field: field.to_string(),
        root_node,
        witnessed: tracer.witnessed,
    }
}
