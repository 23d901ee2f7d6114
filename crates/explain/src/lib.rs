//! rulebook-explain: formulas as provenance graphs.
//!
//! - [`to_graph()`] -- post-order DAG of a formula's operations
//! - [`template_hash()`] -- canonical content hash of a graph
//! - [`explain_spec()`] -- order, dependency edges and templates of a rulebook
//! - [`derive()`] -- the value every graph node takes for one record

pub mod graph;
pub mod hash;
pub mod spec;
pub mod trace;

pub use graph::{to_graph, NodeDescriptor, ProvenanceGraph, GRAPH_SCHEMA_VERSION};
pub use hash::{rulebook_hash, template_hash, to_canonical_json, PythonJsonFormatter};
pub use spec::{explain_entity, explain_spec, ExplainSpec, ExprTemplate, EXPLAIN_SCHEMA_VERSION};
pub use trace::{derive, Derivation, Witness};
