//! The explain spec: per entity, the evaluation order, the dependency
//! edges and a hashed expression template for every calculated field.

use std::collections::BTreeMap;

use rulebook_core::{compile_entity, to_snake_case, CompiledEntity};
use rulebook_interchange::{Rulebook, RulebookEntity};
use serde::Serialize;

use crate::graph::to_graph;
use crate::hash::{rulebook_hash, template_hash};

pub const EXPLAIN_SCHEMA_VERSION: &str = "erb.explain_spec.v1";

#[derive(Debug, Clone, Serialize)]
pub struct ExplainSpec {
    pub schema_version: &'static str,
    pub rulebook: RulebookInfo,
    pub semantics: Semantics,
    pub entities: BTreeMap<String, EntityExplain>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RulebookInfo {
    pub name: String,
    pub rulebook_hash: String,
}

/// The evaluation profile every template is read under.
#[derive(Debug, Clone, Serialize)]
pub struct Semantics {
    pub profile: &'static str,
    pub version: &'static str,
    pub null_handling: &'static str,
    pub boolean_coercion: &'static str,
}

impl Default for Semantics {
    fn default() -> Self {
        Semantics {
            profile: "excel",
            version: "v1",
            null_handling: "three_valued_logic",
            boolean_coercion: "strict",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldInfo {
    pub datatype: &'static str,
    pub nullable: bool,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityExplain {
    pub id_field: Option<String>,
    pub id_field_snake: Option<String>,
    pub fields: BTreeMap<String, FieldInfo>,
    pub calc_order: Vec<String>,
    /// `[dependency, dependent]` pairs.
    pub dep_edges: Vec<[String; 2]>,
    pub expr_templates: BTreeMap<String, ExprTemplate>,
}

/// A calculated field's graph, or the reason it has none. A failed
/// template has `template_hash: "error"`, no root and an empty graph.
#[derive(Debug, Clone, Serialize)]
pub struct ExprTemplate {
    pub formula_source: String,
    pub template_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub root_node: Option<String>,
    pub nodes: serde_json::Map<String, serde_json::Value>,
    pub edges: Vec<[String; 2]>,
}

fn expr_template(compiled: &CompiledEntity, field: &str) -> Option<ExprTemplate> {
    let field = compiled.field(field)?;
    let formula_source = field.formula().to_string();
    Some(match &field.ast {
        Ok(ast) => {
            let graph = to_graph(ast, field.name());
            let body = graph.body_json();
            ExprTemplate {
                template_hash: template_hash(&graph, &formula_source),
                formula_source,
                error: None,
                root_node: Some(graph.root_node.clone()),
                nodes: body["nodes"].as_object().cloned().unwrap_or_default(),
                edges: graph.edges.into_iter().map(|(s, t)| [s, t]).collect(),
            }
        }
        Err(e) => {
            tracing::warn!(field = %field.name(), error = %e, "no template for field");
            ExprTemplate {
                formula_source,
                template_hash: "error".to_string(),
                error: Some(e.to_string()),
                root_node: None,
                nodes: serde_json::Map::new(),
                edges: Vec::new(),
            }
        }
    })
}

/// Explain one entity. `None` when it has no calculated fields.
pub fn explain_entity(entity: &RulebookEntity) -> Option<EntityExplain> {
    let compiled = compile_entity(&entity.schema);
    if compiled.fields.is_empty() {
        return None;
    }

    let fields = entity
        .schema
        .fields()
        .iter()
        .map(|f| {
            (
                f.name.clone(),
                FieldInfo {
                    datatype: f.datatype.as_str(),
                    nullable: f.nullable,
                    kind: f.kind.as_str(),
                },
            )
        })
        .collect();

    let calculated: Vec<&str> = entity
        .schema
        .calculated_fields()
        .map(|f| f.name.as_str())
        .collect();
    let dep_edges = calculated
        .iter()
        .filter_map(|name| compiled.field(name))
        .flat_map(|f| {
            f.dependencies
                .iter()
                .map(move |dep| [dep.clone(), f.name().to_string()])
        })
        .collect();
    let expr_templates = calculated
        .iter()
        .filter_map(|name| expr_template(&compiled, name).map(|t| (name.to_string(), t)))
        .collect();

    Some(EntityExplain {
        id_field_snake: entity.id_field.as_deref().map(to_snake_case),
        id_field: entity.id_field.clone(),
        fields,
        calc_order: compiled.leveling.order().map(str::to_owned).collect(),
        dep_edges,
        expr_templates,
    })
}

/// Build the explain spec of a whole rulebook.
pub fn explain_spec(rulebook: &Rulebook) -> ExplainSpec {
    let entities = rulebook
        .entities
        .iter()
        .filter_map(|e| explain_entity(e).map(|x| (e.name().to_string(), x)))
        .collect();
    ExplainSpec {
        schema_version: EXPLAIN_SCHEMA_VERSION,
        rulebook: RulebookInfo {
            name: rulebook.name.clone().unwrap_or_else(|| "Unknown".to_string()),
            rulebook_hash: rulebook_hash(&rulebook.source),
        },
        semantics: Semantics::default(),
        entities,
    }
}
