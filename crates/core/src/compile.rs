//! Per-entity compilation: parse every calculated field, extract its
//! dependencies and level the entity.

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;

use crate::ast::AstNode;
use crate::deps::{
    build_levels, field_dependencies, unknown_references, Leveling, UnknownReference,
};
use crate::error::FormulaError;
use crate::parser::parse_formula;
use crate::schema::{EntitySchema, Field};

/// One calculated field after parsing. A field whose formula failed to
/// parse keeps its error and has no dependencies.
#[derive(Debug, Clone)]
pub struct CompiledField {
    pub field: Field,
    pub ast: Result<AstNode, FormulaError>,
    pub dependencies: BTreeSet<String>,
}

impl CompiledField {
    pub fn name(&self) -> &str {
        &self.field.name
    }

    pub fn formula(&self) -> &str {
        self.field.formula.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct CompiledEntity {
    pub schema: EntitySchema,
    /// Keyed by field name.
    pub fields: BTreeMap<String, CompiledField>,
    pub leveling: Leveling,
    pub unknown_references: Vec<UnknownReference>,
}

impl CompiledEntity {
    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn field(&self, name: &str) -> Option<&CompiledField> {
        self.fields.get(name)
    }

    /// Calculated fields grouped by level, in evaluation order.
    pub fn level_fields(&self) -> impl Iterator<Item = Vec<&CompiledField>> + '_ {
        self.leveling
            .levels
            .iter()
            .map(|level| level.iter().filter_map(|name| self.fields.get(name)).collect())
    }

    /// Fields whose formula did not parse.
    pub fn failed_fields(&self) -> impl Iterator<Item = (&str, &FormulaError)> {
        self.fields
            .values()
            .filter_map(|f| f.ast.as_ref().err().map(|e| (f.name(), e)))
    }

    /// Dependency map of the calculated fields.
    pub fn dependency_map(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.fields
            .iter()
            .map(|(name, f)| (name.clone(), f.dependencies.clone()))
            .collect()
    }
}

fn compile_field(field: &Field) -> CompiledField {
    let ast = parse_formula(field.formula.as_deref().unwrap_or_default());
    let dependencies = match &ast {
        Ok(ast) => field_dependencies(ast),
        Err(e) => {
            tracing::warn!(field = %field.name, error = %e, "formula does not parse");
            BTreeSet::new()
        }
    };
    CompiledField {
        field: field.clone(),
        ast,
        dependencies,
    }
}

pub fn compile_entity(schema: &EntitySchema) -> CompiledEntity {
    let calculated: Vec<&Field> = schema.calculated_fields().collect();
    let fields: BTreeMap<String, CompiledField> = calculated
        .par_iter()
        .map(|f| (f.name.clone(), compile_field(f)))
        .collect();

    let dependency_map: BTreeMap<String, BTreeSet<String>> = fields
        .iter()
        .map(|(name, f)| (name.clone(), f.dependencies.clone()))
        .collect();
    let raw = schema.raw_field_names();
    let leveling = build_levels(&dependency_map, &raw);
    let unknown = unknown_references(&dependency_map, &raw);
    for u in &unknown {
        tracing::warn!(
            entity = %schema.name,
            field = %u.field,
            reference = %u.reference,
            "reference to undeclared field"
        );
    }

    tracing::debug!(
        entity = %schema.name,
        calculated = fields.len(),
        levels = leveling.levels.len(),
        "compiled entity"
    );

    CompiledEntity {
        schema: schema.clone(),
        fields,
        leveling,
        unknown_references: unknown,
    }
}

/// Compile several entities in parallel. Output order follows input order.
pub fn compile_entities(schemas: &[EntitySchema]) -> Vec<CompiledEntity> {
    schemas.par_iter().map(compile_entity).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DataType;

    fn candidate() -> EntitySchema {
        EntitySchema::new(
            "LanguageCandidate",
            vec![
                Field::raw("Name", DataType::String),
                Field::raw("HasSyntax", DataType::Boolean),
                Field::calculated(
                    "Question",
                    DataType::String,
                    r#"="Is " & {{Name}} & " a language?""#,
                ),
                Field::calculated("HasGrammar", DataType::Boolean, "={{HasSyntax}} = TRUE()"),
                Field::calculated(
                    "Summary",
                    DataType::String,
                    r#"IF({{HasGrammar}}, {{Question}}, "")"#,
                ),
                Field::calculated("Broken", DataType::String, "={{Name}} &"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn compiles_levels_and_dependencies() {
        let compiled = compile_entity(&candidate());
        assert_eq!(
            compiled.leveling.levels,
            vec![
                vec!["Broken".to_string(), "HasGrammar".to_string(), "Question".to_string()],
                vec!["Summary".to_string()],
            ]
        );
        let summary = compiled.field("Summary").unwrap();
        assert_eq!(
            summary.dependencies.iter().collect::<Vec<_>>(),
            vec!["HasGrammar", "Question"]
        );
        assert!(compiled.unknown_references.is_empty());
    }

    #[test]
    fn parse_failure_is_per_field() {
        let compiled = compile_entity(&candidate());
        let failed: Vec<&str> = compiled.failed_fields().map(|(name, _)| name).collect();
        assert_eq!(failed, vec!["Broken"]);
        assert!(compiled.field("Broken").unwrap().dependencies.is_empty());
        assert!(compiled.field("Question").unwrap().ast.is_ok());
    }

    #[test]
    fn level_fields_follow_levels() {
        let compiled = compile_entity(&candidate());
        let names: Vec<Vec<&str>> = compiled
            .level_fields()
            .map(|level| level.into_iter().map(CompiledField::name).collect())
            .collect();
        assert_eq!(names, vec![vec!["Broken", "HasGrammar", "Question"], vec!["Summary"]]);
    }

    #[test]
    fn compile_entities_keeps_input_order() {
        let other = EntitySchema::new("Other", vec![Field::raw("X", DataType::Integer)]).unwrap();
        let compiled = compile_entities(&[candidate(), other]);
        let names: Vec<&str> = compiled.iter().map(CompiledEntity::name).collect();
        assert_eq!(names, vec!["LanguageCandidate", "Other"]);
        assert!(compiled[1].leveling.levels.is_empty());
    }
}
