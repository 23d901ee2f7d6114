//! Dependency extraction and evaluation leveling.
//!
//! Level 0 (raw fields) is implicit. Level k holds every calculated field
//! whose dependencies were all available before level k. Fields inside a
//! level are sorted by name so every backend sees the same order.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::ast::{walk, AstNode, AstVisitor, BinaryOp, UnaryOp};

// ──────────────────────────────────────────────
// Dependency extraction
// ──────────────────────────────────────────────

struct FieldRefCollector;

impl AstVisitor for FieldRefCollector {
    type Output = BTreeSet<String>;

    fn literal_bool(&mut self, _: bool) -> Self::Output {
        BTreeSet::new()
    }
    fn literal_int(&mut self, _: i64) -> Self::Output {
        BTreeSet::new()
    }
    fn literal_string(&mut self, _: &str) -> Self::Output {
        BTreeSet::new()
    }
    fn field_ref(&mut self, name: &str) -> Self::Output {
        BTreeSet::from([name.to_owned()])
    }
    fn unary_op(&mut self, _: UnaryOp, operand: Self::Output) -> Self::Output {
        operand
    }
    fn binary_op(
        &mut self,
        _: BinaryOp,
        mut left: Self::Output,
        right: Self::Output,
    ) -> Self::Output {
        left.extend(right);
        left
    }
    fn concat(&mut self, parts: Vec<Self::Output>) -> Self::Output {
        parts.into_iter().flatten().collect()
    }
    fn func_call(&mut self, _: &str, args: Vec<Self::Output>) -> Self::Output {
        args.into_iter().flatten().collect()
    }
}

/// Every field name referenced anywhere in `ast`, sorted. This order is
/// the parameter order of generated functions.
pub fn field_dependencies(ast: &AstNode) -> BTreeSet<String> {
    walk(&mut FieldRefCollector, ast)
}

// ──────────────────────────────────────────────
// Leveling
// ──────────────────────────────────────────────

/// Non-fatal diagnostic: some calculated fields could never become ready,
/// either because they depend on each other or on a field that does not
/// exist. They were all placed in one final level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyCycle {
    /// Fields of the final level, sorted.
    pub fields: Vec<String>,
    /// For each of those fields, the dependencies that were never assigned.
    pub unresolved: BTreeMap<String, BTreeSet<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Leveling {
    /// Levels 1.. of calculated field names.
    pub levels: Vec<Vec<String>>,
    pub cycle: Option<DependencyCycle>,
}

impl Leveling {
    /// Flattened evaluation order.
    pub fn order(&self) -> impl Iterator<Item = &str> {
        self.levels.iter().flatten().map(String::as_str)
    }

    /// 1-based level of `field`, if it is a calculated field.
    pub fn level_of(&self, field: &str) -> Option<usize> {
        self.levels
            .iter()
            .position(|level| level.iter().any(|f| f == field))
            .map(|i| i + 1)
    }
}

/// Assign calculated fields to levels.
///
/// `calculated` maps each calculated field to its dependency set. Never
/// fails: when no remaining field is ready, all remaining fields form the
/// final level and [`Leveling::cycle`] is set.
pub fn build_levels(
    calculated: &BTreeMap<String, BTreeSet<String>>,
    raw_field_names: &BTreeSet<String>,
) -> Leveling {
    let mut assigned: BTreeSet<&str> = raw_field_names.iter().map(String::as_str).collect();
    let mut remaining: BTreeMap<&str, &BTreeSet<String>> =
        calculated.iter().map(|(k, v)| (k.as_str(), v)).collect();
    let mut leveling = Leveling::default();

    while !remaining.is_empty() {
        let ready: Vec<&str> = remaining
            .iter()
            .filter(|(_, deps)| deps.iter().all(|d| assigned.contains(d.as_str())))
            .map(|(name, _)| *name)
            .collect();

        if ready.is_empty() {
            let unresolved: BTreeMap<String, BTreeSet<String>> = remaining
                .iter()
                .map(|(name, deps)| {
                    let missing = deps
                        .iter()
                        .filter(|d| !assigned.contains(d.as_str()))
                        .cloned()
                        .collect();
                    (name.to_string(), missing)
                })
                .collect();
            let fields: Vec<String> = remaining.keys().map(|n| n.to_string()).collect();
            tracing::warn!(
                fields = ?fields,
                "could not resolve dependencies; placing remaining fields in a final level"
            );
            leveling.levels.push(fields.clone());
            leveling.cycle = Some(DependencyCycle { fields, unresolved });
            break;
        }

        for name in &ready {
            remaining.remove(name);
            assigned.insert(*name);
        }
        leveling
            .levels
            .push(ready.into_iter().map(str::to_owned).collect());
    }

    leveling
}

/// A reference to a field the entity does not declare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownReference {
    pub field: String,
    pub reference: String,
}

/// References in `calculated` that name neither a raw nor a calculated
/// field of the entity.
pub fn unknown_references(
    calculated: &BTreeMap<String, BTreeSet<String>>,
    raw_field_names: &BTreeSet<String>,
) -> Vec<UnknownReference> {
    calculated
        .iter()
        .flat_map(|(field, deps)| {
            deps.iter()
                .filter(|d| !raw_field_names.contains(*d) && !calculated.contains_key(*d))
                .map(move |d| UnknownReference {
                    field: field.clone(),
                    reference: d.clone(),
                })
        })
        .collect()
}
