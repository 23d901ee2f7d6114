//! rulebook-core: formula compiler front end.
//!
//! Turns spreadsheet-style formula text into a typed AST, extracts the
//! fields each formula reads and orders an entity's calculated fields into
//! evaluation levels. The backends (evaluator, code generator, graph
//! exporter) live in their own crates and consume already-built ASTs.
//!
//! # Public API
//!
//! - [`parse_formula()`] -- tokenize and parse one formula
//! - [`field_dependencies()`] / [`build_levels()`] -- dependency leveling
//! - [`compile_entity()`] / [`compile_entities()`] -- whole-entity driver
//! - [`AstNode`] and [`AstVisitor`] -- the tree and its visitor

pub mod ast;
pub mod builtins;
pub mod compile;
pub mod deps;
pub mod error;
pub mod lexer;
pub mod names;
pub mod parser;
pub mod schema;

// ── Convenience re-exports: key types ────────────────────────────────

pub use ast::{walk, AstNode, AstVisitor, BinaryOp, UnaryOp};
pub use builtins::function_arity;
pub use compile::{CompiledEntity, CompiledField};
pub use deps::{DependencyCycle, Leveling, UnknownReference};
pub use error::{Arity, FormulaError, LexError, ParseError, SchemaError};
pub use lexer::{Token, TokenKind};
pub use schema::{DataType, EntitySchema, Field, FieldKind};

// ── Convenience re-exports: pipeline entry points ────────────────────

pub use compile::{compile_entities, compile_entity};
pub use deps::{build_levels, field_dependencies, unknown_references};
pub use lexer::tokenize;
pub use names::to_snake_case;
pub use parser::{parse, parse_formula};
