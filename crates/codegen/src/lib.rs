//! rulebook-codegen: Python code generation for rulebook formulas.
//!
//! Each calculated field becomes a pure function
//! `calc_<entity>_<field>(<deps>)` whose parameters are the snake_case
//! names of the fields it reads. A whole module adds the runtime prelude,
//! one driver per entity that computes its fields level by level, and a
//! dispatcher keyed by entity name.
//!
//! - [`generate()`] -- one field's function source
//! - [`generate_module()`] -- a complete module for compiled entities

pub mod error;
pub mod module;
pub mod prelude;
pub mod pyexpr;
pub mod translate;

pub use error::CodeGenError;
pub use module::{generate_module, GeneratedModule, GenerationIssue, PythonConfig};
pub use pyexpr::PyExpr;
pub use translate::{
    function_name, generate, generate_stub, generate_with_formula, python_identifier,
};
