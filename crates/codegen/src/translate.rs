//! AST to Python translation.
//!
//! Each node maps structurally onto a [`PyExpr`]. Strict operators go
//! through the `_rb_*` runtime helpers from the module prelude so the
//! generated code follows the reference evaluator's rules exactly;
//! `AND`, `OR` and `IF` use Python's own short-circuiting forms.

use std::collections::{BTreeMap, BTreeSet};

use rulebook_core::{function_arity, to_snake_case, AstNode, BinaryOp, UnaryOp};

use crate::error::CodeGenError;
use crate::pyexpr::{docstring, PyExpr};

// ──────────────────────────────────────────────
// Identifiers
// ──────────────────────────────────────────────

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

const RESERVED_PREFIX: &str = "_rb_";

/// snake_case Python identifier for a field or entity name. Characters
/// outside `[A-Za-z0-9_]` become `_`; keywords get a trailing `_`. The
/// `_rb_` prefix belongs to the prelude helpers.
pub fn python_identifier(name: &str) -> String {
    let mut ident: String = to_snake_case(name)
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if ident.is_empty()
        || ident.starts_with(|c: char| c.is_ascii_digit())
        || ident.starts_with(RESERVED_PREFIX)
    {
        ident.insert_str(0, "f_");
    }
    if PYTHON_KEYWORDS.contains(&ident.as_str()) {
        ident.push('_');
    }
    ident
}

/// Map every name to its identifier, failing on the first pair of names
/// that share one.
pub fn identifier_map<'a>(
    names: impl IntoIterator<Item = &'a String>,
) -> Result<BTreeMap<String, String>, CodeGenError> {
    let mut by_ident: BTreeMap<String, &String> = BTreeMap::new();
    let mut map = BTreeMap::new();
    for name in names {
        let ident = python_identifier(name);
        if let Some(first) = by_ident.get(&ident) {
            if *first != name {
                return Err(CodeGenError::NameCollision {
                    first: (*first).clone(),
                    second: name.clone(),
                    identifier: ident,
                });
            }
        }
        by_ident.insert(ident.clone(), name);
        map.insert(name.clone(), ident);
    }
    Ok(map)
}

pub fn function_name(entity_name: &str, field_name: &str) -> String {
    format!(
        "calc_{}_{}",
        python_identifier(entity_name).trim_end_matches('_'),
        python_identifier(field_name).trim_end_matches('_')
    )
}

// ──────────────────────────────────────────────
// Expressions
// ──────────────────────────────────────────────

struct Translator<'a> {
    params: &'a BTreeMap<String, String>,
}

impl Translator<'_> {
    fn expr(&self, node: &AstNode) -> Result<PyExpr, CodeGenError> {
        Ok(match node {
            AstNode::LiteralBool { value } => PyExpr::Bool(*value),
            AstNode::LiteralInt { value } => PyExpr::Int(*value),
            AstNode::LiteralString { value } => PyExpr::Str(value.clone()),
            AstNode::FieldRef { name } => {
                let ident = self
                    .params
                    .get(name)
                    .ok_or_else(|| CodeGenError::UnboundField { field: name.clone() })?;
                PyExpr::Name(ident.clone())
            }
            AstNode::UnaryOp { op, operand } => {
                let operand = self.expr(operand)?;
                match op {
                    UnaryOp::Not => PyExpr::not(PyExpr::truthy(operand)),
                    UnaryOp::Neg => PyExpr::call("_rb_neg", vec![operand]),
                }
            }
            AstNode::BinaryOp { op, left, right } => {
                let l = self.expr(left)?;
                let r = self.expr(right)?;
                let helper = match op {
                    BinaryOp::And => {
                        return Ok(PyExpr::And(vec![PyExpr::truthy(l), PyExpr::truthy(r)]))
                    }
                    BinaryOp::Or => {
                        return Ok(PyExpr::Or(vec![PyExpr::truthy(l), PyExpr::truthy(r)]))
                    }
                    BinaryOp::Eq => "_rb_eq",
                    BinaryOp::Ne => "_rb_ne",
                    BinaryOp::Lt => "_rb_lt",
                    BinaryOp::Le => "_rb_le",
                    BinaryOp::Gt => "_rb_gt",
                    BinaryOp::Ge => "_rb_ge",
                    BinaryOp::Add => "_rb_add",
                    BinaryOp::Sub => "_rb_sub",
                    BinaryOp::Mul => "_rb_mul",
                    BinaryOp::Div => "_rb_div",
                };
                PyExpr::call(helper, vec![l, r])
            }
            AstNode::Concat { parts } => PyExpr::call("_rb_concat", self.exprs(parts)?),
            AstNode::FuncCall { name, args } => self.call(name, args)?,
        })
    }

    fn exprs(&self, nodes: &[AstNode]) -> Result<Vec<PyExpr>, CodeGenError> {
        nodes.iter().map(|n| self.expr(n)).collect()
    }

    fn call(&self, name: &str, args: &[AstNode]) -> Result<PyExpr, CodeGenError> {
        let expected = function_arity(name).ok_or_else(|| CodeGenError::UnsupportedFunction {
            name: name.to_string(),
        })?;
        if !expected.accepts(args.len()) {
            return Err(CodeGenError::ArityMismatch {
                function: name.to_string(),
                expected,
                got: args.len(),
            });
        }
        let mut args = self.exprs(args)?;
        Ok(match name {
            "TRUE" => PyExpr::Bool(true),
            "FALSE" => PyExpr::Bool(false),
            "BLANK" => PyExpr::None,
            "NOT" => PyExpr::not(PyExpr::truthy(args.remove(0))),
            "AND" => PyExpr::And(args.into_iter().map(PyExpr::truthy).collect()),
            "OR" => PyExpr::Or(args.into_iter().map(PyExpr::truthy).collect()),
            "IF" => {
                let orelse = args.remove(2);
                let body = args.remove(1);
                PyExpr::if_else(PyExpr::truthy(args.remove(0)), body, orelse)
            }
            "CONCATENATE" => PyExpr::call("_rb_concat", args),
            "LEN" => PyExpr::call("_rb_len", args),
            "LOWER" => PyExpr::call("_rb_lower", args),
            "UPPER" => PyExpr::call("_rb_upper", args),
            "TRIM" => PyExpr::call("_rb_trim", args),
            "FIND" => PyExpr::call("_rb_find", args),
            other => {
                return Err(CodeGenError::UnsupportedFunction {
                    name: other.to_string(),
                })
            }
        })
    }
}

/// Translate `ast` into a Python expression over `params` (field name to
/// identifier).
pub fn translate(ast: &AstNode, params: &BTreeMap<String, String>) -> Result<PyExpr, CodeGenError> {
    Translator { params }.expr(ast)
}

// ──────────────────────────────────────────────
// Functions
// ──────────────────────────────────────────────

/// Source of `calc_<entity>_<field>(<deps>)` for one calculated field.
///
/// Parameters follow `dependencies` (sorted field names) and are the
/// fields' snake_case identifiers. Output is byte-identical for equal
/// inputs. The docstring shows the formula as rendered from `ast`.
pub fn generate(
    entity_name: &str,
    field_name: &str,
    ast: &AstNode,
    dependencies: &BTreeSet<String>,
) -> Result<String, CodeGenError> {
    generate_with_formula(entity_name, field_name, &ast.to_string(), ast, dependencies)
}

/// [`generate`] with the formula text as written in the rulebook for the
/// docstring.
pub fn generate_with_formula(
    entity_name: &str,
    field_name: &str,
    formula: &str,
    ast: &AstNode,
    dependencies: &BTreeSet<String>,
) -> Result<String, CodeGenError> {
    let params = identifier_map(dependencies)?;
    let body = translate(ast, &params)?;
    let param_list: Vec<&str> = dependencies
        .iter()
        .filter_map(|d| params.get(d).map(String::as_str))
        .collect();
    Ok(format!(
        "def {}({}):\n    {}\n    return {}\n",
        function_name(entity_name, field_name),
        param_list.join(", "),
        docstring(&format!("Formula: {}", formula)),
        body
    ))
}

/// A function that raises `NotImplementedError`, emitted in place of a
/// field that could not be generated.
pub fn generate_stub(entity_name: &str, field_name: &str, formula: &str, reason: &str) -> String {
    let message = PyExpr::Str(format!("{}.{}: {}", entity_name, field_name, reason));
    format!(
        "def {}(*args):\n    {}\n    raise NotImplementedError({})\n",
        function_name(entity_name, field_name),
        docstring(&format!("Formula: {}", formula)),
        message
    )
}
