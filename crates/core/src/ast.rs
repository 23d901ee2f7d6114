//! Formula AST.
//!
//! Produced by the parser and consumed by every backend (dependency
//! extraction, reference evaluation, code generation, graph export).
//! The node set is closed: backends match exhaustively or implement
//! [`AstVisitor`], so a new variant fails to compile until each backend
//! handles it.

use std::fmt;

use serde::Serialize;

// ──────────────────────────────────────────────
// Operators
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UnaryOp {
    /// Prefix `NOT`
    Not,
    /// Prefix `-`
    Neg,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "NOT",
            UnaryOp::Neg => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOp {
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div
        )
    }
}

// ──────────────────────────────────────────────
// Nodes
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum AstNode {
    LiteralBool {
        value: bool,
    },
    LiteralInt {
        value: i64,
    },
    LiteralString {
        value: String,
    },
    FieldRef {
        name: String,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<AstNode>,
    },
    BinaryOp {
        op: BinaryOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },
    /// Flattened `a & b & c` chain, always two or more parts
    Concat {
        parts: Vec<AstNode>,
    },
    /// `NAME(args...)`; name is upper-cased
    FuncCall {
        name: String,
        args: Vec<AstNode>,
    },
}

impl AstNode {
    pub fn bool(value: bool) -> Self {
        AstNode::LiteralBool { value }
    }

    pub fn int(value: i64) -> Self {
        AstNode::LiteralInt { value }
    }

    pub fn string(value: impl Into<String>) -> Self {
        AstNode::LiteralString {
            value: value.into(),
        }
    }

    pub fn field(name: impl Into<String>) -> Self {
        AstNode::FieldRef { name: name.into() }
    }

    pub fn unary(op: UnaryOp, operand: AstNode) -> Self {
        AstNode::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOp, left: AstNode, right: AstNode) -> Self {
        AstNode::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn call(name: impl Into<String>, args: Vec<AstNode>) -> Self {
        AstNode::FuncCall {
            name: name.into(),
            args,
        }
    }

    /// Direct children in source order.
    pub fn children(&self) -> Vec<&AstNode> {
        match self {
            AstNode::LiteralBool { .. }
            | AstNode::LiteralInt { .. }
            | AstNode::LiteralString { .. }
            | AstNode::FieldRef { .. } => Vec::new(),
            AstNode::UnaryOp { operand, .. } => vec![operand],
            AstNode::BinaryOp { left, right, .. } => vec![left, right],
            AstNode::Concat { parts } => parts.iter().collect(),
            AstNode::FuncCall { args, .. } => args.iter().collect(),
        }
    }
}

/// Renders the node back to formula syntax, fully parenthesized.
impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstNode::LiteralBool { value } => {
                write!(f, "{}", if *value { "TRUE()" } else { "FALSE()" })
            }
            AstNode::LiteralInt { value } => write!(f, "{}", value),
            AstNode::LiteralString { value } => {
                write!(f, "'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
            }
            AstNode::FieldRef { name } => write!(f, "{{{{{}}}}}", name),
            AstNode::UnaryOp { op, operand } => match op {
                UnaryOp::Not => write!(f, "(NOT {})", operand),
                UnaryOp::Neg => write!(f, "(-{})", operand),
            },
            AstNode::BinaryOp { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            AstNode::Concat { parts } => {
                write!(f, "(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, " & ")?;
                    }
                    write!(f, "{}", part)?;
                }
                write!(f, ")")
            }
            AstNode::FuncCall { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

// ──────────────────────────────────────────────
// Visitor
// ──────────────────────────────────────────────

/// Bottom-up visitor: children are visited first and their outputs are
/// handed to the parent's method, so one method per variant is enough to
/// fold a whole tree.
pub trait AstVisitor {
    type Output;

    fn literal_bool(&mut self, value: bool) -> Self::Output;
    fn literal_int(&mut self, value: i64) -> Self::Output;
    fn literal_string(&mut self, value: &str) -> Self::Output;
    fn field_ref(&mut self, name: &str) -> Self::Output;
    fn unary_op(&mut self, op: UnaryOp, operand: Self::Output) -> Self::Output;
    fn binary_op(&mut self, op: BinaryOp, left: Self::Output, right: Self::Output)
        -> Self::Output;
    fn concat(&mut self, parts: Vec<Self::Output>) -> Self::Output;
    fn func_call(&mut self, name: &str, args: Vec<Self::Output>) -> Self::Output;
}

/// Drive `visitor` over `node` in post-order (left to right).
pub fn walk<V: AstVisitor + ?Sized>(visitor: &mut V, node: &AstNode) -> V::Output {
    match node {
        AstNode::LiteralBool { value } => visitor.literal_bool(*value),
        AstNode::LiteralInt { value } => visitor.literal_int(*value),
        AstNode::LiteralString { value } => visitor.literal_string(value),
        AstNode::FieldRef { name } => visitor.field_ref(name),
        AstNode::UnaryOp { op, operand } => {
            let operand = walk(visitor, operand);
            visitor.unary_op(*op, operand)
        }
        AstNode::BinaryOp { op, left, right } => {
            let left = walk(visitor, left);
            let right = walk(visitor, right);
            visitor.binary_op(*op, left, right)
        }
        AstNode::Concat { parts } => {
            let parts = parts.iter().map(|p| walk(visitor, p)).collect();
            visitor.concat(parts)
        }
        AstNode::FuncCall { name, args } => {
            let args = args.iter().map(|a| walk(visitor, a)).collect();
            visitor.func_call(name, args)
        }
    }
}
