//! A small Python expression tree.
//!
//! Generated code is assembled from these nodes and rendered in one place,
//! so quoting, escaping and parenthesization are never done by ad hoc
//! string concatenation. Every compound expression renders parenthesized.

use std::fmt::{self, Write as _};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PyExpr {
    None,
    Bool(bool),
    Int(i64),
    Str(String),
    /// An identifier that is already valid Python.
    Name(String),
    Call { func: String, args: Vec<PyExpr> },
    /// `(value is True)`
    IsTrue(Box<PyExpr>),
    /// `(a and b and ...)` over already-boolean operands.
    And(Vec<PyExpr>),
    /// `(a or b or ...)` over already-boolean operands.
    Or(Vec<PyExpr>),
    /// `(not value)`
    Not(Box<PyExpr>),
    /// `(body if test else orelse)`
    IfElse {
        test: Box<PyExpr>,
        body: Box<PyExpr>,
        orelse: Box<PyExpr>,
    },
}

impl PyExpr {
    pub fn call(func: impl Into<String>, args: Vec<PyExpr>) -> Self {
        PyExpr::Call {
            func: func.into(),
            args,
        }
    }

    pub fn is_true(value: PyExpr) -> Self {
        PyExpr::IsTrue(Box::new(value))
    }

    /// `value` as a Python bool that is `True` only for `True`. Operands
    /// that already render a bool are left as they are.
    pub fn truthy(value: PyExpr) -> Self {
        let boolean = matches!(
            value,
            PyExpr::Bool(_) | PyExpr::IsTrue(_) | PyExpr::Not(_) | PyExpr::And(_) | PyExpr::Or(_)
        );
        if boolean {
            value
        } else {
            PyExpr::is_true(value)
        }
    }

    pub fn not(value: PyExpr) -> Self {
        PyExpr::Not(Box::new(value))
    }

    pub fn if_else(test: PyExpr, body: PyExpr, orelse: PyExpr) -> Self {
        PyExpr::IfElse {
            test: Box::new(test),
            body: Box::new(body),
            orelse: Box::new(orelse),
        }
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[PyExpr], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for PyExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PyExpr::None => f.write_str("None"),
            PyExpr::Bool(true) => f.write_str("True"),
            PyExpr::Bool(false) => f.write_str("False"),
            PyExpr::Int(n) if *n < 0 => write!(f, "({})", n),
            PyExpr::Int(n) => write!(f, "{}", n),
            PyExpr::Str(s) => f.write_str(&string_literal(s)),
            PyExpr::Name(name) => f.write_str(name),
            PyExpr::Call { func, args } => {
                write!(f, "{}(", func)?;
                write_joined(f, args, ", ")?;
                f.write_str(")")
            }
            PyExpr::IsTrue(v) => write!(f, "({} is True)", v),
            PyExpr::And(values) => {
                f.write_str("(")?;
                write_joined(f, values, " and ")?;
                f.write_str(")")
            }
            PyExpr::Or(values) => {
                f.write_str("(")?;
                write_joined(f, values, " or ")?;
                f.write_str(")")
            }
            PyExpr::Not(v) => write!(f, "(not {})", v),
            PyExpr::IfElse { test, body, orelse } => {
                write!(f, "({} if {} else {})", body, test, orelse)
            }
        }
    }
}

/// Single-quoted Python string literal. Backslashes, quotes and control
/// characters are escaped; other characters are written as is.
pub fn string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\x7f' => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            // line and paragraph separators end a line in Python source
            '\u{2028}' | '\u{2029}' => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Body of a triple-double-quoted docstring holding `text` verbatim.
pub fn docstring(text: &str) -> String {
    let mut body = text.replace('\\', "\\\\").replace("\"\"\"", "\\\"\\\"\\\"");
    if body.ends_with('"') {
        body.push(' ');
    }
    format!("\"\"\"{}\"\"\"", body)
}
