//! Runtime values.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

// ──────────────────────────────────────────────
// Runtime values
// ──────────────────────────────────────────────

/// A field value. `Null` is the explicit "absent/unknown" value of the
/// three-valued logic and is distinct from `Bool(false)` and `""`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    String(String),
    #[default]
    Null,
}

/// Field name to value. A missing key reads as [`Value::Null`].
pub type Record = BTreeMap<String, Value>;

impl Value {
    /// Human-readable type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::String(_) => "String",
            Value::Null => "Null",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The identity rule: only `Bool(true)` counts as true. `Null`, strings
    /// and integers are all "not true".
    pub fn is_true(&self) -> bool {
        matches!(self, Value::Bool(true))
    }

    /// Text form used by concatenation and the string functions.
    pub fn to_text(&self) -> String {
        match self {
            Value::Bool(true) => "TRUE".to_string(),
            Value::Bool(false) => "FALSE".to_string(),
            Value::Int(n) => n.to_string(),
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(n) => serde_json::Value::from(*n),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Null => serde_json::Value::Null,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            Value::Null => f.write_str("NULL"),
            other => f.write_str(&other.to_text()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_bool_true_is_true() {
        assert!(Value::Bool(true).is_true());
        assert!(!Value::Bool(false).is_true());
        assert!(!Value::Null.is_true());
        assert!(!Value::Int(1).is_true());
        assert!(!Value::from("TRUE").is_true());
    }

    #[test]
    fn text_forms() {
        assert_eq!(Value::Null.to_text(), "");
        assert_eq!(Value::Bool(false).to_text(), "FALSE");
        assert_eq!(Value::Int(-12).to_text(), "-12");
    }

    #[test]
    fn serializes_as_plain_json() {
        let record = Record::from([
            ("a".to_string(), Value::Null),
            ("b".to_string(), Value::Int(3)),
            ("c".to_string(), Value::from("x")),
        ]);
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            serde_json::json!({"a": null, "b": 3, "c": "x"})
        );
        assert_eq!(Value::Bool(true).to_json(), serde_json::json!(true));
    }
}
