//! Builtin functions with eagerly evaluated arguments.
//!
//! `IF`, `AND` and `OR` evaluate their arguments lazily and live in the
//! evaluator; everything else is dispatched here once all arguments
//! have values.

use rulebook_core::function_arity;

use crate::error::EvalError;
use crate::value::Value;

pub(crate) fn check_arity(name: &str, got: usize) -> Result<(), EvalError> {
    match function_arity(name) {
        None => Err(EvalError::UnknownFunction {
            name: name.to_string(),
        }),
        Some(expected) if !expected.accepts(got) => Err(EvalError::ArityMismatch {
            function: name.to_string(),
            expected,
            got,
        }),
        Some(_) => Ok(()),
    }
}

/// Concatenation of already evaluated parts.
pub fn concat(parts: &[Value]) -> Value {
    Value::String(parts.iter().map(Value::to_text).collect())
}

/// 1-based character position of `needle` in `haystack`, 0 when absent.
fn find(needle: &Value, haystack: &Value) -> Value {
    if needle.is_null() || haystack.is_null() {
        return Value::Int(0);
    }
    let needle = needle.to_text();
    let haystack = haystack.to_text();
    let position = haystack
        .find(&needle)
        .map(|byte| haystack[..byte].chars().count() as i64 + 1)
        .unwrap_or(0);
    Value::Int(position)
}

/// Call a builtin by its upper-cased name. `IF`, `AND` and `OR` are not
/// callable here; they only exist over unevaluated arguments.
pub fn call_builtin(name: &str, args: &[Value]) -> Result<Value, EvalError> {
    check_arity(name, args.len())?;
    let value = match (name, args) {
        ("TRUE", _) => Value::Bool(true),
        ("FALSE", _) => Value::Bool(false),
        ("BLANK", _) => Value::Null,
        ("NOT", [x]) => Value::Bool(!x.is_true()),
        ("CONCATENATE", parts) => concat(parts),
        ("LEN", [s]) => Value::Int(s.to_text().chars().count() as i64),
        ("LOWER", [s]) => Value::String(s.to_text().to_lowercase()),
        ("UPPER", [s]) => Value::String(s.to_text().to_uppercase()),
        ("TRIM", [s]) => Value::String(s.to_text().trim_matches(' ').to_string()),
        ("FIND", [needle, haystack]) => find(needle, haystack),
        _ => {
            return Err(EvalError::UnknownFunction {
                name: name.to_string(),
            })
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_functions_coerce_their_argument() {
        assert_eq!(call_builtin("LEN", &[Value::Null]), Ok(Value::Int(0)));
        assert_eq!(call_builtin("LEN", &[Value::from("héllo")]), Ok(Value::Int(5)));
        assert_eq!(call_builtin("UPPER", &[Value::Bool(true)]), Ok(Value::from("TRUE")));
        assert_eq!(call_builtin("LOWER", &[Value::from("AbC")]), Ok(Value::from("abc")));
        assert_eq!(call_builtin("TRIM", &[Value::from("  a b  ")]), Ok(Value::from("a b")));
    }

    #[test]
    fn find_is_one_based() {
        let find = |n: &str, h: &str| call_builtin("FIND", &[Value::from(n), Value::from(h)]);
        assert_eq!(find("lang", "natural language"), Ok(Value::Int(9)));
        assert_eq!(find("x", "abc"), Ok(Value::Int(0)));
        assert_eq!(find("c", "äbc"), Ok(Value::Int(3)));
        assert_eq!(
            call_builtin("FIND", &[Value::from("a"), Value::Null]),
            Ok(Value::Int(0))
        );
    }

    #[test]
    fn concatenate_uses_concat_rules() {
        assert_eq!(
            call_builtin(
                "CONCATENATE",
                &[Value::from("n="), Value::Int(3), Value::Null, Value::Bool(false)]
            ),
            Ok(Value::from("n=3FALSE"))
        );
    }

    #[test]
    fn unknown_and_wrong_arity() {
        assert_eq!(
            call_builtin("VLOOKUP", &[]),
            Err(EvalError::UnknownFunction {
                name: "VLOOKUP".into()
            })
        );
        assert!(matches!(
            call_builtin("LEN", &[]),
            Err(EvalError::ArityMismatch { got: 0, .. })
        ));
    }

    #[test]
    fn lazy_functions_are_not_dispatched_eagerly() {
        for (name, args) in [
            ("IF", vec![Value::Bool(true), Value::Int(1), Value::Int(2)]),
            ("AND", vec![Value::Bool(true)]),
            ("OR", vec![Value::Bool(true)]),
        ] {
            assert_eq!(
                call_builtin(name, &args),
                Err(EvalError::UnknownFunction { name: name.into() })
            );
        }
    }

    #[test]
    fn blank_is_null() {
        assert_eq!(call_builtin("BLANK", &[]), Ok(Value::Null));
    }
}
