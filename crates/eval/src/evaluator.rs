//! Reference evaluator.
//!
//! Evaluates an [`AstNode`] against a [`Record`] under the rulebook's
//! three-valued semantics. `AND`, `OR` and `IF` are lazy: arguments are
//! evaluated left to right and only as far as needed, so an error in an
//! untaken branch is never raised.

use rulebook_core::{AstNode, BinaryOp, UnaryOp};

use crate::error::EvalError;
use crate::functions::{call_builtin, check_arity, concat};
use crate::numeric;
use crate::value::{Record, Value};

/// Evaluate `ast` against `record`. Deterministic; missing fields read as
/// [`Value::Null`].
pub fn evaluate(ast: &AstNode, record: &Record) -> Result<Value, EvalError> {
    match ast {
        AstNode::LiteralBool { value } => Ok(Value::Bool(*value)),
        AstNode::LiteralInt { value } => Ok(Value::Int(*value)),
        AstNode::LiteralString { value } => Ok(Value::String(value.clone())),
        AstNode::FieldRef { name } => Ok(record.get(name).cloned().unwrap_or(Value::Null)),

        AstNode::UnaryOp { op, operand } => {
            let v = evaluate(operand, record)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!v.is_true())),
                UnaryOp::Neg => numeric::negate(&v),
            }
        }

        AstNode::BinaryOp { op, left, right } => match op {
            BinaryOp::And => {
                if !evaluate(left, record)?.is_true() {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(evaluate(right, record)?.is_true()))
            }
            BinaryOp::Or => {
                if evaluate(left, record)?.is_true() {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(evaluate(right, record)?.is_true()))
            }
            _ => {
                let l = evaluate(left, record)?;
                let r = evaluate(right, record)?;
                apply_binary(*op, &l, &r)
            }
        },

        AstNode::Concat { parts } => {
            let values = parts
                .iter()
                .map(|p| evaluate(p, record))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(concat(&values))
        }

        AstNode::FuncCall { name, args } => eval_call(name, args, record),
    }
}

/// Apply a strict (non short-circuit) binary operator to evaluated operands.
pub fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match op {
        // strict equality: Null = Null, different kinds are unequal
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::Ne => Ok(Value::Bool(left != right)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            numeric::compare(op, left, right)
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            numeric::arithmetic(op, left, right)
        }
        BinaryOp::And => Ok(Value::Bool(left.is_true() && right.is_true())),
        BinaryOp::Or => Ok(Value::Bool(left.is_true() || right.is_true())),
    }
}

fn eval_call(name: &str, args: &[AstNode], record: &Record) -> Result<Value, EvalError> {
    match name {
        "IF" => {
            check_arity(name, args.len())?;
            let branch = if evaluate(&args[0], record)?.is_true() {
                &args[1]
            } else {
                &args[2]
            };
            evaluate(branch, record)
        }
        "AND" => {
            check_arity(name, args.len())?;
            for arg in args {
                if !evaluate(arg, record)?.is_true() {
                    return Ok(Value::Bool(false));
                }
            }
            Ok(Value::Bool(true))
        }
        "OR" => {
            check_arity(name, args.len())?;
            for arg in args {
                if evaluate(arg, record)?.is_true() {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        _ => {
            // reject unknown names before evaluating any argument
            check_arity(name, args.len())?;
            let values = args
                .iter()
                .map(|a| evaluate(a, record))
                .collect::<Result<Vec<_>, _>>()?;
            call_builtin(name, &values)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulebook_core::parse_formula;

    fn eval(src: &str, record: &[(&str, Value)]) -> Result<Value, EvalError> {
        let ast = parse_formula(src).unwrap_or_else(|e| panic!("{}: {}", src, e));
        let record: Record = record
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        evaluate(&ast, &record)
    }

    fn ok(src: &str, record: &[(&str, Value)]) -> Value {
        eval(src, record).unwrap_or_else(|e| panic!("{}: {}", src, e))
    }

    #[test]
    fn literals_and_missing_fields() {
        assert_eq!(ok("42", &[]), Value::Int(42));
        assert_eq!(ok("'it\\'s'", &[]), Value::from("it's"));
        assert_eq!(ok("{{Absent}}", &[]), Value::Null);
    }

    #[test]
    fn equality_is_strict() {
        assert_eq!(ok("{{A}} = {{B}}", &[]), Value::Bool(true));
        assert_eq!(ok("{{A}} = 0", &[("A", Value::Null)]), Value::Bool(false));
        assert_eq!(ok("{{A}} = ''", &[]), Value::Bool(false));
        assert_eq!(ok("1 = '1'", &[]), Value::Bool(false));
        assert_eq!(ok("1 <> '1'", &[]), Value::Bool(true));
        assert_eq!(ok("{{A}} <> {{B}}", &[]), Value::Bool(false));
    }

    #[test]
    fn not_follows_the_identity_rule() {
        assert_eq!(ok("NOT({{X}})", &[]), Value::Bool(true));
        assert_eq!(ok("NOT {{X}}", &[("X", Value::Bool(true))]), Value::Bool(false));
        assert_eq!(ok("NOT('yes')", &[]), Value::Bool(true));
    }

    #[test]
    fn and_or_return_bool_and_short_circuit() {
        assert_eq!(ok("AND(TRUE, {{N}})", &[]), Value::Bool(false));
        assert_eq!(ok("OR({{N}}, TRUE)", &[]), Value::Bool(true));
        assert_eq!(ok("1 AND TRUE", &[]), Value::Bool(false));
        // the untaken operand would be a type error
        assert_eq!(ok("FALSE AND 'a' < 1", &[]), Value::Bool(false));
        assert_eq!(ok("OR(TRUE, 'a' < 1)", &[]), Value::Bool(true));
        assert!(eval("AND(TRUE, 'a' < 1)", &[]).is_err());
    }

    #[test]
    fn if_evaluates_only_the_chosen_branch() {
        assert_eq!(ok("IF(TRUE, 1, 'a' < 1)", &[]), Value::Int(1));
        assert_eq!(ok("IF({{C}}, 1, 2)", &[]), Value::Int(2));
        assert_eq!(ok("IF(1, 'then', 'else')", &[]), Value::from("else"));
        assert_eq!(ok("IF(TRUE, BLANK(), 2)", &[]), Value::Null);
    }

    #[test]
    fn concatenation_coerces() {
        assert_eq!(
            ok(
                "{{A}} & '|' & {{B}} & '|' & {{C}}",
                &[("B", Value::Bool(true)), ("C", Value::Int(-3))]
            ),
            Value::from("|TRUE|-3")
        );
    }

    #[test]
    fn arithmetic_through_the_tree() {
        assert_eq!(ok("1 + 2 * 3", &[]), Value::Int(7));
        assert_eq!(ok("-{{A}} + 5", &[]), Value::Int(5));
        assert_eq!(ok("{{A}} / {{B}}", &[("A", Value::Int(9))]), Value::Int(9));
        assert!(matches!(
            eval("{{A}} * 2", &[("A", Value::Int(i64::MAX))]),
            Err(EvalError::Overflow { .. })
        ));
    }

    #[test]
    fn unknown_function_is_reported() {
        assert_eq!(
            eval("SQRT(4)", &[]),
            Err(EvalError::UnknownFunction { name: "SQRT".into() })
        );
    }

    #[test]
    fn evaluation_is_deterministic() {
        let ast = parse_formula("IF({{A}} > 1, {{N}} & '!', LEN({{N}}))").unwrap();
        let record = Record::from([
            ("A".to_string(), Value::Int(2)),
            ("N".to_string(), Value::from("x")),
        ]);
        let first = evaluate(&ast, &record);
        for _ in 0..10 {
            assert_eq!(evaluate(&ast, &record), first);
        }
    }
}
