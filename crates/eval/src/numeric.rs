//! Integer arithmetic and ordering comparisons.
//!
//! All arithmetic is checked i64. `Null` operands are coerced rather than
//! propagated: `Null` is `0` for `+ - *` and for a dividend, and a `Null`
//! or zero divisor becomes `1`.

use std::cmp::Ordering;

use rulebook_core::BinaryOp;

use crate::error::EvalError;
use crate::value::Value;

fn as_int(op: &str, v: &Value) -> Result<i64, EvalError> {
    match v {
        Value::Int(n) => Ok(*n),
        Value::Null => Ok(0),
        other => Err(EvalError::type_mismatch(op, "Int", other.type_name())),
    }
}

/// Evaluate an arithmetic operator. Panics never; non-arithmetic `op` is a
/// caller bug reported as a type mismatch.
pub fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let symbol = op.symbol();
    let l = as_int(symbol, left)?;
    let r = as_int(symbol, right)?;
    let result = match op {
        BinaryOp::Add => l.checked_add(r),
        BinaryOp::Sub => l.checked_sub(r),
        BinaryOp::Mul => l.checked_mul(r),
        BinaryOp::Div => {
            let divisor = if r == 0 { 1 } else { r };
            // truncates toward zero; only i64::MIN / -1 overflows
            l.checked_div(divisor)
        }
        other => {
            return Err(EvalError::type_mismatch(
                other.symbol(),
                "arithmetic operator",
                "comparison or logical operator",
            ))
        }
    };
    result
        .map(Value::Int)
        .ok_or_else(|| EvalError::overflow(symbol))
}

/// Unary minus; `Null` negates to `0`.
pub fn negate(operand: &Value) -> Result<Value, EvalError> {
    let n = as_int("-", operand)?;
    n.checked_neg()
        .map(Value::Int)
        .ok_or_else(|| EvalError::overflow("-"))
}

/// Ordering comparison. Any `Null` operand yields `false`.
pub fn compare(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let ordering = match (left, right) {
        (Value::Null, _) | (_, Value::Null) => return Ok(Value::Bool(false)),
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        // str ordering on UTF-8 is code point order
        (Value::String(a), Value::String(b)) => a.as_str().cmp(b.as_str()),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (a, b) => {
            return Err(EvalError::type_mismatch(
                op.symbol(),
                a.type_name(),
                b.type_name(),
            ))
        }
    };
    let result = match op {
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::Le => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        BinaryOp::Ge => ordering != Ordering::Less,
        other => {
            return Err(EvalError::type_mismatch(
                other.symbol(),
                "ordering operator",
                "other operator",
            ))
        }
    };
    Ok(Value::Bool(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_is_zero_in_sums_and_products() {
        assert_eq!(arithmetic(BinaryOp::Add, &Value::Null, &Value::Int(4)), Ok(Value::Int(4)));
        assert_eq!(arithmetic(BinaryOp::Mul, &Value::Int(4), &Value::Null), Ok(Value::Int(0)));
        assert_eq!(arithmetic(BinaryOp::Sub, &Value::Null, &Value::Int(4)), Ok(Value::Int(-4)));
    }

    #[test]
    fn division_truncates_and_guards_divisor() {
        assert_eq!(arithmetic(BinaryOp::Div, &Value::Int(7), &Value::Int(2)), Ok(Value::Int(3)));
        assert_eq!(arithmetic(BinaryOp::Div, &Value::Int(-7), &Value::Int(2)), Ok(Value::Int(-3)));
        assert_eq!(arithmetic(BinaryOp::Div, &Value::Int(7), &Value::Int(0)), Ok(Value::Int(7)));
        assert_eq!(arithmetic(BinaryOp::Div, &Value::Int(7), &Value::Null), Ok(Value::Int(7)));
        assert_eq!(arithmetic(BinaryOp::Div, &Value::Null, &Value::Int(3)), Ok(Value::Int(0)));
    }

    #[test]
    fn overflow_is_an_error() {
        assert!(matches!(
            arithmetic(BinaryOp::Add, &Value::Int(i64::MAX), &Value::Int(1)),
            Err(EvalError::Overflow { .. })
        ));
        assert!(matches!(
            arithmetic(BinaryOp::Div, &Value::Int(i64::MIN), &Value::Int(-1)),
            Err(EvalError::Overflow { .. })
        ));
        assert!(matches!(negate(&Value::Int(i64::MIN)), Err(EvalError::Overflow { .. })));
    }

    #[test]
    fn non_integer_operands_are_rejected() {
        assert!(matches!(
            arithmetic(BinaryOp::Add, &Value::from("1"), &Value::Int(1)),
            Err(EvalError::TypeMismatch { .. })
        ));
        assert!(matches!(
            arithmetic(BinaryOp::Add, &Value::Bool(true), &Value::Int(1)),
            Err(EvalError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn comparisons() {
        assert_eq!(compare(BinaryOp::Gt, &Value::Int(2), &Value::Int(1)), Ok(Value::Bool(true)));
        assert_eq!(compare(BinaryOp::Le, &Value::Int(1), &Value::Int(1)), Ok(Value::Bool(true)));
        assert_eq!(
            compare(BinaryOp::Lt, &Value::from("B"), &Value::from("a")),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            compare(BinaryOp::Lt, &Value::Bool(false), &Value::Bool(true)),
            Ok(Value::Bool(true))
        );
    }

    #[test]
    fn null_comparisons_are_false() {
        for op in [BinaryOp::Lt, BinaryOp::Le, BinaryOp::Gt, BinaryOp::Ge] {
            assert_eq!(compare(op, &Value::Null, &Value::Int(1)), Ok(Value::Bool(false)));
            assert_eq!(compare(op, &Value::Null, &Value::Null), Ok(Value::Bool(false)));
        }
    }

    #[test]
    fn mixed_kinds_do_not_compare() {
        assert!(matches!(
            compare(BinaryOp::Lt, &Value::Int(1), &Value::from("1")),
            Err(EvalError::TypeMismatch { .. })
        ));
    }
}
