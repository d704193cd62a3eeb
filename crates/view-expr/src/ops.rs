//! Operator semantics.

use crate::error::{EvalError, EvalResult};
use crate::parser::BinaryOp;
use crate::value::{Number, Value};
use std::cmp::Ordering;

/// Loose (`==`) equality.
pub fn loose_equals(a: &Value, b: &Value) -> bool {
    use Value::*;

    match (a, b) {
        (Null, Null) => true,
        (Bool(x), other) | (other, Bool(x)) => *x == other.is_truthy(),
        (Null, String(s)) | (String(s), Null) | (Null, Html(s)) | (Html(s), Null) => s.is_empty(),
        (Null, other) | (other, Null) => !other.is_truthy(),
        (List(x), List(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| loose_equals(l, r))
        }
        (Map(x), Map(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| loose_equals(v, w)))
        }
        (List(_) | Map(_), _) | (_, List(_) | Map(_)) => false,
        _ if a.is_numeric() && b.is_numeric() => compare(a, b) == Ordering::Equal,
        _ => a.to_string() == b.to_string(),
    }
}

/// Strict (`===`) equality: same type and same value.
pub fn strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(x) | Value::Html(x), Value::String(y) | Value::Html(y)) => x == y,
        _ => a == b,
    }
}

/// Ordering used by `<`, `<=`, `>` and `>=`.
///
/// Values that both have a numeric reading compare as numbers; everything
/// else compares by display string.
pub fn compare(a: &Value, b: &Value) -> Ordering {
    match (a.as_number(), b.as_number()) {
        (Some(Number::Int(x)), Some(Number::Int(y))) => x.cmp(&y),
        (Some(x), Some(y)) => x.as_f64().partial_cmp(&y.as_f64()).unwrap_or(Ordering::Equal),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// Apply an arithmetic operator.
pub fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> EvalResult<Value> {
    let (Some(l), Some(r)) = (left.as_number(), right.as_number()) else {
        return Err(EvalError::Type(format!(
            "Unsupported operand types: {} {} {}",
            left.type_name(),
            op.symbol(),
            right.type_name()
        )));
    };

    let value = match (op, l, r) {
        (BinaryOp::Modulo, l, r) => {
            let divisor = r.as_f64() as i64;
            if divisor == 0 {
                return Err(EvalError::DivisionByZero);
            }
            Value::Int((l.as_f64() as i64).checked_rem(divisor).unwrap_or(0))
        }
        (BinaryOp::Divide, _, r) if r.as_f64() == 0.0 => return Err(EvalError::DivisionByZero),
        (BinaryOp::Divide, Number::Int(a), Number::Int(b)) if a.checked_rem(b) == Some(0) => {
            a.checked_div(b).map_or(Value::Float(a as f64 / b as f64), Value::Int)
        }
        (BinaryOp::Add, Number::Int(a), Number::Int(b)) => int_or_float(a.checked_add(b), a as f64 + b as f64),
        (BinaryOp::Subtract, Number::Int(a), Number::Int(b)) => {
            int_or_float(a.checked_sub(b), a as f64 - b as f64)
        }
        (BinaryOp::Multiply, Number::Int(a), Number::Int(b)) => {
            int_or_float(a.checked_mul(b), a as f64 * b as f64)
        }
        (op, l, r) => {
            let (a, b) = (l.as_f64(), r.as_f64());
            Value::Float(match op {
                BinaryOp::Add => a + b,
                BinaryOp::Subtract => a - b,
                BinaryOp::Multiply => a * b,
                _ => a / b,
            })
        }
    };
    Ok(value)
}

/// Negate a value (`-x`).
pub fn negate(value: &Value) -> EvalResult<Value> {
    match value.as_number() {
        Some(Number::Int(i)) => Ok(i.checked_neg().map_or(Value::Float(-(i as f64)), Value::Int)),
        Some(Number::Float(f)) => Ok(Value::Float(-f)),
        None => Err(EvalError::Type(format!(
            "Unsupported operand types: -{}",
            value.type_name()
        ))),
    }
}

fn int_or_float(checked: Option<i64>, fallback: f64) -> Value {
    checked.map_or(Value::Float(fallback), Value::Int)
}
