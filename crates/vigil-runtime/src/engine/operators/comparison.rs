//! Comparison operator execution

use crate::error::{Result, RuntimeError};
use std::cmp::Ordering;
use vigil_core::ast::Operator;
use vigil_core::Value;

/// Execute a comparison operation
///
/// Equality never fails: values of different types are simply unequal.
/// Ordering is only defined between two numbers, two strings or two
/// timestamps; anything else is a type error.
pub(crate) fn execute_compare(left: &Value, op: &Operator, right: &Value) -> Result<bool> {
    match op {
        Operator::Eq => Ok(values_equal(left, right)),
        Operator::Ne => Ok(!values_equal(left, right)),
        Operator::Gt => order(left, op, right).map(|ord| ord == Ordering::Greater),
        Operator::Ge => order(left, op, right).map(|ord| ord != Ordering::Less),
        Operator::Lt => order(left, op, right).map(|ord| ord == Ordering::Less),
        Operator::Le => order(left, op, right).map(|ord| ord != Ordering::Greater),
        _ => Err(RuntimeError::InvalidOperation(format!(
            "{:?} is not a comparison operator",
            op
        ))),
    }
}

/// Structural equality with numbers compared by value
pub(crate) fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Array(l), Value::Array(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(a, b)| values_equal(a, b))
        }
        (Value::Object(l), Value::Object(r)) => {
            l.len() == r.len()
                && l.iter()
                    .all(|(key, a)| r.get(key).is_some_and(|b| values_equal(a, b)))
        }
        _ => left == right,
    }
}

fn order(left: &Value, op: &Operator, right: &Value) -> Result<Ordering> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.partial_cmp(r).ok_or_else(|| {
            RuntimeError::TypeError(format!("cannot order NaN with '{}'", op))
        }),
        (Value::String(l), Value::String(r)) => Ok(l.cmp(r)),
        (Value::Timestamp(l), Value::Timestamp(r)) => Ok(l.cmp(r)),
        _ => Err(RuntimeError::TypeError(format!(
            "'{}' not supported between {} and {}",
            op,
            left.type_name(),
            right.type_name()
        ))),
    }
}
