//! Binary operator execution

use super::comparison::values_equal;
use crate::error::{Result, RuntimeError};
use vigil_core::ast::Operator;
use vigil_core::Value;

/// Execute a non-logical, non-comparison binary operation
pub(crate) fn execute_binary_op(left: &Value, op: &Operator, right: &Value) -> Result<Value> {
    match (left, op, right) {
        // Arithmetic operations
        (Value::Number(l), Operator::Add, Value::Number(r)) => Ok(Value::Number(l + r)),
        (Value::Number(l), Operator::Sub, Value::Number(r)) => Ok(Value::Number(l - r)),
        (Value::Number(l), Operator::Mul, Value::Number(r)) => Ok(Value::Number(l * r)),
        (Value::Number(l), Operator::Div, Value::Number(r)) => {
            if *r == 0.0 {
                Err(RuntimeError::DivisionByZero)
            } else {
                Ok(Value::Number(l / r))
            }
        }
        (Value::Number(l), Operator::Mod, Value::Number(r)) => {
            if *r == 0.0 {
                Err(RuntimeError::DivisionByZero)
            } else {
                // Result takes the sign of the divisor
                Ok(Value::Number(l - r * (l / r).floor()))
            }
        }

        // Concatenation
        (Value::String(l), Operator::Add, Value::String(r)) => Ok(Value::String(format!("{}{}", l, r))),
        (Value::Array(l), Operator::Add, Value::Array(r)) => {
            Ok(Value::Array(l.iter().chain(r).cloned().collect()))
        }

        // String operations
        (Value::String(l), Operator::StartsWith, Value::String(r)) => {
            Ok(Value::Bool(l.starts_with(r.as_str())))
        }
        (Value::String(l), Operator::EndsWith, Value::String(r)) => {
            Ok(Value::Bool(l.ends_with(r.as_str())))
        }
        (Value::String(l), Operator::Regex, Value::String(pattern)) => {
            let re = regex::Regex::new(pattern).map_err(|e| RuntimeError::InvalidRegex {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
            Ok(Value::Bool(re.is_match(l)))
        }

        // Membership operations
        (container, Operator::Contains, item) => membership(container, item).map(Value::Bool),
        (item, Operator::In, container) => membership(container, item).map(Value::Bool),
        (item, Operator::NotIn, container) => membership(container, item).map(|found| Value::Bool(!found)),

        _ => Err(RuntimeError::TypeError(format!(
            "unsupported operand types for '{}': {} and {}",
            op,
            left.type_name(),
            right.type_name()
        ))),
    }
}

/// Whether `item` is in `container`: array element, substring or object key
fn membership(container: &Value, item: &Value) -> Result<bool> {
    match (container, item) {
        (Value::Array(items), _) => Ok(items.iter().any(|v| values_equal(v, item))),
        (Value::String(s), Value::String(sub)) => Ok(s.contains(sub.as_str())),
        (Value::Object(map), Value::String(key)) => Ok(map.contains_key(key)),
        (Value::String(_) | Value::Object(_), _) => Err(RuntimeError::TypeError(format!(
            "cannot look for {} in {}",
            item.type_name(),
            container.type_name()
        ))),
        _ => Err(RuntimeError::TypeError(format!(
            "argument of type {} is not a container",
            container.type_name()
        ))),
    }
}
