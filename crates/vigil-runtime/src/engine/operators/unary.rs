//! Unary operator execution

use crate::error::{Result, RuntimeError};
use vigil_core::ast::UnaryOperator;
use vigil_core::Value;

/// Execute a unary operation
pub(crate) fn execute_unary_op(operand: &Value, op: &UnaryOperator) -> Result<Value> {
    match (op, operand) {
        (UnaryOperator::Not, value) => Ok(Value::Bool(!value.is_truthy())),
        (UnaryOperator::Negate, Value::Number(n)) => Ok(Value::Number(-n)),
        _ => Err(RuntimeError::TypeError(format!(
            "bad operand type for unary -: {}",
            operand.type_name()
        ))),
    }
}
