//! Expression evaluator
//!
//! Walks an expression AST against a fact snapshot. Field paths whose first
//! segment is `stats` or `facts` address the snapshot itself, any other first
//! segment is a fact key: `stats.finish_reason` and `finish_reason` are the
//! same lookup. Lookups are strict, an absent key is `KeyNotFound`.

use super::operators::{execute_binary_op, execute_compare, execute_unary_op};
use crate::error::{Result, RuntimeError};
use vigil_core::ast::{Expression, Operator};
use vigil_core::{FactContext, Value};

/// Names that refer to the whole fact snapshot
const NAMESPACE_ROOTS: [&str; 2] = ["stats", "facts"];

/// Expression evaluator
pub struct ExpressionEvaluator;

impl ExpressionEvaluator {
    /// Evaluate an expression to a value
    pub fn evaluate(expr: &Expression, facts: &FactContext) -> Result<Value> {
        match expr {
            Expression::Literal(value) => Ok(value.clone()),

            Expression::FieldAccess(path) => Self::resolve(path, facts),

            Expression::List(items) => items
                .iter()
                .map(|item| Self::evaluate(item, facts))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),

            Expression::Binary { left, op, right } => match op {
                // Logical operators short-circuit
                Operator::And => {
                    if !Self::evaluate(left, facts)?.is_truthy() {
                        return Ok(Value::Bool(false));
                    }
                    Ok(Value::Bool(Self::evaluate(right, facts)?.is_truthy()))
                }
                Operator::Or => {
                    if Self::evaluate(left, facts)?.is_truthy() {
                        return Ok(Value::Bool(true));
                    }
                    Ok(Value::Bool(Self::evaluate(right, facts)?.is_truthy()))
                }
                op if op.is_comparison() => {
                    let l = Self::evaluate(left, facts)?;
                    let r = Self::evaluate(right, facts)?;
                    execute_compare(&l, op, &r).map(Value::Bool)
                }
                op => {
                    let l = Self::evaluate(left, facts)?;
                    let r = Self::evaluate(right, facts)?;
                    execute_binary_op(&l, op, &r)
                }
            },

            Expression::Unary { op, operand } => {
                let value = Self::evaluate(operand, facts)?;
                execute_unary_op(&value, op)
            }
        }
    }

    /// Evaluate an expression to its truthiness
    pub fn evaluate_bool(expr: &Expression, facts: &FactContext) -> Result<bool> {
        Ok(Self::evaluate(expr, facts)?.is_truthy())
    }

    fn resolve(path: &[String], facts: &FactContext) -> Result<Value> {
        let first = path
            .first()
            .ok_or_else(|| RuntimeError::InvalidOperation("empty field path".to_string()))?;

        let path = if NAMESPACE_ROOTS.contains(&first.as_str()) {
            &path[1..]
        } else {
            path
        };
        if path.is_empty() {
            return Ok(facts.to_value());
        }

        Ok(facts.lookup(path)?.clone())
    }
}
