//! Expression AST nodes

use super::operator::Operator;
use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Expression AST node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Literal value
    Literal(Value),

    /// Field access (e.g., `stats.finish_reason`, `stats['downloader/response_count']`)
    FieldAccess(Vec<String>),

    /// List literal (e.g., `['finished', 'shutdown']`)
    List(Vec<Expression>),

    /// Binary operation
    Binary {
        left: Box<Expression>,
        op: Operator,
        right: Box<Expression>,
    },

    /// Unary operation
    Unary {
        op: UnaryOperator,
        operand: Box<Expression>,
    },
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOperator {
    /// Logical NOT (`!` / `not`)
    Not,
    /// Arithmetic negation (-)
    Negate,
}

impl Expression {
    /// Create a literal expression
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(value.into())
    }

    /// Create a field access expression
    pub fn field_access(path: Vec<String>) -> Self {
        Expression::FieldAccess(path)
    }

    /// Create a binary expression
    pub fn binary(left: Expression, op: Operator, right: Expression) -> Self {
        Expression::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Create a unary expression
    pub fn unary(op: UnaryOperator, operand: Expression) -> Self {
        Expression::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// Every field path referenced by this expression, in source order
    pub fn field_paths(&self) -> Vec<&[String]> {
        let mut paths = Vec::new();
        self.collect_paths(&mut paths);
        paths
    }

    fn collect_paths<'a>(&'a self, out: &mut Vec<&'a [String]>) {
        match self {
            Expression::Literal(_) => {}
            Expression::FieldAccess(path) => out.push(path),
            Expression::List(items) => items.iter().for_each(|item| item.collect_paths(out)),
            Expression::Binary { left, right, .. } => {
                left.collect_paths(out);
                right.collect_paths(out);
            }
            Expression::Unary { operand, .. } => operand.collect_paths(out),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(Value::String(s)) => write!(f, "'{}'", s),
            Expression::Literal(value) => write!(f, "{}", value),
            Expression::FieldAccess(path) => {
                for (i, segment) in path.iter().enumerate() {
                    let plain = !segment.is_empty()
                        && segment.chars().all(|c| c.is_alphanumeric() || c == '_');
                    match (i, plain) {
                        (0, true) => write!(f, "{}", segment)?,
                        (_, true) => write!(f, ".{}", segment)?,
                        _ => write!(f, "['{}']", segment)?,
                    }
                }
                Ok(())
            }
            Expression::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Expression::Binary { left, op, right } => write!(f, "({} {} {})", left, op, right),
            Expression::Unary { op, operand } => match op {
                UnaryOperator::Not => write!(f, "not {}", operand),
                UnaryOperator::Negate => write!(f, "-{}", operand),
            },
        }
    }
}
