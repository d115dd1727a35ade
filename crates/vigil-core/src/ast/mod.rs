//! Abstract Syntax Tree (AST) for the restricted rule expression language
//!
//! Expressions only reach facts, literals and operators. There are no
//! function calls and no assignment.

pub mod expression;
pub mod operator;

pub use expression::{Expression, UnaryOperator};
pub use operator::Operator;
