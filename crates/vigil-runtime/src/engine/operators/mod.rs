//! Operator execution modules
//!
//! This module contains the implementation of operator evaluation for the expression evaluator.

mod binary;
mod comparison;
mod unary;

pub(crate) use binary::execute_binary_op;
pub(crate) use comparison::{execute_compare, values_equal};
pub(crate) use unary::execute_unary_op;
