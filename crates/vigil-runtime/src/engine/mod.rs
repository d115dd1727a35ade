//! Expression evaluation engine
//!
//! Evaluates restricted rule expressions against a fact snapshot.

pub mod evaluator;
mod operators;

pub use evaluator::ExpressionEvaluator;
