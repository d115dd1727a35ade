//! Vigil Parser - text to AST parsing for the vigil monitor engine
//!
//! This crate turns source text into the structures the runtime adapts:
//! - Restricted rule expressions into `vigil_core::ast::Expression`
//! - YAML/JSON suite and monitor documents into definition values

pub mod definition;
pub mod definition_parser;
pub mod error;
pub mod expression_parser;

// Re-export main parser types
pub use definition::{
    ActionDefinition, Definition, MonitorDefinition, RuleDefinition, SuiteDefinition,
};
pub use definition_parser::DefinitionParser;
pub use error::{ParseError, Result};
pub use expression_parser::ExpressionParser;
