//! Vigil Core - Core types and definitions for the vigil monitor engine
//!
//! This crate provides the fundamental types shared by every vigil crate:
//! - Value types for facts and expression results
//! - The read-only fact snapshot rules are evaluated against
//! - Severity and trigger levels attached to rules and actions
//! - The restricted expression AST used by textual rules
//! - The settings lookup capability consulted by domain monitors
//! - Error types

pub mod ast;
pub mod error;
pub mod facts;
pub mod level;
pub mod settings;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use facts::FactContext;
pub use level::{Severity, Trigger};
pub use settings::{Settings, SettingsLookup};
pub use types::Value;
