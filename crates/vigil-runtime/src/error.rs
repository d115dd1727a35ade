//! Runtime error types

use thiserror::Error;
use vigil_core::CoreError;
use vigil_parser::ParseError;

/// Expression evaluation error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// Strict lookup of an absent fact
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// Type error
    #[error("Type error: {0}")]
    TypeError(String),

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Division by zero
    #[error("Division by zero")]
    DivisionByZero,

    #[error("Invalid regex '{pattern}': {message}")]
    InvalidRegex { pattern: String, message: String },
}

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

impl From<CoreError> for RuntimeError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::KeyNotFound(key) => RuntimeError::KeyNotFound(key),
            CoreError::TypeError(message) => RuntimeError::TypeError(message),
            other => RuntimeError::InvalidOperation(other.to_string()),
        }
    }
}

/// Adaptation-time error
///
/// Raised while building monitors and suites, before any run starts.
#[derive(Error, Debug)]
pub enum AdaptError {
    #[error("Unsupported rule type: {0}")]
    UnsupportedRuleType(String),

    #[error("Unsupported action type: {0}")]
    UnsupportedActionType(String),

    #[error("Invalid expression '{expression}': {message}")]
    InvalidExpression { expression: String, message: String },

    #[error("Invalid severity level: {0}")]
    InvalidSeverity(String),

    #[error("Invalid action trigger: {0}")]
    InvalidTrigger(String),

    #[error("Check group '{0}' has no checks")]
    EmptyGroup(String),

    #[error(transparent)]
    Parse(#[from] ParseError),
}
