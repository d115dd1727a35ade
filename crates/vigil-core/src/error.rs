//! Error types for Vigil Core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Strict fact or path lookup of an absent key
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Type error: {0}")]
    TypeError(String),

    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("Invalid level: {0}")]
    InvalidLevel(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_not_found_message() {
        let err = CoreError::KeyNotFound("finish_reason".to_string());
        assert_eq!(err.to_string(), "Key not found: finish_reason");
    }

    #[test]
    fn test_invalid_value_message() {
        let err = CoreError::InvalidValue {
            key: "SPIDERMON_MIN_ITEMS".to_string(),
            message: "expected an integer".to_string(),
        };
        assert!(err.to_string().contains("SPIDERMON_MIN_ITEMS"));
        assert!(err.to_string().contains("expected an integer"));
    }
}
