//! Rule outcomes, aggregate statuses and the errors a check may raise

use crate::error::RuntimeError;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use vigil_core::CoreError;

/// Terminal state of a suite, monitor or rule node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Passed,
    Failed,
    Errored,
    Skipped,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Passed => "PASSED",
            Status::Failed => "FAILED",
            Status::Errored => "ERRORED",
            Status::Skipped => "SKIPPED",
        }
    }

    /// Failed or errored
    pub fn is_unsuccessful(&self) -> bool {
        matches!(self, Status::Failed | Status::Errored)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating one rule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "UPPERCASE")]
pub enum Outcome {
    Passed,
    Failed {
        message: String,
    },
    Errored {
        message: String,
        /// The raised error; not serialized
        #[serde(skip)]
        cause: Option<Arc<dyn StdError + Send + Sync>>,
    },
    Skipped {
        reason: String,
    },
}

impl Outcome {
    pub fn failed(message: impl Into<String>) -> Self {
        Outcome::Failed {
            message: message.into(),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Outcome::Skipped {
            reason: reason.into(),
        }
    }

    /// Errored outcome keeping `err` as its cause
    pub fn errored(err: anyhow::Error) -> Self {
        let message = format!("{:#}", err);
        let cause: Box<dyn StdError + Send + Sync> = err.into();
        Outcome::Errored {
            message,
            cause: Some(Arc::from(cause)),
        }
    }

    /// Convert a check result, using `failure_message` when the check returned false
    pub fn from_check(result: CheckResult, failure_message: &str) -> Self {
        match result {
            Ok(true) => Outcome::Passed,
            Ok(false) => Outcome::failed(failure_message),
            Err(CheckError::Failed(message)) => Outcome::Failed { message },
            Err(CheckError::Skipped(reason)) => Outcome::Skipped { reason },
            Err(CheckError::NotConfigured(NotConfigured(reason))) => Outcome::Skipped { reason },
            Err(CheckError::Error(err)) => Outcome::errored(err),
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Outcome::Passed => Status::Passed,
            Outcome::Failed { .. } => Status::Failed,
            Outcome::Errored { .. } => Status::Errored,
            Outcome::Skipped { .. } => Status::Skipped,
        }
    }

    /// Failure message, error message or skip reason
    pub fn message(&self) -> Option<&str> {
        match self {
            Outcome::Passed => None,
            Outcome::Failed { message } | Outcome::Errored { message, .. } => Some(message),
            Outcome::Skipped { reason } => Some(reason),
        }
    }

    /// The error an errored rule raised, when still attached
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match self {
            Outcome::Errored {
                cause: Some(cause), ..
            } => Some(cause.as_ref()),
            _ => None,
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }
}

/// Equality ignores the attached cause
impl PartialEq for Outcome {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Outcome::Passed, Outcome::Passed) => true,
            (Outcome::Failed { message: a }, Outcome::Failed { message: b }) => a == b,
            (Outcome::Errored { message: a, .. }, Outcome::Errored { message: b, .. }) => a == b,
            (Outcome::Skipped { reason: a }, Outcome::Skipped { reason: b }) => a == b,
            _ => false,
        }
    }
}

/// A required setting or fact is absent; the owning monitor is skipped
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct NotConfigured(pub String);

impl NotConfigured {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// What a check, hook or validator may raise
#[derive(Error, Debug)]
pub enum CheckError {
    /// Assertion-style failure with a message
    #[error("{0}")]
    Failed(String),

    /// Explicit skip of this rule
    #[error("skipped: {0}")]
    Skipped(String),

    #[error("not configured: {0}")]
    NotConfigured(#[from] NotConfigured),

    /// Any other raised condition; the rule is errored
    #[error(transparent)]
    Error(#[from] anyhow::Error),
}

impl From<CoreError> for CheckError {
    fn from(err: CoreError) -> Self {
        CheckError::Error(anyhow::Error::new(err))
    }
}

impl From<RuntimeError> for CheckError {
    fn from(err: RuntimeError) -> Self {
        CheckError::Error(anyhow::Error::new(err))
    }
}

/// Verdict of a check: `Ok(true)` passed, `Ok(false)` failed
pub type CheckResult = std::result::Result<bool, CheckError>;

/// Fail with `message` unless `condition` holds
pub fn ensure(condition: bool, message: impl Into<String>) -> Result<(), CheckError> {
    if condition {
        Ok(())
    } else {
        Err(CheckError::Failed(message.into()))
    }
}

/// Skip the current rule
pub fn skip(reason: impl Into<String>) -> CheckError {
    CheckError::Skipped(reason.into())
}

/// Return types accepted from rule checks
pub trait IntoCheckResult {
    fn into_check_result(self) -> CheckResult;
}

impl IntoCheckResult for bool {
    fn into_check_result(self) -> CheckResult {
        Ok(self)
    }
}

impl<E: Into<CheckError>> IntoCheckResult for Result<bool, E> {
    fn into_check_result(self) -> CheckResult {
        self.map_err(Into::into)
    }
}

/// Unit means passed; failures are raised through [`ensure`]
impl<E: Into<CheckError>> IntoCheckResult for Result<(), E> {
    fn into_check_result(self) -> CheckResult {
        self.map(|()| true).map_err(Into::into)
    }
}
