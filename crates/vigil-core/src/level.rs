//! Rule severity levels and action triggers

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Informational priority of a rule
///
/// Severity never changes pass/fail semantics; it only orders failures
/// in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    #[default]
    Normal,
    High,
}

/// Condition under which an action fires, given its owner's aggregate status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Trigger {
    #[default]
    Always,
    Passed,
    Failed,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Normal => "NORMAL",
            Severity::High => "HIGH",
        }
    }
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Always => "ALWAYS",
            Trigger::Passed => "PASSED",
            Trigger::Failed => "FAILED",
            Trigger::Error => "ERROR",
        }
    }
}

impl FromStr for Severity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Severity::Low),
            "NORMAL" => Ok(Severity::Normal),
            "HIGH" => Ok(Severity::High),
            _ => Err(CoreError::InvalidLevel(s.to_string())),
        }
    }
}

impl FromStr for Trigger {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ALWAYS" => Ok(Trigger::Always),
            "PASSED" => Ok(Trigger::Passed),
            "FAILED" => Ok(Trigger::Failed),
            "ERROR" => Ok(Trigger::Error),
            _ => Err(CoreError::InvalidLevel(s.to_string())),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
