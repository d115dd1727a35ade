//! Declarative suite and monitor definitions
//!
//! These are plain serde values. They carry names, levels and triggers as
//! text; the runtime loader validates and adapts them into runnable
//! monitors before any run starts.

use serde::{Deserialize, Serialize};

/// A definition document: either a suite or a single monitor
///
/// ```yaml
/// suite:
///   name: Spider close
///   monitors:
///     - name: Finish reason
///       rules:
///         - expression: "stats.finish_reason == 'finished'"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Definition {
    Suite(SuiteDefinition),
    Monitor(MonitorDefinition),
}

/// Suite definition
///
/// Monitors run first, in order, followed by nested suites in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteDefinition {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub monitors: Vec<MonitorDefinition>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suites: Vec<SuiteDefinition>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionDefinition>,
}

/// Monitor definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorDefinition {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Setting keys that must be present, otherwise the monitor is skipped
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,

    #[serde(default)]
    pub rules: Vec<RuleDefinition>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionDefinition>,
}

/// Rule definition
///
/// `kind` is `expression` (default) or `check`, the latter naming a check
/// registered with the loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Severity: LOW, NORMAL or HIGH (case-insensitive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    #[serde(default = "default_rule_kind")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<String>,

    /// Message reported when the rule fails
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Action definition
///
/// `kind` is `log`, `webhook` or `handler`, the latter naming a handler
/// registered with the loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// ALWAYS (default), PASSED, FAILED or ERROR
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,

    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_rule_kind() -> String {
    "expression".to_string()
}

impl RuleDefinition {
    /// Expression rule shorthand
    pub fn expression(source: impl Into<String>) -> Self {
        Self {
            name: None,
            level: None,
            kind: default_rule_kind(),
            expression: Some(source.into()),
            check: None,
            message: None,
        }
    }
}

impl SuiteDefinition {
    /// Total number of monitors, nested suites included
    pub fn monitor_count(&self) -> usize {
        self.monitors.len() + self.suites.iter().map(|s| s.monitor_count()).sum::<usize>()
    }
}
