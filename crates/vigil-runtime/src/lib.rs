//! Vigil Runtime - monitor execution engine
//!
//! This crate evaluates rules against a fact snapshot and drives actions
//! from the outcome:
//! - Rule and action adapters normalizing every supported form
//! - The check evaluator, which contains whatever a check raises
//! - Monitors, suites and the runner
//! - The result tree with text and JSON reports
//! - The definition loader for YAML/JSON suites
//! - Built-in log and webhook actions

pub mod action;
pub mod actions;
pub mod check_evaluator;
pub mod engine;
pub mod error;
pub mod loader;
pub mod monitor;
pub mod outcome;
pub mod result;
pub mod rule;
pub mod runner;
pub mod suite;

// Re-export commonly used types
pub use action::{Action, ActionHandler, ActionRecord, ActionState, ActionUnit};
pub use actions::{LogAction, WebhookAction};
pub use check_evaluator::CheckEvaluator;
pub use engine::ExpressionEvaluator;
pub use error::{AdaptError, Result, RuntimeError};
pub use loader::{LoadedDefinition, Loader, Registry};
pub use monitor::Monitor;
pub use outcome::{ensure, skip, CheckError, CheckResult, NotConfigured, Outcome, Status};
pub use result::{Counts, JsonReport, NodeKind, ResultNode, TextReport};
pub use rule::{Check, CheckGroup, Rule, RuleUnit};
pub use runner::{Runnable, Runner};
pub use suite::{MonitorSuite, SuiteChild};

// Re-export core types callers need alongside the engine
pub use vigil_core::{FactContext, Severity, SettingsLookup, Trigger, Value};
