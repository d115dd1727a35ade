//! Check Evaluator
//!
//! Runs one adapted rule against the facts. Whatever the check does
//! (returns false, raises, panics) comes back as a value; nothing escapes.

use crate::engine::ExpressionEvaluator;
use crate::outcome::{CheckError, CheckResult, Outcome};
use crate::rule::{RuleBody, RuleUnit};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use vigil_core::FactContext;

/// Check evaluator
pub struct CheckEvaluator;

impl CheckEvaluator {
    /// Evaluate a rule into its outcome
    pub fn evaluate(rule: &RuleUnit, facts: &FactContext) -> Outcome {
        Outcome::from_check(Self::check(rule, facts), rule.failure_message())
    }

    /// Raw verdict of a rule's check, panics converted to errors
    ///
    /// Group members run only their own check; the group's hooks are
    /// driven by the monitor.
    pub fn check(rule: &RuleUnit, facts: &FactContext) -> CheckResult {
        guarded(|| match &rule.body {
            RuleBody::Predicate(check) => check(facts),
            RuleBody::Expression { ast, .. } => {
                Ok(ExpressionEvaluator::evaluate_bool(ast, facts)?)
            }
            RuleBody::CheckObject(check) => check.check(facts),
            RuleBody::GroupMember { check, .. } => check(facts),
        })
    }
}

/// Run `f`, turning a panic into `CheckError::Error`
pub(crate) fn guarded<T>(f: impl FnOnce() -> Result<T, CheckError>) -> Result<T, CheckError> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(CheckError::Error(anyhow::anyhow!(
            "panicked: {}",
            panic_message(payload.as_ref())
        ))),
    }
}

/// Run an action body, turning a panic into an error
pub(crate) fn guarded_action(f: impl FnOnce() -> anyhow::Result<()>) -> anyhow::Result<()> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(anyhow::anyhow!(
            "panicked: {}",
            panic_message(payload.as_ref())
        )),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
