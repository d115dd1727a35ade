//! Monitor
//!
//! An ordered group of rules and actions with optional setup/teardown hooks
//! and configuration validators. Running a monitor never mutates it.

use crate::action::{self, Action, ActionUnit};
use crate::check_evaluator::{guarded, CheckEvaluator};
use crate::error::AdaptError;
use crate::outcome::{CheckError, NotConfigured, Outcome, Status};
use crate::result::{NodeKind, ResultNode};
use crate::rule::{Hook, Rule, RuleBody, RuleUnit};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use vigil_core::FactContext;

/// Configuration check run before anything else; failing it skips the monitor
pub type Validator = Arc<dyn Fn(&FactContext) -> Result<(), NotConfigured> + Send + Sync>;

/// Ordered rules and actions evaluated against one fact snapshot
pub struct Monitor {
    name: String,
    description: Option<String>,
    rules: Vec<RuleUnit>,
    actions: Vec<ActionUnit>,
    setup: Option<Hook>,
    teardown: Option<Hook>,
    validators: Vec<Validator>,
}

impl Monitor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            rules: Vec::new(),
            actions: Vec::new(),
            setup: None,
            teardown: None,
            validators: Vec::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a rule, adapting it immediately
    pub fn with_rule(mut self, rule: impl Into<Rule>) -> Result<Self, AdaptError> {
        self.add_rule(rule)?;
        Ok(self)
    }

    /// Append rules in order; the first adaptation error aborts construction
    pub fn with_rules<I, R>(mut self, rules: I) -> Result<Self, AdaptError>
    where
        I: IntoIterator<Item = R>,
        R: Into<Rule>,
    {
        for rule in rules {
            self.add_rule(rule)?;
        }
        Ok(self)
    }

    /// Append a rule before the run starts
    pub fn add_rule(&mut self, rule: impl Into<Rule>) -> Result<&mut Self, AdaptError> {
        let units = rule.into().adapt(self.rules.len() + 1)?;
        self.rules.extend(units);
        Ok(self)
    }

    pub fn with_action(mut self, action: impl Into<Action>) -> Self {
        self.add_action(action);
        self
    }

    pub fn with_actions<I, A>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Action>,
    {
        for action in actions {
            self.add_action(action);
        }
        self
    }

    /// Append an action before the run starts
    pub fn add_action(&mut self, action: impl Into<Action>) -> &mut Self {
        let unit = action.into().adapt(self.actions.len() + 1);
        self.actions.push(unit);
        self
    }

    pub fn with_setup<F>(mut self, f: F) -> Self
    where
        F: Fn(&FactContext) -> Result<(), CheckError> + Send + Sync + 'static,
    {
        self.setup = Some(Arc::new(f));
        self
    }

    /// Teardown hook, run after the rules whatever they raised.
    ///
    /// Setup and teardown are paired: when setup fails nothing was acquired,
    /// so teardown does not run.
    pub fn with_teardown<F>(mut self, f: F) -> Self
    where
        F: Fn(&FactContext) -> Result<(), CheckError> + Send + Sync + 'static,
    {
        self.teardown = Some(Arc::new(f));
        self
    }

    /// Add a configuration validator
    pub fn requires<F>(mut self, f: F) -> Self
    where
        F: Fn(&FactContext) -> Result<(), NotConfigured> + Send + Sync + 'static,
    {
        self.validators.push(Arc::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn rules(&self) -> &[RuleUnit] {
        &self.rules
    }

    pub fn actions(&self) -> &[ActionUnit] {
        &self.actions
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Evaluate every rule, then dispatch the qualifying actions
    pub fn run(&self, facts: &FactContext) -> ResultNode {
        let span = tracing::info_span!("monitor", name = %self.name);
        let _enter = span.enter();

        if let Some(reason) = self.validate(facts) {
            tracing::info!("Monitor {} skipped: {}", self.name, reason);
            let mut node = ResultNode::new(&self.name, NodeKind::Monitor, Status::Skipped)
                .with_message(reason);
            node.actions = action::dispatch(&self.actions, &node, false);
            return node;
        }

        let mut not_configured = false;
        let mut monitor_error: Option<String> = None;

        let setup_failure = self.setup.as_ref().and_then(|hook| {
            guarded(|| hook(facts))
                .err()
                .map(|err| hook_failure("Setup", err))
        });

        let children = match &setup_failure {
            Some(failure) => {
                tracing::warn!("Setup of monitor {} failed: {}", self.name, failure.message().unwrap_or_default());
                not_configured = failure.status() == Status::Skipped;
                self.rules
                    .iter()
                    .map(|rule| ResultNode::rule(rule.name(), rule.severity(), failure.clone()))
                    .collect()
            }
            None => {
                let children = self.evaluate_rules(facts, &mut not_configured, &mut monitor_error);
                if let Some(hook) = &self.teardown {
                    if let Err(err) = guarded(|| hook(facts)) {
                        monitor_error.get_or_insert_with(|| format!("Teardown failed: {}", err));
                    }
                }
                children
            }
        };

        let status = aggregate(&children, not_configured, monitor_error.is_some());
        let mut node = ResultNode::new(&self.name, NodeKind::Monitor, status).with_children(children);
        node.message = monitor_error.or_else(|| setup_failure.and_then(|f| f.message().map(str::to_string)));

        let counts = node.counts();
        tracing::info!(
            passed = counts.passed,
            failed = counts.failed,
            errored = counts.errored,
            skipped = counts.skipped,
            "Monitor {} finished: {}",
            self.name,
            status
        );

        node.actions = action::dispatch(&self.actions, &node, status == Status::Errored);
        node
    }

    /// Reason of the first failing validator
    fn validate(&self, facts: &FactContext) -> Option<String> {
        self.validators.iter().find_map(|validator| {
            match guarded(|| validator(facts).map_err(CheckError::from)) {
                Ok(()) => None,
                Err(CheckError::NotConfigured(NotConfigured(reason))) => Some(reason),
                Err(err) => Some(err.to_string()),
            }
        })
    }

    fn evaluate_rules(
        &self,
        facts: &FactContext,
        not_configured: &mut bool,
        monitor_error: &mut Option<String>,
    ) -> Vec<ResultNode> {
        let mut children = Vec::with_capacity(self.rules.len());
        let mut group_failure: Option<Outcome> = None;

        for rule in &self.rules {
            if let RuleBody::GroupMember { group, index: 0, .. } = &rule.body {
                group_failure = group.setup.as_ref().and_then(|hook| {
                    guarded(|| hook(facts)).err().map(|err| {
                        if matches!(err, CheckError::NotConfigured(_)) {
                            *not_configured = true;
                        }
                        hook_failure(&format!("{} setup", group.name), err)
                    })
                });
            }

            let started = Instant::now();
            let outcome = match (&rule.body, &group_failure) {
                (RuleBody::GroupMember { .. }, Some(failure)) => failure.clone(),
                _ => {
                    let result = CheckEvaluator::check(rule, facts);
                    if matches!(result, Err(CheckError::NotConfigured(_))) {
                        *not_configured = true;
                    }
                    Outcome::from_check(result, rule.failure_message())
                }
            };
            let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

            log_outcome(rule, &outcome, elapsed_ms);
            children.push(ResultNode::rule(rule.name(), rule.severity(), outcome).with_elapsed_ms(elapsed_ms));

            if let RuleBody::GroupMember { group, index, .. } = &rule.body {
                if index + 1 == group.len {
                    let setup_failed = group_failure.take().is_some();
                    if let (false, Some(hook)) = (setup_failed, &group.teardown) {
                        if let Err(err) = guarded(|| hook(facts)) {
                            monitor_error.get_or_insert_with(|| format!("{} teardown failed: {}", group.name, err));
                        }
                    }
                }
            }
        }

        children
    }
}

impl fmt::Debug for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("name", &self.name)
            .field("rules", &self.rules)
            .field("actions", &self.actions)
            .finish()
    }
}

/// A `NotConfigured` raised anywhere skips the monitor, otherwise
/// Errored > Failed > Skipped > Passed
fn aggregate(children: &[ResultNode], not_configured: bool, monitor_error: bool) -> Status {
    let any = |status: Status| children.iter().any(|child| child.status == status);

    if not_configured {
        Status::Skipped
    } else if monitor_error || any(Status::Errored) {
        Status::Errored
    } else if any(Status::Failed) {
        Status::Failed
    } else if !children.is_empty() && children.iter().all(|child| child.status == Status::Skipped) {
        Status::Skipped
    } else {
        Status::Passed
    }
}

/// Outcome given to the rules behind a failed setup hook
fn hook_failure(stage: &str, err: CheckError) -> Outcome {
    match err {
        CheckError::Skipped(reason) | CheckError::NotConfigured(NotConfigured(reason)) => {
            Outcome::skipped(reason)
        }
        CheckError::Failed(message) => Outcome::Errored {
            message: format!("{} failed: {}", stage, message),
            cause: None,
        },
        CheckError::Error(err) => Outcome::errored(err.context(format!("{} failed", stage))),
    }
}

fn log_outcome(rule: &RuleUnit, outcome: &Outcome, elapsed_ms: f64) {
    match outcome {
        Outcome::Errored { message, .. } => {
            tracing::warn!(rule = %rule.name(), elapsed_ms, "Rule errored: {}", message)
        }
        _ => tracing::debug!(
            rule = %rule.name(),
            status = %outcome.status(),
            elapsed_ms,
            "Rule evaluated"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{ensure, CheckResult};
    use crate::rule::CheckGroup;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use vigil_core::Trigger;

    fn facts() -> FactContext {
        vec![("finish_reason", "finished")].into_iter().collect()
    }

    #[test]
    fn test_rule_failure_does_not_stop_siblings() {
        let monitor = Monitor::new("m")
            .with_rule(Rule::predicate(|_: &FactContext| false).named("first"))
            .unwrap()
            .with_rule(Rule::predicate(|f: &FactContext| -> CheckResult {
                f.get("missing")?;
                Ok(true)
            }).named("second"))
            .unwrap()
            .with_rule(Rule::nullary(|| true).named("third"))
            .unwrap();

        let node = monitor.run(&facts());
        let statuses: Vec<Status> = node.children.iter().map(|c| c.status).collect();
        assert_eq!(statuses, vec![Status::Failed, Status::Errored, Status::Passed]);
        assert_eq!(node.status, Status::Errored);
        assert!(node.children.iter().all(|c| c.elapsed_ms.is_some()));
    }

    #[test]
    fn test_zero_rules_passes() {
        let node = Monitor::new("empty").run(&facts());
        assert_eq!(node.status, Status::Passed);
        assert!(node.children.is_empty());
    }

    #[test]
    fn test_validator_skips_and_fires_only_always() {
        let monitor = Monitor::new("needs config")
            .requires(|_| Err(NotConfigured::new("SPIDERMON_MIN_ITEMS setting is not configured")))
            .with_rule(Rule::nullary(|| -> bool { panic!("must not run") }))
            .unwrap()
            .with_action(Action::nullary(|| Ok(())).named("always"))
            .with_action(Action::nullary(|| Ok(())).named("on failed").on(Trigger::Failed))
            .with_action(Action::nullary(|| Ok(())).named("on error").on(Trigger::Error));

        let node = monitor.run(&facts());
        assert_eq!(node.status, Status::Skipped);
        assert!(node.children.is_empty());
        assert_eq!(node.message.as_deref(), Some("SPIDERMON_MIN_ITEMS setting is not configured"));
        let states: Vec<&str> = node.actions.iter().map(|a| a.state.as_str()).collect();
        assert_eq!(states, vec!["EXECUTED", "NOT_TRIGGERED", "NOT_TRIGGERED"]);
    }

    #[test]
    fn test_rule_raising_not_configured_skips_monitor() {
        let monitor = Monitor::new("m")
            .with_rule(Rule::predicate(|_: &FactContext| -> CheckResult {
                Err(NotConfigured::new("no threshold").into())
            }))
            .unwrap()
            .with_rule(Rule::nullary(|| true))
            .unwrap();

        let node = monitor.run(&facts());
        assert_eq!(node.children[0].status, Status::Skipped);
        assert_eq!(node.children[1].status, Status::Passed);
        assert_eq!(node.status, Status::Skipped);
    }

    #[test]
    fn test_setup_failure_errors_every_rule_and_skips_teardown() {
        let torn_down = Arc::new(AtomicUsize::new(0));
        let counter = torn_down.clone();
        let monitor = Monitor::new("m")
            .with_setup(|_| Err(anyhow::anyhow!("no connection").into()))
            .with_teardown(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .with_rules(vec!["stats.finish_reason == 'finished'", "true"])
            .unwrap();

        let node = monitor.run(&facts());
        assert_eq!(node.status, Status::Errored);
        for child in &node.children {
            assert_eq!(child.message.as_deref(), Some("Setup failed: no connection"));
        }
        assert_eq!(torn_down.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_teardown_runs_even_when_rules_raise() {
        let torn_down = Arc::new(AtomicUsize::new(0));
        let counter = torn_down.clone();
        let monitor = Monitor::new("m")
            .with_teardown(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .with_rule(Rule::nullary(|| -> bool { panic!("Boom!") }))
            .unwrap();

        let node = monitor.run(&facts());
        assert_eq!(node.status, Status::Errored);
        assert_eq!(torn_down.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_teardown_failure_errors_monitor() {
        let monitor = Monitor::new("m")
            .with_teardown(|_| Err(anyhow::anyhow!("cleanup failed").into()))
            .with_rule("true")
            .unwrap();

        let node = monitor.run(&facts());
        assert_eq!(node.children[0].status, Status::Passed);
        assert_eq!(node.status, Status::Errored);
        assert_eq!(node.message.as_deref(), Some("Teardown failed: cleanup failed"));
    }

    #[test]
    fn test_group_hooks_run_once_around_members() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (setup_log, teardown_log, a_log, b_log) = (log.clone(), log.clone(), log.clone(), log.clone());

        let group = CheckGroup::new("ATestCase")
            .with_setup(move |_| {
                setup_log.lock().unwrap().push("setup");
                Ok(())
            })
            .with_teardown(move |_| {
                teardown_log.lock().unwrap().push("teardown");
                Ok(())
            })
            .check("test_a", move |_: &FactContext| {
                a_log.lock().unwrap().push("a");
                true
            })
            .check("test_b", move |_: &FactContext| {
                b_log.lock().unwrap().push("b");
                ensure(false, "b is broken")
            });

        let node = Monitor::new("m").with_rule(Rule::group(group)).unwrap().run(&facts());
        assert_eq!(*log.lock().unwrap(), vec!["setup", "a", "b", "teardown"]);
        assert_eq!(node.children[1].message.as_deref(), Some("b is broken"));
        assert_eq!(node.status, Status::Failed);
    }

    #[test]
    fn test_group_setup_failure_marks_members() {
        let group = CheckGroup::new("G")
            .with_setup(|_| Err(NotConfigured::new("group not configured").into()))
            .check("x", |_: &FactContext| true)
            .check("y", |_: &FactContext| true);

        let node = Monitor::new("m").with_rule(Rule::group(group)).unwrap().run(&facts());
        assert!(node.children.iter().all(|c| c.status == Status::Skipped));
        assert_eq!(node.status, Status::Skipped);
    }

    #[test]
    fn test_not_configured_rule_skips_monitor_with_failing_sibling() {
        let monitor = Monitor::new("m")
            .with_rule(Rule::predicate(|_: &FactContext| -> CheckResult {
                Err(NotConfigured::new("no X").into())
            }))
            .unwrap()
            .with_rule(Rule::nullary(|| false))
            .unwrap()
            .with_action(Action::nullary(|| Ok(())).named("on failed").on(Trigger::Failed))
            .with_action(Action::nullary(|| Ok(())).named("on error").on(Trigger::Error));

        let node = monitor.run(&facts());
        assert_eq!(node.children.len(), 2);
        assert_eq!(node.children[0].status, Status::Skipped);
        assert_eq!(node.children[1].status, Status::Failed);
        assert_eq!(node.status, Status::Skipped);
        let states: Vec<&str> = node.actions.iter().map(|a| a.state.as_str()).collect();
        assert_eq!(states, vec!["NOT_TRIGGERED", "NOT_TRIGGERED"]);
    }

    #[test]
    fn test_group_setup_not_configured_skips_monitor_with_passing_sibling() {
        let group = CheckGroup::new("G")
            .with_setup(|_| Err(NotConfigured::new("group not configured").into()))
            .check("x", |_: &FactContext| true);

        let monitor = Monitor::new("m")
            .with_rule(Rule::group(group))
            .unwrap()
            .with_rule("true")
            .unwrap()
            .with_action(Action::nullary(|| Ok(())).named("on passed").on(Trigger::Passed));

        let node = monitor.run(&facts());
        assert_eq!(node.children[0].status, Status::Skipped);
        assert_eq!(node.children[1].status, Status::Passed);
        assert_eq!(node.status, Status::Skipped);
        assert_eq!(node.actions[0].state.as_str(), "NOT_TRIGGERED");
    }

    #[test]
    fn test_run_is_repeatable() {
        let monitor = Monitor::new("m")
            .with_rule("stats.finish_reason == 'finished'")
            .unwrap();
        let first = monitor.run(&facts());
        let second = monitor.run(&facts());
        assert_eq!(first.status, second.status);
        assert_eq!(monitor.rule_names(), vec!["stats.finish_reason == 'finished'"]);
    }

    #[test]
    fn test_invalid_expression_fails_construction() {
        let err = Monitor::new("m").with_rule("stats.finish_reason ==").unwrap_err();
        assert!(matches!(err, AdaptError::InvalidExpression { .. }));
    }
}
