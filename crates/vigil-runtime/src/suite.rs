//! Monitor Suite
//!
//! A tree of monitors and nested suites, built bottom-up so it can never
//! contain a cycle. Children run in declared order against the same facts.

use crate::action::{self, Action, ActionUnit};
use crate::monitor::Monitor;
use crate::outcome::Status;
use crate::result::{NodeKind, ResultNode};
use std::fmt;
use vigil_core::FactContext;

/// Child of a suite
#[derive(Debug)]
pub enum SuiteChild {
    Monitor(Monitor),
    Suite(MonitorSuite),
}

impl SuiteChild {
    pub fn name(&self) -> &str {
        match self {
            SuiteChild::Monitor(monitor) => monitor.name(),
            SuiteChild::Suite(suite) => suite.name(),
        }
    }

    fn run(&self, facts: &FactContext) -> ResultNode {
        match self {
            SuiteChild::Monitor(monitor) => monitor.run(facts),
            SuiteChild::Suite(suite) => suite.run(facts),
        }
    }
}

impl From<Monitor> for SuiteChild {
    fn from(monitor: Monitor) -> Self {
        SuiteChild::Monitor(monitor)
    }
}

impl From<MonitorSuite> for SuiteChild {
    fn from(suite: MonitorSuite) -> Self {
        SuiteChild::Suite(suite)
    }
}

/// Composable tree of monitors
pub struct MonitorSuite {
    name: String,
    description: Option<String>,
    children: Vec<SuiteChild>,
    actions: Vec<ActionUnit>,
}

impl MonitorSuite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            children: Vec::new(),
            actions: Vec::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_monitor(mut self, monitor: Monitor) -> Self {
        self.add_monitor(monitor);
        self
    }

    pub fn with_suite(mut self, suite: MonitorSuite) -> Self {
        self.add_suite(suite);
        self
    }

    pub fn with_action(mut self, action: impl Into<Action>) -> Self {
        self.add_action(action);
        self
    }

    pub fn add_monitor(&mut self, monitor: Monitor) -> &mut Self {
        self.children.push(SuiteChild::Monitor(monitor));
        self
    }

    pub fn add_suite(&mut self, suite: MonitorSuite) -> &mut Self {
        self.children.push(SuiteChild::Suite(suite));
        self
    }

    /// Suite-level action, triggered by the suite's aggregate status
    pub fn add_action(&mut self, action: impl Into<Action>) -> &mut Self {
        let unit = action.into().adapt(self.actions.len() + 1);
        self.actions.push(unit);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn children(&self) -> &[SuiteChild] {
        &self.children
    }

    /// Number of direct children
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of monitors in the whole tree
    pub fn monitor_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| match child {
                SuiteChild::Monitor(_) => 1,
                SuiteChild::Suite(suite) => suite.monitor_count(),
            })
            .sum()
    }

    /// Run every child in order and aggregate their results
    pub fn run(&self, facts: &FactContext) -> ResultNode {
        let span = tracing::info_span!("suite", name = %self.name);
        let _enter = span.enter();

        let children: Vec<ResultNode> = self.children.iter().map(|child| child.run(facts)).collect();
        let status = aggregate(&children);

        let mut node = ResultNode::new(&self.name, NodeKind::Suite, status).with_children(children);
        tracing::debug!("Suite {} finished: {}", self.name, status);

        node.actions = action::dispatch(&self.actions, &node, node.has_errors());
        node
    }
}

impl fmt::Debug for MonitorSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorSuite")
            .field("name", &self.name)
            .field("children", &self.children)
            .field("actions", &self.actions)
            .finish()
    }
}

/// Failed when any child failed or errored; Skipped when every child was skipped
fn aggregate(children: &[ResultNode]) -> Status {
    if children.iter().any(|child| child.status.is_unsuccessful()) {
        Status::Failed
    } else if !children.is_empty() && children.iter().all(|child| child.status == Status::Skipped) {
        Status::Skipped
    } else {
        Status::Passed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::NotConfigured;
    use crate::rule::Rule;
    use vigil_core::Trigger;

    fn monitor(name: &str, expression: &str) -> Monitor {
        Monitor::new(name).with_rule(expression).unwrap()
    }

    fn skipped(name: &str) -> Monitor {
        Monitor::new(name).requires(|_| Err(NotConfigured::new("not configured")))
    }

    #[test]
    fn test_children_run_in_order_and_failures_propagate() {
        let suite = MonitorSuite::new("root")
            .with_monitor(monitor("a", "true"))
            .with_suite(MonitorSuite::new("nested").with_monitor(monitor("b", "false")))
            .with_monitor(monitor("c", "true"));

        let node = suite.run(&FactContext::default());
        let names: Vec<&str> = node.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "nested", "c"]);
        assert_eq!(node.children[1].status, Status::Failed);
        assert_eq!(node.status, Status::Failed);
        assert_eq!(suite.monitor_count(), 3);
    }

    #[test]
    fn test_errored_child_fails_suite_and_fires_error_actions() {
        let suite = MonitorSuite::new("root")
            .with_monitor(Monitor::new("m").with_rule(Rule::expression("stats.missing == 1")).unwrap())
            .with_action(Action::nullary(|| Ok(())).named("on error").on(Trigger::Error));

        let node = suite.run(&FactContext::default());
        assert_eq!(node.children[0].status, Status::Errored);
        assert_eq!(node.status, Status::Failed);
        assert_eq!(node.actions[0].state.as_str(), "EXECUTED");
    }

    #[test]
    fn test_all_skipped_is_skipped() {
        let suite = MonitorSuite::new("root")
            .with_monitor(skipped("a"))
            .with_monitor(skipped("b"));
        assert_eq!(suite.run(&FactContext::default()).status, Status::Skipped);

        let mixed = MonitorSuite::new("root")
            .with_monitor(skipped("a"))
            .with_monitor(monitor("b", "true"));
        assert_eq!(mixed.run(&FactContext::default()).status, Status::Passed);
    }

    #[test]
    fn test_empty_suite_passes() {
        let suite = MonitorSuite::new("empty");
        assert!(suite.is_empty());
        assert_eq!(suite.run(&FactContext::default()).status, Status::Passed);
    }
}
