//! Result tree nodes
//!
//! One node per suite, monitor and rule, mirroring the shape of what ran.
//! A tree is built during a single run and left untouched afterwards.

use crate::action::ActionRecord;
use crate::outcome::{Outcome, Status};
use serde::{Deserialize, Serialize};
use std::fmt;
use vigil_core::Severity;

/// Kind of node in the result tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Suite,
    Monitor,
    Rule,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Suite => "suite",
            NodeKind::Monitor => "monitor",
            NodeKind::Rule => "rule",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node of the result tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultNode {
    pub name: String,

    pub kind: NodeKind,

    /// Outcome status for rules, aggregate status for suites and monitors
    pub status: Status,

    /// Rule outcome (rule nodes only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,

    /// Rule severity (rule nodes only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,

    /// Failure/error message, skip reason, or a monitor-level diagnostic
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Evaluation time in milliseconds (rule nodes only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<f64>,

    /// Child nodes in evaluation order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ResultNode>,

    /// Actions dispatched by this node, in declared order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionRecord>,
}

impl ResultNode {
    pub fn new(name: impl Into<String>, kind: NodeKind, status: Status) -> Self {
        Self {
            name: name.into(),
            kind,
            status,
            outcome: None,
            severity: None,
            message: None,
            elapsed_ms: None,
            children: Vec::new(),
            actions: Vec::new(),
        }
    }

    /// Rule leaf carrying its outcome
    pub fn rule(name: impl Into<String>, severity: Severity, outcome: Outcome) -> Self {
        let mut node = Self::new(name, NodeKind::Rule, outcome.status());
        node.message = outcome.message().map(str::to_string);
        node.severity = Some(severity);
        node.outcome = Some(outcome);
        node
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_elapsed_ms(mut self, ms: f64) -> Self {
        self.elapsed_ms = Some(ms);
        self
    }

    pub fn with_children(mut self, children: Vec<ResultNode>) -> Self {
        self.children = children;
        self
    }

    /// Rule tallies over every rule leaf of this subtree
    pub fn counts(&self) -> Counts {
        let mut counts = Counts::default();
        for (_, node) in self.walk() {
            if node.kind == NodeKind::Rule {
                counts.record(node.status);
            }
        }
        counts
    }

    /// Neither failed nor errored
    pub fn is_successful(&self) -> bool {
        !self.status.is_unsuccessful()
    }

    /// Whether any descendant errored
    pub fn has_errors(&self) -> bool {
        self.walk()
            .skip(1)
            .any(|(_, node)| node.status == Status::Errored)
    }

    /// Depth-first pre-order traversal, yielding `(depth, node)`
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![(0, self)],
        }
    }

    /// First node named `name`, in traversal order
    pub fn find(&self, name: &str) -> Option<&ResultNode> {
        self.walk().map(|(_, node)| node).find(|node| node.name == name)
    }

    /// Failed and errored rules, highest severity first
    ///
    /// The sort is stable: rules of equal severity keep evaluation order.
    pub fn failures(&self) -> Vec<&ResultNode> {
        let mut failures: Vec<&ResultNode> = self
            .walk()
            .map(|(_, node)| node)
            .filter(|node| node.kind == NodeKind::Rule && node.status.is_unsuccessful())
            .collect();
        failures.sort_by(|a, b| b.severity.cmp(&a.severity));
        failures
    }

    /// Number of nodes in this subtree, itself included
    pub fn node_count(&self) -> usize {
        self.walk().count()
    }
}

/// Pre-order iterator over a result tree
pub struct Walk<'a> {
    stack: Vec<(usize, &'a ResultNode)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a ResultNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|child| (depth + 1, child)));
        Some((depth, node))
    }
}

/// Rule outcome tallies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub skipped: usize,
}

impl Counts {
    fn record(&mut self, status: Status) {
        match status {
            Status::Passed => self.passed += 1,
            Status::Failed => self.failed += 1,
            Status::Errored => self.errored += 1,
            Status::Skipped => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.errored + self.skipped
    }
}

impl fmt::Display for Counts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rules: {} passed, {} failed, {} errored, {} skipped",
            self.total(),
            self.passed,
            self.failed,
            self.errored,
            self.skipped
        )
    }
}
