//! Report rendering
//!
//! Both renderings are pure functions of a completed result tree.

use super::node::{NodeKind, ResultNode};
use crate::action::ActionState;
use std::fmt::Write;

/// Indented human-readable report
pub struct TextReport;

impl TextReport {
    pub fn render(root: &ResultNode) -> String {
        let mut out = String::new();
        Self::render_node(&mut out, root, 0);
        let _ = writeln!(out, "{}", root.counts());
        out
    }

    /// One line per node, its subtree, then its actions in dispatch order
    fn render_node(out: &mut String, node: &ResultNode, depth: usize) {
        let indent = "  ".repeat(depth);
        let _ = write!(out, "{}[{}] {}", indent, node.status, node.name);
        if node.kind == NodeKind::Rule {
            if let Some(severity) = node.severity {
                let _ = write!(out, " ({})", severity);
            }
        }
        if let Some(message) = &node.message {
            let _ = write!(out, ": {}", message);
        }
        out.push('\n');

        for child in &node.children {
            Self::render_node(out, child, depth + 1);
        }

        for action in &node.actions {
            let _ = write!(out, "{}  -> {}: {}", indent, action.name, action.state.as_str());
            if let ActionState::Errored { message } = &action.state {
                let _ = write!(out, " ({})", message);
            }
            out.push('\n');
        }
    }
}

/// Structured JSON report
pub struct JsonReport;

impl JsonReport {
    pub fn to_json(root: &ResultNode) -> serde_json::Result<String> {
        serde_json::to_string(root)
    }

    pub fn to_json_pretty(root: &ResultNode) -> serde_json::Result<String> {
        serde_json::to_string_pretty(root)
    }

    pub fn to_value(root: &ResultNode) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(root)
    }

    pub fn from_json(json: &str) -> serde_json::Result<ResultNode> {
        serde_json::from_str(json)
    }
}
