//! Log action

use crate::action::ActionHandler;
use crate::result::ResultNode;

/// Emits one tracing event summarizing the node it is attached to
#[derive(Debug, Clone, Default)]
pub struct LogAction {
    name: Option<String>,
}

impl LogAction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    /// One-line summary of a node
    pub fn summary(result: &ResultNode) -> String {
        let failures: Vec<String> = result
            .failures()
            .iter()
            .map(|node| match &node.message {
                Some(message) => format!("{} ({})", node.name, message),
                None => node.name.clone(),
            })
            .collect();

        if failures.is_empty() {
            format!("{} {}: {}", result.kind, result.name, result.status)
        } else {
            format!(
                "{} {}: {} [{}]",
                result.kind,
                result.name,
                result.status,
                failures.join("; ")
            )
        }
    }
}

impl ActionHandler for LogAction {
    fn run(&self, result: &ResultNode) -> anyhow::Result<()> {
        let summary = Self::summary(result);
        let counts = result.counts();
        if result.is_successful() {
            tracing::info!(
                passed = counts.passed,
                failed = counts.failed,
                errored = counts.errored,
                skipped = counts.skipped,
                "{}",
                summary
            );
        } else {
            tracing::warn!(
                passed = counts.passed,
                failed = counts.failed,
                errored = counts.errored,
                skipped = counts.skipped,
                "{}",
                summary
            );
        }
        Ok(())
    }

    fn name(&self) -> Option<String> {
        self.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{Outcome, Status};
    use crate::result::NodeKind;
    use vigil_core::Severity;

    #[test]
    fn test_summary_lists_failures() {
        let node = ResultNode::new("Retry Monitor", NodeKind::Monitor, Status::Failed).with_children(vec![
            ResultNode::rule("Should not hit the limit of retries", Severity::Normal, Outcome::failed("Too many retries")),
        ]);
        assert_eq!(
            LogAction::summary(&node),
            "monitor Retry Monitor: FAILED [Should not hit the limit of retries (Too many retries)]"
        );
        assert!(LogAction::new().run(&node).is_ok());
    }

    #[test]
    fn test_summary_when_passed() {
        let node = ResultNode::new("Suite", NodeKind::Suite, Status::Passed);
        assert_eq!(LogAction::summary(&node), "suite Suite: PASSED");
        assert_eq!(LogAction::named("log").name(), Some("log".to_string()));
    }
}
