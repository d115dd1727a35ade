//! Runner - the entry point of a monitoring run

use crate::monitor::Monitor;
use crate::result::ResultNode;
use crate::suite::MonitorSuite;
use vigil_core::FactContext;

/// Something the runner can evaluate: a monitor or a suite
pub trait Runnable {
    fn name(&self) -> &str;

    fn run(&self, facts: &FactContext) -> ResultNode;
}

impl Runnable for Monitor {
    fn name(&self) -> &str {
        Monitor::name(self)
    }

    fn run(&self, facts: &FactContext) -> ResultNode {
        Monitor::run(self, facts)
    }
}

impl Runnable for MonitorSuite {
    fn name(&self) -> &str {
        MonitorSuite::name(self)
    }

    fn run(&self, facts: &FactContext) -> ResultNode {
        MonitorSuite::run(self, facts)
    }
}

/// Runner
pub struct Runner;

impl Runner {
    /// Build the fact snapshot once and run `root` against it
    pub fn run<R: Runnable + ?Sized>(root: &R, facts: impl Into<FactContext>) -> ResultNode {
        let facts = facts.into();
        let span = tracing::info_span!("run", root = %root.name(), facts = facts.len());
        let _enter = span.enter();

        tracing::info!("Starting run of {}", root.name());
        let result = root.run(&facts);

        let counts = result.counts();
        tracing::info!(
            status = %result.status,
            passed = counts.passed,
            failed = counts.failed,
            errored = counts.errored,
            skipped = counts.skipped,
            "Run of {} completed",
            root.name()
        );
        result
    }
}
