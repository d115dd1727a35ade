//! Monitor construction walkthrough
//!
//! Builds monitors in every supported style and prints each result tree.
//!
//! Run with: cargo run --example monitors

use anyhow::Result;
use vigil_runtime::{
    Action, ActionHandler, Check, CheckGroup, CheckResult, FactContext, Monitor, ResultNode, Rule,
    Severity, TextReport, Trigger,
};

fn stats() -> Result<FactContext> {
    Ok(FactContext::from_json(serde_json::json!({
        "downloader/response_count": 63785,
        "item_scraped_count": 29836,
        "finish_reason": "finished"
    }))?)
}

struct Noop;

impl ActionHandler for Noop {
    fn run(&self, _result: &ResultNode) -> Result<()> {
        Ok(())
    }
}

struct Message(&'static str);

impl ActionHandler for Message {
    fn run(&self, _result: &ResultNode) -> Result<()> {
        println!("RUNNING ACTION: {}", self.0);
        Ok(())
    }
}

struct Bomb;

impl ActionHandler for Bomb {
    fn run(&self, _result: &ResultNode) -> Result<()> {
        anyhow::bail!("Boom!")
    }
}

fn finished(facts: &FactContext) -> CheckResult {
    Ok(facts.get("finish_reason")?.as_str() == Some("finished"))
}

struct FinishedRule;

impl Check for FinishedRule {
    fn check(&self, facts: &FactContext) -> CheckResult {
        finished(facts)
    }
}

// A. Rules and actions given up front
fn from_parameters() -> Result<Monitor> {
    let monitor = Monitor::new("A. Monitor from parameters")
        .with_rules([
            Rule::predicate(|facts: &FactContext| finished(facts)),
            Rule::expression("stats['downloader/response_count'] > 10000"),
        ])?
        .with_action(Message("finish reason is ok!"));
    Ok(monitor)
}

// B. Rules and actions added afterwards
fn adding_rules_and_actions() -> Result<Monitor> {
    let mut monitor = Monitor::new("B. Adding rules and actions");
    monitor.add_rule(Rule::predicate(finished))?;
    monitor.add_action(Message("finish reason is ok!"));
    Ok(monitor)
}

// C. Actions still run when there is nothing to check
fn without_rules() -> Monitor {
    Monitor::new("C. Monitor without rules").with_action(Message("hi there!"))
}

// D. Every rule form
fn all_rule_forms() -> Result<Monitor> {
    let group = CheckGroup::new("FinishedChecks")
        .with_setup(|_: &FactContext| Ok(()))
        .with_teardown(|_: &FactContext| Ok(()))
        .check("test_a", finished)
        .check("test_b", finished);

    let monitor = Monitor::new("D. All rule type definitions")
        .with_rules([
            Rule::predicate(|facts: &FactContext| finished(facts)),
            Rule::expression("stats.finish_reason == \"finished\""),
            Rule::predicate(finished),
            Rule::object(FinishedRule),
            Rule::group(group),
        ])?
        .with_action(Noop);
    Ok(monitor)
}

// E. Explicit names
fn naming() -> Result<Monitor> {
    let mut monitor = Monitor::new("E. Naming rules and actions")
        .with_rules([
            Rule::predicate(finished).named("Rule 1"),
            Rule::predicate(finished).named("Rule 2"),
        ])?
        .with_action(Action::object(Noop).named("Action 1"));
    monitor.add_rule(Rule::predicate(finished).named("Rule 3"))?;
    monitor.add_action(Action::object(Noop).named("Action 2"));
    Ok(monitor)
}

// F. Severities and triggers
fn levels_and_triggers() -> Result<Monitor> {
    let mut monitor = Monitor::new("F. Rule levels and action triggers")
        .with_rules([
            Rule::expression("stats.finish_reason == \"finished\"")
                .named("Rule High")
                .severity(Severity::High),
            Rule::expression("stats.finish_reason != \"finished\"")
                .named("Rule Normal")
                .severity(Severity::Normal),
            Rule::expression("stats.finish_reason != \"finished\"")
                .named("Rule Low")
                .severity(Severity::Low),
        ])?
        .with_actions([
            Action::object(Noop).named("Action runs always"),
            Action::object(Noop).named("Action runs always").on(Trigger::Always),
            Action::object(Noop).named("Action runs on passed").on(Trigger::Passed),
            Action::object(Noop).named("Action runs on failed").on(Trigger::Failed),
            Action::object(Noop).named("Action runs on error").on(Trigger::Error),
        ]);
    monitor.add_rule(Rule::predicate(finished).named("Rule Low 2").severity(Severity::Low))?;
    monitor.add_action(Action::object(Noop).named("Action on passed").on(Trigger::Passed));
    Ok(monitor)
}

// G. A raising rule and a raising action
fn errors() -> Result<Monitor> {
    let monitor = Monitor::new("G. Rule and Action Errors")
        .with_rule("stats.a_non_existing_key == \"whatever\"")?
        .with_action(Action::object(Bomb).named("Action on error").on(Trigger::Error));
    Ok(monitor)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let stats = stats()?;
    let monitors = vec![
        from_parameters()?,
        adding_rules_and_actions()?,
        without_rules(),
        all_rule_forms()?,
        naming()?,
        levels_and_triggers()?,
        errors()?,
    ];

    for monitor in &monitors {
        let result = monitor.run(&stats);
        println!("{}", TextReport::render(&result));
        println!();
    }
    Ok(())
}
