//! Unit tests for vigil-runtime
//!
//! Covers rule forms, outcome aggregation, trigger semantics, suites,
//! reporting and the definition loader through the public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use vigil_runtime::{
    Action, ActionHandler, ActionState, Check, CheckError, CheckGroup, CheckResult, FactContext,
    JsonReport, Loader, Monitor, MonitorSuite, NodeKind, NotConfigured, Outcome, Registry,
    ResultNode, Rule, Runner, Severity, Status, TextReport, Trigger,
};

fn finished_stats() -> FactContext {
    FactContext::from_json(serde_json::json!({
        "finish_reason": "finished",
        "downloader/response_count": 63785
    }))
    .unwrap()
}

fn failed_stats() -> FactContext {
    FactContext::from_json(serde_json::json!({
        "finish_reason": "failed",
        "downloader/response_count": 5
    }))
    .unwrap()
}

/// Counts how many times it ran
#[derive(Clone, Default)]
struct Counter(Arc<AtomicUsize>);

impl Counter {
    fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl ActionHandler for Counter {
    fn run(&self, _result: &ResultNode) -> anyhow::Result<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct BombAction;

impl ActionHandler for BombAction {
    fn run(&self, _result: &ResultNode) -> anyhow::Result<()> {
        anyhow::bail!("Boom!")
    }
}

fn is_finished(facts: &FactContext) -> CheckResult {
    Ok(facts.get("finish_reason")?.as_str() == Some("finished"))
}

struct FinishedCheck;

impl Check for FinishedCheck {
    fn check(&self, facts: &FactContext) -> CheckResult {
        is_finished(facts)
    }
}

// ========== Rule Form Tests ==========

/// One rule per supported form, all checking the same condition
fn every_form() -> Vec<Rule> {
    vec![
        Rule::predicate(is_finished),
        Rule::expression("stats.finish_reason == 'finished'"),
        Rule::object(FinishedCheck),
        Rule::group(CheckGroup::new("FinishedCase").check("test_finished", is_finished)),
    ]
}

#[test]
fn test_every_rule_form_yields_the_same_outcome() {
    for (stats, expected) in [(finished_stats(), Status::Passed), (failed_stats(), Status::Failed)] {
        let monitor = Monitor::new("forms").with_rules(every_form()).unwrap();
        let node = monitor.run(&stats);
        assert_eq!(node.children.len(), 4);
        assert!(node.children.iter().all(|c| c.status == expected));
    }
}

#[test]
fn test_default_names() {
    let monitor = Monitor::new("names")
        .with_rule(Rule::predicate(|_: &FactContext| true))
        .unwrap()
        .with_rule("stats.finish_reason == 'finished'")
        .unwrap()
        .with_rule(Rule::predicate(is_finished))
        .unwrap()
        .with_rule(Rule::object(FinishedCheck))
        .unwrap()
        .with_rule(Rule::predicate(|_: &FactContext| true).named("Rule 5"))
        .unwrap();

    assert_eq!(
        monitor.rule_names(),
        vec![
            "rule #1",
            "stats.finish_reason == 'finished'",
            "is_finished",
            "FinishedCheck",
            "Rule 5"
        ]
    );
}

#[test]
fn test_severity_is_informational() {
    let monitor = Monitor::new("levels")
        .with_rule(Rule::expression("false").named("low").severity(Severity::Low))
        .unwrap()
        .with_rule(Rule::expression("false").named("high").severity(Severity::High))
        .unwrap();

    let node = monitor.run(&finished_stats());
    assert_eq!(node.status, Status::Failed);
    let failures: Vec<&str> = node.failures().iter().map(|n| n.name.as_str()).collect();
    assert_eq!(failures, vec!["high", "low"]);
}

#[test]
fn test_custom_failure_message() {
    let monitor = Monitor::new("m")
        .with_rule(Rule::predicate(is_finished).failure_message("Spider did not finish"))
        .unwrap();
    let node = monitor.run(&failed_stats());
    assert_eq!(node.children[0].message.as_deref(), Some("Spider did not finish"));
}

// ========== Aggregation Tests ==========

#[test]
fn test_aggregate_precedence() {
    let cases = [
        (vec!["true", "true"], Status::Passed),
        (vec!["true", "false"], Status::Failed),
        (vec!["false", "stats.missing == 1"], Status::Errored),
        (vec!["stats.missing == 1", "true"], Status::Errored),
    ];

    for (rules, expected) in cases {
        let monitor = Monitor::new("m").with_rules(rules.clone()).unwrap();
        let node = monitor.run(&finished_stats());
        assert_eq!(node.status, expected, "rules {:?}", rules);
        assert_eq!(node.children.len(), rules.len());
    }
}

#[test]
fn test_raising_rule_yields_one_errored_outcome() {
    let monitor = Monitor::new("m")
        .with_rule(Rule::predicate(|_: &FactContext| -> CheckResult {
            Err(CheckError::Error(anyhow::anyhow!("upstream down")))
        }))
        .unwrap()
        .with_rule("true")
        .unwrap();

    let node = monitor.run(&finished_stats());
    assert_eq!(node.counts().errored, 1);
    assert_eq!(node.counts().passed, 1);
    match node.children[0].outcome.as_ref().unwrap() {
        Outcome::Errored { message, .. } => assert_eq!(message, "upstream down"),
        other => panic!("Expected Errored, got {:?}", other),
    }
}

// ========== Trigger Tests ==========

#[test]
fn test_triggers_follow_aggregate_status() {
    for (rule, status) in [
        ("true", Status::Passed),
        ("false", Status::Failed),
        ("stats.missing", Status::Errored),
    ] {
        let counters: Vec<Counter> = (0..4).map(|_| Counter::default()).collect();
        let monitor = Monitor::new("m")
            .with_rule(rule)
            .unwrap()
            .with_action(Action::object(counters[0].clone()).on(Trigger::Always))
            .with_action(Action::object(counters[1].clone()).on(Trigger::Passed))
            .with_action(Action::object(counters[2].clone()).on(Trigger::Failed))
            .with_action(Action::object(counters[3].clone()).on(Trigger::Error));

        let node = monitor.run(&finished_stats());
        assert_eq!(node.status, status);
        let fired: Vec<usize> = counters.iter().map(Counter::get).collect();
        let expected = match status {
            Status::Passed => vec![1, 1, 0, 0],
            Status::Failed => vec![1, 0, 1, 0],
            _ => vec![1, 0, 0, 1],
        };
        assert_eq!(fired, expected, "status {}", status);
    }
}

#[test]
fn test_not_configured_monitor_fires_only_always_actions() {
    let always = Counter::default();
    let others: Vec<Counter> = (0..3).map(|_| Counter::default()).collect();
    let monitor = Monitor::new("m")
        .requires(|_| Err(NotConfigured::new("SPIDERMON_MAX_ERRORS setting is not configured")))
        .with_rule("false")
        .unwrap()
        .with_action(Action::object(always.clone()))
        .with_action(Action::object(others[0].clone()).on(Trigger::Passed))
        .with_action(Action::object(others[1].clone()).on(Trigger::Failed))
        .with_action(Action::object(others[2].clone()).on(Trigger::Error));

    let node = monitor.run(&finished_stats());
    assert_eq!(node.status, Status::Skipped);
    assert!(node.children.is_empty());
    assert_eq!(always.get(), 1);
    assert!(others.iter().all(|c| c.get() == 0));
}

// ========== Scenario Tests ==========

fn scenario_monitor(passed: &Counter, failed: &Counter) -> Monitor {
    Monitor::new("Scenario")
        .with_rules(vec![
            "stats.finish_reason == 'finished'",
            "stats['downloader/response_count'] > 10000",
        ])
        .unwrap()
        .with_action(Action::object(passed.clone()).named("on passed").on(Trigger::Passed))
        .with_action(Action::object(failed.clone()).named("on failed").on(Trigger::Failed))
}

#[test]
fn test_scenario_finished_crawl_passes() {
    let (passed, failed) = (Counter::default(), Counter::default());
    let result = Runner::run(&scenario_monitor(&passed, &failed), finished_stats());
    assert_eq!(result.status, Status::Passed);
    assert_eq!(passed.get(), 1);
    assert_eq!(failed.get(), 0);
}

#[test]
fn test_scenario_failed_crawl_fails_both_rules() {
    let (passed, failed) = (Counter::default(), Counter::default());
    let result = Runner::run(&scenario_monitor(&passed, &failed), failed_stats());
    assert_eq!(result.status, Status::Failed);
    assert!(result.children.iter().all(|c| c.status == Status::Failed));
    assert_eq!(passed.get(), 0);
    assert_eq!(failed.get(), 1);
    assert_eq!(result.actions[0].state, ActionState::NotTriggered);
    assert_eq!(result.actions[1].state, ActionState::Executed);
}

#[test]
fn test_scenario_missing_key_errors_and_bomb_is_contained() {
    let after = Counter::default();
    let monitor = Monitor::new("Errors")
        .with_rule("stats.a_non_existing_key == \"whatever\"")
        .unwrap()
        .with_action(Action::object(BombAction).named("Bomb").on(Trigger::Error))
        .with_action(Action::object(after.clone()).on(Trigger::Error));

    let result = Runner::run(&monitor, finished_stats());
    assert_eq!(result.status, Status::Errored);
    assert_eq!(
        result.children[0].message.as_deref(),
        Some("Key not found: a_non_existing_key")
    );
    assert_eq!(
        result.actions[0].state,
        ActionState::Errored {
            message: "Boom!".to_string()
        }
    );
    assert_eq!(after.get(), 1);
}

// ========== Suite Tests ==========

#[test]
fn test_suite_isolates_monitors() {
    let suite = MonitorSuite::new("root")
        .with_monitor(Monitor::new("errors").with_rule("stats.missing").unwrap())
        .with_monitor(Monitor::new("ok").with_rule("true").unwrap())
        .with_suite(
            MonitorSuite::new("nested")
                .with_monitor(Monitor::new("skipped").requires(|_| Err(NotConfigured::new("nope")))),
        );

    let result = Runner::run(&suite, finished_stats());
    let statuses: Vec<Status> = result.children.iter().map(|c| c.status).collect();
    assert_eq!(statuses, vec![Status::Errored, Status::Passed, Status::Skipped]);
    assert_eq!(result.status, Status::Failed);
}

#[test]
fn test_group_lifecycle_through_runner() {
    let events = Arc::new(Mutex::new(Vec::<String>::new()));
    let (setup, teardown) = (events.clone(), events.clone());
    let group = CheckGroup::new("ATestCase")
        .with_setup(move |_| {
            setup.lock().unwrap().push("setUp".to_string());
            Ok(())
        })
        .with_teardown(move |_| {
            teardown.lock().unwrap().push("tearDown".to_string());
            Ok(())
        })
        .check("test_a", |_: &FactContext| true)
        .check_with_severity("test_b", Severity::High, |_: &FactContext| false);

    let monitor = Monitor::new("m")
        .with_rule(Rule::group(group))
        .unwrap()
        .with_rule("true")
        .unwrap();
    let result = Runner::run(&monitor, finished_stats());

    assert_eq!(*events.lock().unwrap(), vec!["setUp", "tearDown"]);
    assert_eq!(monitor.rule_names(), vec!["test_a", "test_b", "true"]);
    assert_eq!(result.children[1].severity, Some(Severity::High));
    assert_eq!(result.status, Status::Failed);
}

// ========== Report Tests ==========

#[test]
fn test_json_round_trip_preserves_tree() {
    let suite = MonitorSuite::new("root")
        .with_monitor(
            Monitor::new("m1")
                .with_rules(vec!["true", "false", "stats.missing"])
                .unwrap()
                .with_action(Action::object(BombAction).named("bomb")),
        )
        .with_suite(MonitorSuite::new("nested").with_monitor(Monitor::new("m2").with_rule("true").unwrap()));

    let result = Runner::run(&suite, finished_stats());
    let json = JsonReport::to_json(&result).unwrap();
    let back = JsonReport::from_json(&json).unwrap();

    assert_eq!(back.node_count(), result.node_count());
    let shape = |node: &ResultNode| -> Vec<(usize, String, NodeKind, Status)> {
        node.walk()
            .map(|(depth, n)| (depth, n.name.clone(), n.kind, n.status))
            .collect()
    };
    assert_eq!(shape(&back), shape(&result));
    assert_eq!(back.counts(), result.counts());
}

#[test]
fn test_text_report_lists_every_node() {
    let monitor = Monitor::new("Finish Reason")
        .with_rule(Rule::expression("stats.finish_reason == 'finished'").named("finished"))
        .unwrap();
    let suite = MonitorSuite::new("Spider Close").with_monitor(monitor);

    let text = TextReport::render(&Runner::run(&suite, failed_stats()));
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "[FAILED] Spider Close");
    assert_eq!(lines[1], "  [FAILED] Finish Reason");
    assert_eq!(
        lines[2],
        "    [FAILED] finished (NORMAL): Expression is false: stats.finish_reason == 'finished'"
    );
    assert_eq!(lines[3], "1 rules: 0 passed, 1 failed, 0 errored, 0 skipped");
}

// ========== Loader Tests ==========

#[test]
fn test_loader_with_registered_handler() {
    let counter = Counter::default();
    let registry = Registry::new().with_handler("count", counter.clone());
    let yaml = r#"
monitor:
  name: Finish reason
  rules:
    - expression: "stats.finish_reason in ['finished', 'shutdown']"
  actions:
    - kind: handler
      handler: count
      trigger: FAILED
"#;

    let loaded = Loader::new(&registry).load_yaml(yaml).unwrap();
    let result = Runner::run(&loaded, failed_stats());
    assert_eq!(result.status, Status::Failed);
    assert_eq!(result.actions[0].name, "count");
    assert_eq!(counter.get(), 1);
}
