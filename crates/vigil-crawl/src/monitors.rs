//! Stock crawl monitors
//!
//! Each constructor returns a ready [`Monitor`] reading its thresholds from
//! `settings` when it runs, so one settings source can back many runs.

use crate::keys::*;
use crate::stat::{Comparison, StatMonitor, ThresholdType};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use vigil_core::{FactContext, SettingsLookup, Value};
use vigil_runtime::{ensure, AdaptError, CheckError, Monitor, NotConfigured, Rule};

/// Codes checked when `SPIDERMON_UNWANTED_HTTP_CODES` is not set
pub const DEFAULT_UNWANTED_HTTP_CODES: [i64; 10] = [400, 407, 429, 500, 502, 503, 504, 523, 540, 541];
pub const DEFAULT_UNWANTED_HTTP_CODES_MAX_COUNT: i64 = 10;

/// Source of the current time for execution time checks
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

type MonitorResult = Result<Monitor, AdaptError>;

// ========== Stat Threshold Monitors ==========

pub fn item_count_monitor(settings: Arc<dyn SettingsLookup>) -> MonitorResult {
    StatMonitor::new("Extracted Items Monitor", "item_scraped_count", Comparison::Ge)
        .describe("Check if spider extracted the minimum number of items")
        .typed_threshold_setting(SPIDERMON_MIN_ITEMS, ThresholdType::Int)
        .build(settings)
}

pub fn critical_count_monitor(settings: Arc<dyn SettingsLookup>) -> MonitorResult {
    log_count_monitor("Critical Count Monitor", "CRITICAL", SPIDERMON_MAX_CRITICALS, settings)
}

pub fn error_count_monitor(settings: Arc<dyn SettingsLookup>) -> MonitorResult {
    log_count_monitor("Error Count Monitor", "ERROR", SPIDERMON_MAX_ERRORS, settings)
}

pub fn warning_count_monitor(settings: Arc<dyn SettingsLookup>) -> MonitorResult {
    log_count_monitor("Warning Count Monitor", "WARNING", SPIDERMON_MAX_WARNINGS, settings)
}

fn log_count_monitor(
    name: &str,
    level: &str,
    key: &str,
    settings: Arc<dyn SettingsLookup>,
) -> MonitorResult {
    StatMonitor::new(name, format!("log_count/{}", level), Comparison::Le)
        .describe(format!(
            "Check for {} level log messages above the allowed maximum",
            level
        ))
        .typed_threshold_setting(key, ThresholdType::Int)
        .fail_if_stat_missing(false)
        .build(settings)
}

pub fn downloader_exception_monitor(settings: Arc<dyn SettingsLookup>) -> MonitorResult {
    StatMonitor::new(
        "Downloader Exceptions monitor",
        "downloader/exception_count",
        Comparison::Le,
    )
    .describe("Check the amount of downloader exceptions")
    .typed_threshold_setting(SPIDERMON_MAX_DOWNLOADER_EXCEPTIONS, ThresholdType::Int)
    .fail_if_stat_missing(false)
    .build(settings)
}

pub fn item_validation_monitor(settings: Arc<dyn SettingsLookup>) -> MonitorResult {
    StatMonitor::new(
        "Item Validation Monitor",
        "spidermon/validation/fields/errors",
        Comparison::Le,
    )
    .describe("Check the amount of item field validation errors")
    .typed_threshold_setting(SPIDERMON_MAX_ITEM_VALIDATION_ERRORS, ThresholdType::Int)
    .fail_if_stat_missing(false)
    .build(settings)
}

// ========== Job Outcome Monitors ==========

/// Fails when the job finished for a reason outside `SPIDERMON_EXPECTED_FINISH_REASONS`
pub fn finish_reason_monitor(settings: Arc<dyn SettingsLookup>) -> MonitorResult {
    let check = move |facts: &FactContext| -> Result<(), CheckError> {
        let expected = settings.get_list(
            SPIDERMON_EXPECTED_FINISH_REASONS,
            vec![Value::from("finished")],
        )?;
        let reason = facts.get_or("finish_reason", Value::Null);
        ensure(
            expected.contains(&reason),
            format!(
                "Finished with \"{}\" the expected reasons are {}",
                reason,
                Value::Array(expected.clone())
            ),
        )
    };

    Monitor::new("Finish Reason Monitor")
        .describe("Check if a job has an expected finish reason")
        .with_rule(Rule::predicate(check).named("Should have the expected finished reason(s)"))
}

/// Fails on the first unwanted status code seen more often than allowed
///
/// `SPIDERMON_UNWANTED_HTTP_CODES` may be a list of codes sharing
/// `SPIDERMON_UNWANTED_HTTP_CODES_MAX_COUNT`, or a dict of code to its own
/// maximum.
pub fn unwanted_http_codes_monitor(settings: Arc<dyn SettingsLookup>) -> MonitorResult {
    let check = move |facts: &FactContext| -> Result<(), CheckError> {
        let default_max = settings.get_int(
            SPIDERMON_UNWANTED_HTTP_CODES_MAX_COUNT,
            DEFAULT_UNWANTED_HTTP_CODES_MAX_COUNT,
        )?;
        let default_codes = Value::Array(
            DEFAULT_UNWANTED_HTTP_CODES
                .iter()
                .map(|code| Value::from(*code))
                .collect(),
        );
        let codes = settings.get_dict_or_list(SPIDERMON_UNWANTED_HTTP_CODES, default_codes)?;

        for (code, max) in unwanted_limits(&codes, default_max)? {
            let count = facts
                .get_or(&format!("downloader/response_status_count/{}", code), 0)
                .as_f64()
                .unwrap_or(0.0);
            ensure(
                count <= max as f64,
                format!(
                    "Found {} Responses with status code={} - This exceed the limit of {}",
                    Value::from(count),
                    code,
                    max
                ),
            )?;
        }
        Ok(())
    };

    Monitor::new("Unwanted HTTP codes monitor")
        .describe("Check for maximum number of unwanted HTTP codes")
        .with_rule(Rule::predicate(check).named("Should not hit the limit of unwanted http status"))
}

/// `(code, max)` pairs sorted by code
fn unwanted_limits(codes: &Value, default_max: i64) -> Result<Vec<(i64, i64)>, CheckError> {
    let mut limits = Vec::new();
    match codes {
        Value::Object(map) => {
            for (code, max) in map {
                let code = parse_code(&Value::from(code.as_str()))?;
                limits.push((code, max.as_i64().unwrap_or(default_max)));
            }
        }
        Value::Array(items) => {
            for code in items {
                limits.push((parse_code(code)?, default_max));
            }
        }
        other => {
            return Err(anyhow::anyhow!("Invalid unwanted HTTP codes: {}", other).into());
        }
    }
    limits.sort();
    Ok(limits)
}

fn parse_code(code: &Value) -> Result<i64, CheckError> {
    let parsed = match code {
        Value::String(s) => s.trim().parse::<i64>().ok(),
        other => other.as_i64(),
    };
    parsed.ok_or_else(|| anyhow::anyhow!("Invalid HTTP status code: {}", code).into())
}

pub fn retry_count_monitor(settings: Arc<dyn SettingsLookup>) -> MonitorResult {
    let check = move |facts: &FactContext| -> Result<(), CheckError> {
        let max = settings.get_int(SPIDERMON_MAX_RETRIES, -1)?;
        let reached = stat_count(facts, "retry/max_reached");
        ensure(
            max < 0 || reached <= max as f64,
            format!(
                "Too many requests ({}) reached the maximum retry amount",
                Value::from(reached)
            ),
        )
    };

    Monitor::new("Retry Count monitor")
        .describe("Check if any requests have reached the maximum amount of retries")
        .with_rule(
            Rule::predicate(check)
                .named("Should not hit the limit of requests that reached the maximum retry amount"),
        )
}

pub fn successful_requests_monitor(settings: Arc<dyn SettingsLookup>) -> MonitorResult {
    let check = move |facts: &FactContext| -> Result<(), CheckError> {
        let minimum = settings.get_int(SPIDERMON_MIN_SUCCESSFUL_REQUESTS, 0)?;
        let successful = stat_count(facts, "downloader/response_status_count/200");
        ensure(
            successful >= minimum as f64,
            format!("Too few ({}) successful requests", Value::from(successful)),
        )
    };

    Monitor::new("Successful Requests monitor")
        .describe("Check the amount of successful requests")
        .with_rule(
            Rule::predicate(check)
                .named("Should have at least the minimum number of successful requests"),
        )
}

pub fn total_requests_monitor(settings: Arc<dyn SettingsLookup>) -> MonitorResult {
    let check = move |facts: &FactContext| -> Result<(), CheckError> {
        let max = settings.get_int(SPIDERMON_MAX_REQUESTS_ALLOWED, -1)?;
        let requests = stat_count(facts, "downloader/request_count");
        ensure(
            max < 0 || requests <= max as f64,
            format!("Too many ({}) requests", Value::from(requests)),
        )
    };

    Monitor::new("Total Requests monitor")
        .describe("Check the total amount of requests")
        .with_rule(Rule::predicate(check).named("Should not hit the total limit of requests"))
}

fn stat_count(facts: &FactContext, stat: &str) -> f64 {
    facts.get_or(stat, 0).as_f64().unwrap_or(0.0)
}

// ========== Field Coverage ==========

/// Compares per-field coverage stats with `SPIDERMON_FIELD_COVERAGE_RULES`
///
/// Skipped unless `SPIDERMON_ADD_FIELD_COVERAGE` is enabled.
pub fn field_coverage_monitor(settings: Arc<dyn SettingsLookup>) -> MonitorResult {
    let enabled = settings.clone();
    let check = move |facts: &FactContext| -> Result<(), CheckError> {
        let rules = settings.get_dict(SPIDERMON_FIELD_COVERAGE_RULES, HashMap::new())?;
        let mut fields: Vec<(&String, &Value)> = rules.iter().collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));

        let mut failures = Vec::new();
        for (field, expected) in fields {
            let expected = expected.as_f64().ok_or_else(|| {
                anyhow::anyhow!("Invalid coverage for field {}: {}", field, expected)
            })?;
            let actual = facts
                .get_or(&format!("spidermon_field_coverage/{}", field), 0)
                .as_f64()
                .unwrap_or(0.0);
            if actual < expected {
                failures.push(format!(
                    "{} (expected {}, got {})",
                    field,
                    Value::from(expected),
                    Value::from(actual)
                ));
            }
        }

        ensure(
            failures.is_empty(),
            format!(
                "The following items did not meet field coverage rules:\n{}",
                failures.join("\n")
            ),
        )
    };

    Monitor::new("Field Coverage Monitor")
        .describe("Validate if field coverage rules are met")
        .requires(move |_| {
            match enabled.get_bool(SPIDERMON_ADD_FIELD_COVERAGE, false) {
                Ok(true) => Ok(()),
                _ => Err(NotConfigured::new(
                    "To enable field coverage monitor, set SPIDERMON_ADD_FIELD_COVERAGE=True in your project settings",
                )),
            }
        })
        .with_rule(Rule::predicate(check).named("Should meet field coverage rules"))
}

// ========== Periodic Monitors ==========

pub fn periodic_execution_time_monitor(settings: Arc<dyn SettingsLookup>) -> MonitorResult {
    periodic_execution_time_monitor_with_clock(settings, Arc::new(Utc::now))
}

/// Fails once the job has run for `SPIDERMON_MAX_EXECUTION_TIME` seconds
///
/// A zero or absent maximum and a missing `start_time` stat both pass.
pub fn periodic_execution_time_monitor_with_clock(
    settings: Arc<dyn SettingsLookup>,
    clock: Clock,
) -> MonitorResult {
    let check = move |facts: &FactContext| -> Result<(), CheckError> {
        let max = settings.get_int(SPIDERMON_MAX_EXECUTION_TIME, 0)?;
        if max <= 0 {
            return Ok(());
        }
        let start = match facts.get_or("start_time", Value::Null).as_timestamp() {
            Some(start) => start,
            None => return Ok(()),
        };
        let elapsed = (clock() - start).num_seconds();
        ensure(
            elapsed < max,
            "The job has exceeded the maximum execution time",
        )
    };

    Monitor::new("Periodic execution time monitor")
        .describe("Check for runtime exceeding a target maximum runtime")
        .with_rule(Rule::predicate(check).named("Maximum execution time reached"))
}
