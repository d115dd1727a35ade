//! Stat threshold monitors
//!
//! A [`StatMonitor`] compares one numeric job stat against a threshold read
//! from a setting or computed from the facts. A missing threshold setting
//! skips the whole monitor; a missing stat fails or skips the rule
//! depending on `fail_if_stat_missing`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use vigil_core::{FactContext, SettingsLookup, Value};
use vigil_runtime::{ensure, skip, AdaptError, CheckError, Monitor, NotConfigured, Rule};

/// Comparison applied as `stat <op> threshold`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

impl Comparison {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
        }
    }

    pub fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::Gt => value > threshold,
            Comparison::Ge => value >= threshold,
            Comparison::Lt => value < threshold,
            Comparison::Le => value <= threshold,
            Comparison::Eq => value == threshold,
            Comparison::Ne => value != threshold,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Comparison {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            ">" => Ok(Comparison::Gt),
            ">=" => Ok(Comparison::Ge),
            "<" => Ok(Comparison::Lt),
            "<=" => Ok(Comparison::Le),
            "==" => Ok(Comparison::Eq),
            "!=" => Ok(Comparison::Ne),
            other => Err(format!("Unknown comparison: {}", other)),
        }
    }
}

/// How a threshold setting is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThresholdType {
    Int,
    #[default]
    Float,
}

type ThresholdFn = Arc<dyn Fn(&FactContext) -> Result<f64, CheckError> + Send + Sync>;

enum Threshold {
    Setting { key: String, datatype: ThresholdType },
    Computed(ThresholdFn),
}

/// Builder of a single-rule monitor checking a stat against a threshold
pub struct StatMonitor {
    name: String,
    description: Option<String>,
    stat: String,
    comparison: Comparison,
    threshold: Option<Threshold>,
    fail_if_stat_missing: bool,
    validators: Vec<Box<dyn Fn(&FactContext) -> Result<(), NotConfigured> + Send + Sync>>,
}

impl StatMonitor {
    pub fn new(name: impl Into<String>, stat: impl Into<String>, comparison: Comparison) -> Self {
        Self {
            name: name.into(),
            description: None,
            stat: stat.into(),
            comparison,
            threshold: None,
            fail_if_stat_missing: true,
            validators: Vec::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Read the threshold from `key`, as a float
    pub fn threshold_setting(self, key: impl Into<String>) -> Self {
        self.typed_threshold_setting(key, ThresholdType::Float)
    }

    pub fn typed_threshold_setting(mut self, key: impl Into<String>, datatype: ThresholdType) -> Self {
        self.threshold = Some(Threshold::Setting {
            key: key.into(),
            datatype,
        });
        self
    }

    /// Compute the threshold from the facts at evaluation time
    pub fn threshold_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&FactContext) -> Result<f64, CheckError> + Send + Sync + 'static,
    {
        self.threshold = Some(Threshold::Computed(Arc::new(f)));
        self
    }

    /// Fail (default) or skip when the stat is absent
    pub fn fail_if_stat_missing(mut self, fail: bool) -> Self {
        self.fail_if_stat_missing = fail;
        self
    }

    /// Extra configuration validator
    pub fn requires<F>(mut self, f: F) -> Self
    where
        F: Fn(&FactContext) -> Result<(), NotConfigured> + Send + Sync + 'static,
    {
        self.validators.push(Box::new(f));
        self
    }

    pub fn build(self, settings: Arc<dyn SettingsLookup>) -> Result<Monitor, AdaptError> {
        let StatMonitor {
            name,
            description,
            stat,
            comparison,
            threshold,
            fail_if_stat_missing,
            validators,
        } = self;

        let mut monitor = Monitor::new(&name);
        if let Some(description) = description {
            monitor = monitor.describe(description);
        }

        let threshold = match threshold {
            Some(threshold) => threshold,
            None => {
                let reason = format!(
                    "{} should include a threshold setting or a threshold function",
                    name
                );
                return Ok(monitor.requires(move |_| Err(NotConfigured::new(reason.clone()))));
            }
        };

        let rule_name = match &threshold {
            Threshold::Setting { key, .. } => format!("{} {} {}", stat, comparison, key),
            Threshold::Computed(_) => format!("{} {} threshold", stat, comparison),
        };

        if let Threshold::Setting { key, .. } = &threshold {
            let key = key.clone();
            let settings = settings.clone();
            let monitor_name = name.clone();
            monitor = monitor.requires(move |_| {
                if settings.contains(&key) {
                    Ok(())
                } else {
                    Err(NotConfigured::new(format!(
                        "Configure {} to your project settings to use {}.",
                        key, monitor_name
                    )))
                }
            });
        }
        for validator in validators {
            monitor = monitor.requires(validator);
        }

        let check = move |facts: &FactContext| -> Result<(), CheckError> {
            let threshold = match &threshold {
                Threshold::Setting { key, datatype } => match datatype {
                    ThresholdType::Int => settings.get_int(key, 0)? as f64,
                    ThresholdType::Float => settings.get_float(key, 0.0)?,
                },
                Threshold::Computed(f) => f(facts)?,
            };

            if !facts.contains(&stat) {
                let message = format!("Unable to find '{}' in job stats.", stat);
                return Err(if fail_if_stat_missing {
                    CheckError::Failed(message)
                } else {
                    skip(message)
                });
            }

            let value = facts.get(&stat)?;
            let number = value.as_f64().ok_or_else(|| {
                anyhow::anyhow!("Stat '{}' is not numeric: {}", stat, value)
            })?;
            ensure(
                comparison.holds(number, threshold),
                format!(
                    "Expecting '{}' to be '{}' to '{}'. Current value: '{}'",
                    stat,
                    comparison,
                    Value::from(threshold),
                    value
                ),
            )
        };

        monitor.with_rule(Rule::predicate(check).named(rule_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::Settings;
    use vigil_runtime::Status;

    fn settings(pairs: &[(&str, i64)]) -> Arc<dyn SettingsLookup> {
        let mut settings = Settings::new();
        for (key, value) in pairs {
            settings.set(key, *value);
        }
        Arc::new(settings)
    }

    fn facts(pairs: &[(&str, i64)]) -> FactContext {
        pairs.iter().map(|(k, v)| (*k, Value::from(*v))).collect()
    }

    #[test]
    fn test_threshold_message() {
        let monitor = StatMonitor::new("Extracted Items Monitor", "item_scraped_count", Comparison::Ge)
            .typed_threshold_setting("SPIDERMON_MIN_ITEMS", ThresholdType::Int)
            .build(settings(&[("SPIDERMON_MIN_ITEMS", 100)]))
            .unwrap();

        let node = monitor.run(&facts(&[("item_scraped_count", 10)]));
        assert_eq!(node.status, Status::Failed);
        assert_eq!(
            node.children[0].message.as_deref(),
            Some("Expecting 'item_scraped_count' to be '>=' to '100'. Current value: '10'")
        );
        assert_eq!(node.children[0].name, "item_scraped_count >= SPIDERMON_MIN_ITEMS");

        assert_eq!(
            monitor.run(&facts(&[("item_scraped_count", 100)])).status,
            Status::Passed
        );
    }

    #[test]
    fn test_missing_setting_is_not_configured() {
        let monitor = StatMonitor::new("Error Count Monitor", "log_count/ERROR", Comparison::Le)
            .threshold_setting("SPIDERMON_MAX_ERRORS")
            .build(settings(&[]))
            .unwrap();
        let node = monitor.run(&facts(&[("log_count/ERROR", 1)]));
        assert_eq!(node.status, Status::Skipped);
        assert_eq!(
            node.message.as_deref(),
            Some("Configure SPIDERMON_MAX_ERRORS to your project settings to use Error Count Monitor.")
        );
    }

    #[test]
    fn test_missing_stat_fails_or_skips() {
        let failing = StatMonitor::new("m", "item_scraped_count", Comparison::Ge)
            .threshold_setting("SPIDERMON_MIN_ITEMS")
            .build(settings(&[("SPIDERMON_MIN_ITEMS", 1)]))
            .unwrap();
        let node = failing.run(&FactContext::default());
        assert_eq!(node.status, Status::Failed);
        assert_eq!(
            node.children[0].message.as_deref(),
            Some("Unable to find 'item_scraped_count' in job stats.")
        );

        let skipping = StatMonitor::new("m", "log_count/ERROR", Comparison::Le)
            .threshold_setting("SPIDERMON_MAX_ERRORS")
            .fail_if_stat_missing(false)
            .build(settings(&[("SPIDERMON_MAX_ERRORS", 0)]))
            .unwrap();
        assert_eq!(skipping.run(&FactContext::default()).status, Status::Skipped);
    }

    #[test]
    fn test_computed_threshold() {
        let monitor = StatMonitor::new("Error ratio", "log_count/ERROR", Comparison::Lt)
            .threshold_fn(|facts: &FactContext| {
                let items = facts.get("item_scraped_count")?.as_f64().unwrap_or(0.0);
                Ok(items * 0.01)
            })
            .build(settings(&[]))
            .unwrap();

        let node = monitor.run(&facts(&[("item_scraped_count", 1000), ("log_count/ERROR", 20)]));
        assert_eq!(node.status, Status::Failed);
        assert_eq!(
            node.children[0].message.as_deref(),
            Some("Expecting 'log_count/ERROR' to be '<' to '10'. Current value: '20'")
        );
    }

    #[test]
    fn test_without_threshold_is_not_configured() {
        let monitor = StatMonitor::new("Custom", "x", Comparison::Eq)
            .build(settings(&[]))
            .unwrap();
        assert_eq!(monitor.run(&facts(&[("x", 1)])).status, Status::Skipped);
    }

    #[test]
    fn test_comparison_parse() {
        assert_eq!(">=".parse::<Comparison>().unwrap(), Comparison::Ge);
        assert!("=~".parse::<Comparison>().is_err());
        assert!(Comparison::Ne.holds(1.0, 2.0));
    }
}
