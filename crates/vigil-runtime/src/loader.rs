//! Definition loader
//!
//! Adapts parsed suite and monitor definitions into runnable values. Every
//! name, level, trigger and registry reference is resolved here, so a bad
//! definition fails before any run starts.

use crate::action::{Action, ActionHandler};
use crate::actions::{LogAction, WebhookAction, DEFAULT_TIMEOUT_SECS};
use crate::error::AdaptError;
use crate::monitor::Monitor;
use crate::outcome::NotConfigured;
use crate::result::ResultNode;
use crate::rule::{Check, Rule};
use crate::runner::Runnable;
use crate::suite::MonitorSuite;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use vigil_core::{FactContext, Severity, SettingsLookup, Trigger};
use vigil_parser::{
    ActionDefinition, Definition, DefinitionParser, MonitorDefinition, RuleDefinition,
    SuiteDefinition,
};

/// Checks and action handlers that definitions may refer to by name
#[derive(Clone, Default)]
pub struct Registry {
    checks: HashMap<String, Arc<dyn Check>>,
    handlers: HashMap<String, Arc<dyn ActionHandler>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a check for `kind: check` rules
    pub fn register_check(&mut self, name: impl Into<String>, check: impl Check + 'static) -> &mut Self {
        self.checks.insert(name.into(), Arc::new(check));
        self
    }

    /// Register a handler for `kind: handler` actions
    pub fn register_handler(
        &mut self,
        name: impl Into<String>,
        handler: impl ActionHandler + 'static,
    ) -> &mut Self {
        self.handlers.insert(name.into(), Arc::new(handler));
        self
    }

    pub fn with_check(mut self, name: impl Into<String>, check: impl Check + 'static) -> Self {
        self.register_check(name, check);
        self
    }

    pub fn with_handler(mut self, name: impl Into<String>, handler: impl ActionHandler + 'static) -> Self {
        self.register_handler(name, handler);
        self
    }

    pub fn has_check(&self, name: &str) -> bool {
        self.checks.contains_key(name)
    }

    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }
}

/// Result of loading a definition document
#[derive(Debug)]
pub enum LoadedDefinition {
    Suite(MonitorSuite),
    Monitor(Monitor),
}

impl Runnable for LoadedDefinition {
    fn name(&self) -> &str {
        match self {
            LoadedDefinition::Suite(suite) => suite.name(),
            LoadedDefinition::Monitor(monitor) => monitor.name(),
        }
    }

    fn run(&self, facts: &FactContext) -> ResultNode {
        match self {
            LoadedDefinition::Suite(suite) => suite.run(facts),
            LoadedDefinition::Monitor(monitor) => monitor.run(facts),
        }
    }
}

/// Definition loader
pub struct Loader<'a> {
    registry: &'a Registry,
    settings: Option<Arc<dyn SettingsLookup>>,
}

impl<'a> Loader<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self {
            registry,
            settings: None,
        }
    }

    /// Settings consulted by `requires` keys
    pub fn with_settings(mut self, settings: Arc<dyn SettingsLookup>) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn load(&self, definition: &Definition) -> Result<LoadedDefinition, AdaptError> {
        match definition {
            Definition::Suite(suite) => Ok(LoadedDefinition::Suite(self.load_suite(suite)?)),
            Definition::Monitor(monitor) => Ok(LoadedDefinition::Monitor(self.load_monitor(monitor)?)),
        }
    }

    pub fn load_yaml(&self, content: &str) -> Result<LoadedDefinition, AdaptError> {
        self.load(&DefinitionParser::parse_yaml(content)?)
    }

    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<LoadedDefinition, AdaptError> {
        self.load(&DefinitionParser::parse_file(path)?)
    }

    /// Monitors first, then nested suites, each in declared order
    pub fn load_suite(&self, definition: &SuiteDefinition) -> Result<MonitorSuite, AdaptError> {
        let mut suite = MonitorSuite::new(&definition.name);
        if let Some(description) = &definition.description {
            suite = suite.describe(description);
        }

        for monitor in &definition.monitors {
            suite.add_monitor(self.load_monitor(monitor)?);
        }
        for nested in &definition.suites {
            suite.add_suite(self.load_suite(nested)?);
        }
        for action in &definition.actions {
            suite.add_action(self.action(action)?);
        }

        tracing::debug!(
            "Loaded suite {} with {} monitors",
            definition.name,
            suite.monitor_count()
        );
        Ok(suite)
    }

    pub fn load_monitor(&self, definition: &MonitorDefinition) -> Result<Monitor, AdaptError> {
        let mut monitor = Monitor::new(&definition.name);
        if let Some(description) = &definition.description {
            monitor = monitor.describe(description);
        }

        for key in &definition.requires {
            let key = key.clone();
            let settings = self.settings.clone();
            monitor = monitor.requires(move |_: &FactContext| match &settings {
                Some(settings) if settings.contains(&key) => Ok(()),
                _ => Err(NotConfigured::new(format!("{} setting is not configured", key))),
            });
        }

        for rule in &definition.rules {
            monitor.add_rule(self.rule(rule)?)?;
        }
        for action in &definition.actions {
            monitor.add_action(self.action(action)?);
        }
        Ok(monitor)
    }

    fn rule(&self, definition: &RuleDefinition) -> Result<Rule, AdaptError> {
        let mut rule = match definition.kind.as_str() {
            "expression" => {
                let source = definition.expression.as_ref().ok_or_else(|| {
                    AdaptError::UnsupportedRuleType("expression rule without an expression".to_string())
                })?;
                Rule::expression(source.as_str())
            }
            "check" => {
                let key = definition.check.as_deref().ok_or_else(|| {
                    AdaptError::UnsupportedRuleType("check rule without a check name".to_string())
                })?;
                let check = self.registry.checks.get(key).ok_or_else(|| {
                    AdaptError::UnsupportedRuleType(format!("unregistered check '{}'", key))
                })?;
                let name = check.name().unwrap_or_else(|| key.to_string());
                Rule::object(check.clone()).named(name)
            }
            other => return Err(AdaptError::UnsupportedRuleType(other.to_string())),
        };

        if let Some(name) = &definition.name {
            rule = rule.named(name);
        }
        if let Some(level) = &definition.level {
            let severity: Severity = level
                .parse()
                .map_err(|_| AdaptError::InvalidSeverity(level.clone()))?;
            rule = rule.severity(severity);
        }
        if let Some(message) = &definition.message {
            rule = rule.failure_message(message);
        }
        Ok(rule)
    }

    fn action(&self, definition: &ActionDefinition) -> Result<Action, AdaptError> {
        let mut action = match definition.kind.as_str() {
            "log" => Action::object(LogAction::new()),
            "webhook" => {
                let url = definition.url.as_ref().ok_or_else(|| {
                    AdaptError::UnsupportedActionType("webhook action without a url".to_string())
                })?;
                let timeout = Duration::from_secs(definition.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
                let webhook = WebhookAction::with_timeout(url.as_str(), timeout).map_err(|e| {
                    AdaptError::UnsupportedActionType(format!("webhook {}: {}", url, e))
                })?;
                Action::object(webhook)
            }
            "handler" => {
                let key = definition.handler.as_deref().ok_or_else(|| {
                    AdaptError::UnsupportedActionType("handler action without a handler name".to_string())
                })?;
                let handler = self.registry.handlers.get(key).ok_or_else(|| {
                    AdaptError::UnsupportedActionType(format!("unregistered handler '{}'", key))
                })?;
                let name = handler.name().unwrap_or_else(|| key.to_string());
                Action::object(handler.clone()).named(name)
            }
            other => return Err(AdaptError::UnsupportedActionType(other.to_string())),
        };

        if let Some(name) = &definition.name {
            action = action.named(name);
        }
        if let Some(trigger) = &definition.trigger {
            let trigger: Trigger = trigger
                .parse()
                .map_err(|_| AdaptError::InvalidTrigger(trigger.clone()))?;
            action = action.on(trigger);
        }
        Ok(action)
    }
}
