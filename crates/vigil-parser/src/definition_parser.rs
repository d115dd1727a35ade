//! Definition document parser
//!
//! Parses YAML or JSON documents with a top-level `suite` or `monitor` key.

use crate::definition::{Definition, MonitorDefinition, SuiteDefinition};
use crate::error::{ParseError, Result};
use std::path::Path;

/// Definition parser
pub struct DefinitionParser;

impl DefinitionParser {
    /// Parse a definition from YAML
    pub fn parse_yaml(content: &str) -> Result<Definition> {
        let definition: Definition = serde_yaml::from_str(content)?;
        Self::validate(&definition)?;
        Ok(definition)
    }

    /// Parse a definition from JSON
    pub fn parse_json(content: &str) -> Result<Definition> {
        let definition: Definition = serde_json::from_str(content)?;
        Self::validate(&definition)?;
        Ok(definition)
    }

    /// Parse a definition file; `.json` files are JSON, anything else YAML
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Definition> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "Parsing definition file");

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::parse_json(&content),
            _ => Self::parse_yaml(&content),
        }
    }

    fn validate(definition: &Definition) -> Result<()> {
        match definition {
            Definition::Suite(suite) => Self::validate_suite(suite),
            Definition::Monitor(monitor) => Self::validate_monitor(monitor),
        }
    }

    fn validate_suite(suite: &SuiteDefinition) -> Result<()> {
        if suite.name.trim().is_empty() {
            return Err(ParseError::MissingField {
                field: "suite.name".to_string(),
            });
        }
        suite
            .monitors
            .iter()
            .try_for_each(Self::validate_monitor)?;
        suite.suites.iter().try_for_each(Self::validate_suite)
    }

    fn validate_monitor(monitor: &MonitorDefinition) -> Result<()> {
        if monitor.name.trim().is_empty() {
            return Err(ParseError::MissingField {
                field: "monitor.name".to_string(),
            });
        }
        if let Some(key) = monitor.requires.iter().find(|key| key.trim().is_empty()) {
            return Err(ParseError::InvalidValue {
                field: format!("{}.requires", monitor.name),
                message: format!("empty setting name '{}'", key),
            });
        }
        Ok(())
    }
}
