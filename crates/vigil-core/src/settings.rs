//! Settings lookup capability
//!
//! Domain monitors read their thresholds from named settings. Instead of an
//! ambient global, the lookup is an explicit capability handed to the
//! monitors that need it. Typed getters take the caller's default, which is
//! returned when the key is absent; a value that is present but cannot be
//! converted is an `InvalidValue` error.
//!
//! Conversions are lenient in the way settings coming from files,
//! command-line overrides or environment variables need:
//! - `get_int` / `get_float` accept numbers and numeric strings
//! - `get_bool` accepts `true/false`, `1/0`, `yes/no` in any case
//! - `get_list` accepts arrays or comma-separated strings
//! - `get_dict` accepts objects or JSON-encoded strings

use crate::error::{CoreError, Result};
use crate::types::Value;
use std::collections::HashMap;

/// Read access to named configuration values
pub trait SettingsLookup: Send + Sync {
    /// Raw value for `key`, `None` when absent
    fn raw(&self, key: &str) -> Option<Value>;

    /// Present and not null
    fn contains(&self, key: &str) -> bool {
        present(self.raw(key)).is_some()
    }

    fn get_int(&self, key: &str, default: i64) -> Result<i64> {
        match present(self.raw(key)) {
            Some(value) => to_int(key, &value),
            None => Ok(default),
        }
    }

    fn get_float(&self, key: &str, default: f64) -> Result<f64> {
        match present(self.raw(key)) {
            Some(value) => to_float(key, &value),
            None => Ok(default),
        }
    }

    fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        match present(self.raw(key)) {
            Some(value) => to_bool(key, &value),
            None => Ok(default),
        }
    }

    fn get_list(&self, key: &str, default: Vec<Value>) -> Result<Vec<Value>> {
        match present(self.raw(key)) {
            Some(value) => to_list(key, value),
            None => Ok(default),
        }
    }

    fn get_dict(&self, key: &str, default: HashMap<String, Value>) -> Result<HashMap<String, Value>> {
        match present(self.raw(key)) {
            Some(value) => to_dict(key, value),
            None => Ok(default),
        }
    }

    /// Either a dict or a list, whichever the setting holds
    ///
    /// Strings are decoded as JSON first and fall back to a comma-separated list.
    fn get_dict_or_list(&self, key: &str, default: Value) -> Result<Value> {
        match present(self.raw(key)) {
            Some(Value::Object(map)) => Ok(Value::Object(map)),
            Some(Value::Array(items)) => Ok(Value::Array(items)),
            Some(Value::String(s)) => match serde_json::from_str::<serde_json::Value>(&s) {
                Ok(json @ (serde_json::Value::Object(_) | serde_json::Value::Array(_))) => {
                    Ok(Value::from(json))
                }
                _ => Ok(Value::Array(split_list(&s))),
            },
            Some(other) => Err(invalid(key, "a dict or a list", &other)),
            None => Ok(default),
        }
    }
}

/// In-memory settings store
///
/// Keys are normalized to upper case so sources that fold case (such as
/// environment variables read through a config loader) agree with keys
/// written in settings files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    values: HashMap<String, Value>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build settings from a JSON object
    pub fn from_json(json: serde_json::Value) -> Result<Self> {
        match Value::from(json) {
            Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(invalid("settings", "an object", &other)),
        }
    }

    /// Build settings from a YAML mapping
    pub fn from_yaml(content: &str) -> Result<Self> {
        let json: serde_json::Value =
            serde_yaml::from_str(content).map_err(|e| CoreError::InvalidValue {
                key: "settings".to_string(),
                message: e.to_string(),
            })?;
        Self::from_json(json)
    }

    /// Builder-style insert
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(normalize(key), value.into());
    }

    /// Overlay `other` on top of these settings
    pub fn merge(&mut self, other: Settings) {
        self.values.extend(other.values);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl SettingsLookup for Settings {
    fn raw(&self, key: &str) -> Option<Value> {
        self.values.get(&normalize(key)).cloned()
    }
}

impl<K: AsRef<str>> FromIterator<(K, Value)> for Settings {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (normalize(k.as_ref()), v))
                .collect(),
        }
    }
}

fn normalize(key: &str) -> String {
    key.trim().to_ascii_uppercase()
}

/// A null setting behaves like an absent one
fn present(value: Option<Value>) -> Option<Value> {
    value.filter(|v| !v.is_null())
}

fn invalid(key: &str, expected: &str, got: &Value) -> CoreError {
    CoreError::InvalidValue {
        key: key.to_string(),
        message: format!("expected {}, got {} '{}'", expected, got.type_name(), got),
    }
}

fn to_int(key: &str, value: &Value) -> Result<i64> {
    match value {
        Value::Number(n) if n.is_finite() => Ok(n.trunc() as i64),
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .or_else(|_| s.parse::<f64>().map(|f| f.trunc() as i64))
                .map_err(|_| invalid(key, "an integer", value))
        }
        other => Err(invalid(key, "an integer", other)),
    }
}

fn to_float(key: &str, value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) => Ok(*n),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid(key, "a float", value)),
        other => Err(invalid(key, "a float", other)),
    }
}

fn to_bool(key: &str, value: &Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) if *n == 0.0 || *n == 1.0 => Ok(*n == 1.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" | "" => Ok(false),
            _ => Err(invalid(key, "a boolean", value)),
        },
        other => Err(invalid(key, "a boolean", other)),
    }
}

fn to_list(key: &str, value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        Value::String(s) => Ok(split_list(&s)),
        other => Err(invalid(key, "a list", &other)),
    }
}

fn to_dict(key: &str, value: Value) -> Result<HashMap<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        Value::String(s) => match serde_json::from_str::<serde_json::Value>(&s) {
            Ok(serde_json::Value::Object(map)) => Ok(map
                .into_iter()
                .map(|(k, v)| (k, Value::from(v)))
                .collect()),
            _ => Err(invalid(key, "a dict", &Value::String(s))),
        },
        other => Err(invalid(key, "a dict", &other)),
    }
}

fn split_list(s: &str) -> Vec<Value> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(Value::from)
        .collect()
}
