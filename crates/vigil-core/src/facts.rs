//! Read-only fact snapshot
//!
//! A `FactContext` holds the statistics of the job being monitored. Every
//! rule of a run sees the same snapshot; there is no way to mutate it once
//! built. Lookups are strict: an absent key is a `KeyNotFound` error, never
//! a silent default, unless the caller asks for one with [`FactContext::get_or`].

use crate::error::{CoreError, Result};
use crate::types::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable, key- and attribute-addressable snapshot of job facts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactContext {
    facts: Arc<HashMap<String, Value>>,
}

impl FactContext {
    /// Create a context from a map of facts
    pub fn new(facts: HashMap<String, Value>) -> Self {
        Self {
            facts: Arc::new(facts),
        }
    }

    /// Create a context from a JSON object
    pub fn from_json(json: serde_json::Value) -> Result<Self> {
        match Value::from(json) {
            Value::Object(map) => Ok(Self::new(map)),
            other => Err(CoreError::InvalidValue {
                key: "facts".to_string(),
                message: format!("expected a JSON object, got {}", other.type_name()),
            }),
        }
    }

    /// Strict key lookup
    pub fn get(&self, key: &str) -> Result<&Value> {
        self.facts
            .get(key)
            .ok_or_else(|| CoreError::KeyNotFound(key.to_string()))
    }

    /// Attribute-style lookup, `facts.attr("finish_reason")` is `facts.get("finish_reason")`
    pub fn attr(&self, name: &str) -> Result<&Value> {
        self.get(name)
    }

    /// Lookup with an explicit fallback for absent keys
    pub fn get_or(&self, key: &str, default: impl Into<Value>) -> Value {
        match self.facts.get(key) {
            Some(value) => value.clone(),
            None => default.into(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.facts.contains_key(key)
    }

    /// Navigate nested values following `path`
    ///
    /// The first segment is a fact key, the following ones are object keys
    /// or array indices. Any missing segment fails with `KeyNotFound`
    /// carrying the path up to that segment.
    pub fn lookup(&self, path: &[String]) -> Result<&Value> {
        let (first, rest) = path
            .split_first()
            .ok_or_else(|| CoreError::KeyNotFound("<empty path>".to_string()))?;

        let mut current = self.get(first)?;
        for (depth, segment) in rest.iter().enumerate() {
            let missing = || CoreError::KeyNotFound(path[..depth + 2].join("."));
            current = match current {
                Value::Object(map) => map.get(segment).ok_or_else(missing)?,
                Value::Array(items) => segment
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| items.get(index))
                    .ok_or_else(missing)?,
                other => {
                    return Err(CoreError::TypeError(format!(
                        "{} value has no field '{}'",
                        other.type_name(),
                        segment
                    )))
                }
            };
        }

        Ok(current)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.facts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// The whole snapshot as an object value
    pub fn to_value(&self) -> Value {
        Value::Object(self.facts.as_ref().clone())
    }
}

impl From<HashMap<String, Value>> for FactContext {
    fn from(facts: HashMap<String, Value>) -> Self {
        Self::new(facts)
    }
}

impl<K, V> FromIterator<(K, V)> for FactContext
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
