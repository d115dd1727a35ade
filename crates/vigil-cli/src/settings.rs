//! Settings and stats loading

use anyhow::{Context, Result};
use std::path::Path;
use vigil_core::{FactContext, Settings};

/// Prefix of environment variables overriding settings, e.g. `VIGIL__SPIDERMON_MIN_ITEMS`
pub const ENV_PREFIX: &str = "VIGIL";

/// Load settings from an optional file, then the environment
///
/// A `.env` file in the working directory is read first when present.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    dotenvy::dotenv().ok();

    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path).required(true));
    }
    let config = builder
        .add_source(config::Environment::with_prefix(ENV_PREFIX).prefix_separator("__"))
        .build()
        .context("Failed to load settings")?;

    let values: serde_json::Value = config
        .try_deserialize()
        .context("Failed to deserialize settings")?;
    let settings = Settings::from_json(values)?;
    tracing::debug!(count = settings.len(), "Loaded settings");
    Ok(settings)
}

/// Read the job stats from a JSON object file
pub fn load_stats(path: &Path) -> Result<FactContext> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read stats file {}", path.display()))?;
    let json: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in stats file {}", path.display()))?;
    let facts = FactContext::from_json(json)
        .with_context(|| format!("Stats file {} must hold a JSON object", path.display()))?;
    Ok(facts)
}
