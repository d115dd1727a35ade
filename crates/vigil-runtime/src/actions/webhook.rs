//! Webhook action
//!
//! POSTs the JSON rendering of the node to a URL. Any transport failure or
//! non-2xx response is an action-execution error.

use crate::action::ActionHandler;
use crate::result::ResultNode;
use anyhow::Context;
use std::time::Duration;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Sends the result tree to an HTTP endpoint
pub struct WebhookAction {
    url: String,
    client: reqwest::blocking::Client,
}

impl WebhookAction {
    /// Webhook with the default timeout
    pub fn new(url: impl Into<String>) -> reqwest::Result<Self> {
        Self::with_timeout(url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ActionHandler for WebhookAction {
    fn run(&self, result: &ResultNode) -> anyhow::Result<()> {
        tracing::debug!("Posting result of {} to {}", result.name, self.url);

        let response = self
            .client
            .post(&self.url)
            .json(result)
            .send()
            .with_context(|| format!("Webhook request to {} failed", self.url))?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Webhook {} responded with status: {}",
                self.url,
                response.status()
            );
        }
        Ok(())
    }

    fn name(&self) -> Option<String> {
        Some(format!("webhook {}", self.url))
    }
}
