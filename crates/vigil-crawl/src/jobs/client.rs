//! Scrapy Cloud job listing over the storage HTTP API

use super::{Job, JobListing, JobQuery, JobsError, Result};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://storage.scrapinghub.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Lists jobs of one spider through the `jobq` endpoint
pub struct ScrapyCloudJobs {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    project: String,
    spider: Option<String>,
}

impl ScrapyCloudJobs {
    pub fn new(api_key: impl Into<String>, project: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            project: project.into(),
            spider: None,
        })
    }

    /// Restrict the listing to one spider
    pub fn for_spider(mut self, spider: impl Into<String>) -> Self {
        self.spider = Some(spider.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn params(&self, query: &JobQuery) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(spider) = &self.spider {
            params.push(("spider", spider.clone()));
        }
        for state in &query.states {
            params.push(("state", state.clone()));
        }
        for tag in &query.tags {
            params.push(("has_tag", tag.clone()));
        }
        params.push(("count", query.count.to_string()));
        params.push(("start", query.start.to_string()));
        params
    }
}

impl JobListing for ScrapyCloudJobs {
    fn list(&self, query: &JobQuery) -> Result<Vec<Job>> {
        let url = format!("{}/jobq/{}/list", self.base_url, self.project);
        tracing::debug!("Listing jobs from {} starting at {}", url, query.start);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.api_key, Some(""))
            .query(&self.params(query))
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(JobsError::Http {
                status: status.as_u16(),
                body,
            });
        }

        // one JSON document per line
        body.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str::<Job>(line).map_err(JobsError::from))
            .collect()
    }
}
