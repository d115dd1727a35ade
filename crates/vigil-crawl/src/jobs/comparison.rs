//! Item count comparison against previous jobs
//!
//! The threshold is the average item count of the last
//! `SPIDERMON_JOBS_COMPARISON` jobs scaled by
//! `SPIDERMON_JOBS_COMPARISON_THRESHOLD`, rounded up.

use super::{Job, JobListing, JobQuery, JobsError};
use crate::keys::*;
use crate::stat::{Comparison, StatMonitor};
use std::sync::Arc;
use vigil_core::{FactContext, SettingsLookup, Value};
use vigil_runtime::{AdaptError, CheckError, Monitor, NotConfigured};

pub const DEFAULT_PAGE_SIZE: usize = 1000;
const MONITOR_NAME: &str = "Jobs Comparison Monitor";

/// Tags of the running job, read from the `SHUB_JOB_DATA` environment variable
pub fn current_job_tags() -> Vec<String> {
    let Ok(raw) = std::env::var("SHUB_JOB_DATA") else {
        return Vec::new();
    };
    serde_json::from_str::<serde_json::Value>(&raw)
        .ok()
        .and_then(|data| data.get("tags").cloned())
        .and_then(|tags| serde_json::from_value::<Vec<String>>(tags).ok())
        .unwrap_or_default()
}

/// Builder of the jobs comparison monitor
pub struct JobsComparison {
    settings: Arc<dyn SettingsLookup>,
    listing: Arc<dyn JobListing>,
    current_tags: Vec<String>,
    page_size: usize,
}

impl JobsComparison {
    pub fn new(settings: Arc<dyn SettingsLookup>, listing: Arc<dyn JobListing>) -> Self {
        Self {
            settings,
            listing,
            current_tags: current_job_tags(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Tags of the job being monitored
    pub fn with_current_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.current_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Desired tags that the current job also carries, sorted
    pub fn tags_to_filter(&self) -> Result<Vec<String>, CheckError> {
        let desired = self.settings.get_list(SPIDERMON_JOBS_COMPARISON_TAGS, Vec::new())?;
        let mut tags: Vec<String> = desired
            .iter()
            .filter_map(Value::as_str)
            .filter(|tag| self.current_tags.iter().any(|current| current == tag))
            .map(str::to_string)
            .collect();
        tags.sort();
        tags.dedup();
        Ok(tags)
    }

    /// Up to `count` previous jobs, fetched page by page
    pub fn fetch_jobs(
        &self,
        states: Vec<String>,
        tags: Vec<String>,
        count: usize,
    ) -> super::Result<Vec<Job>> {
        let mut query = JobQuery {
            states,
            tags,
            count,
            start: 0,
        };
        let mut jobs = Vec::new();
        loop {
            let page = self.listing.list(&query)?;
            if page.is_empty() {
                break;
            }
            jobs.extend(page);
            if jobs.len() >= count {
                break;
            }
            query.start += self.page_size;
        }
        jobs.truncate(count);
        Ok(jobs)
    }

    /// Minimum item count expected from the current job
    pub fn threshold(&self) -> Result<f64, CheckError> {
        let count = self.settings.get_int(SPIDERMON_JOBS_COMPARISON, 0)?.max(0) as usize;
        let ratio = self.settings.get_float(SPIDERMON_JOBS_COMPARISON_THRESHOLD, 0.0)?;
        let states: Vec<String> = self
            .settings
            .get_list(SPIDERMON_JOBS_COMPARISON_STATES, vec![Value::from("finished")])?
            .iter()
            .map(|state| state.to_string())
            .collect();
        let tags = self.tags_to_filter()?;

        let jobs = self
            .fetch_jobs(states, tags, count)
            .map_err(|err| anyhow::Error::new(err).context("Unable to list previous jobs"))?;
        if jobs.is_empty() {
            return Err(anyhow::Error::new(JobsError::NoJobs).into());
        }

        let total: u64 = jobs.iter().map(|job| job.items).sum();
        let average = total as f64 / jobs.len() as f64;
        let expected = (average * ratio).ceil();
        tracing::debug!(
            jobs = jobs.len(),
            average,
            expected,
            "Computed jobs comparison threshold"
        );
        Ok(expected)
    }

    pub fn build(self) -> Result<Monitor, AdaptError> {
        let settings = self.settings.clone();
        let comparison = Arc::new(self);
        StatMonitor::new(MONITOR_NAME, "item_scraped_count", Comparison::Ge)
            .describe("Check for a drop in scraped item count compared to previous jobs")
            .requires(positive_setting(settings.clone(), SPIDERMON_JOBS_COMPARISON))
            .requires(positive_setting(settings.clone(), SPIDERMON_JOBS_COMPARISON_THRESHOLD))
            .threshold_fn(move |_: &FactContext| comparison.threshold())
            .build(settings)
    }
}

fn positive_setting(
    settings: Arc<dyn SettingsLookup>,
    key: &'static str,
) -> impl Fn(&FactContext) -> Result<(), NotConfigured> + Send + Sync + 'static {
    move |_: &FactContext| match settings.get_float(key, 0.0) {
        Ok(value) if settings.contains(key) && value > 0.0 => Ok(()),
        _ => Err(NotConfigured::new(format!(
            "Configure {} to your project settings to use {}.",
            key, MONITOR_NAME
        ))),
    }
}
