//! Job history access for comparison monitors

pub mod client;
pub mod comparison;

pub use client::ScrapyCloudJobs;
pub use comparison::{current_job_tags, JobsComparison, DEFAULT_PAGE_SIZE};

use serde::{Deserialize, Serialize};

/// Summary of a previous job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Scraped item count
    #[serde(default)]
    pub items: u64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Filter for one page of the job listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobQuery {
    pub states: Vec<String>,
    /// Jobs must carry every tag
    pub tags: Vec<String>,
    pub count: usize,
    pub start: usize,
}

/// Source of previous jobs, newest first
pub trait JobListing: Send + Sync {
    fn list(&self, query: &JobQuery) -> Result<Vec<Job>>;
}

impl<L: JobListing + ?Sized> JobListing for std::sync::Arc<L> {
    fn list(&self, query: &JobQuery) -> Result<Vec<Job>> {
        (**self).list(query)
    }
}

/// Errors from listing jobs
#[derive(Debug, thiserror::Error)]
pub enum JobsError {
    /// Non-2xx response from the jobs API
    #[error("Jobs API HTTP error: status={status}, body={body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No previous job matched the filter
    #[error("No previous jobs found to compare with")]
    NoJobs,
}

pub type Result<T> = std::result::Result<T, JobsError>;
