//! Vigil Crawl - monitors for web crawl jobs
//!
//! Stock monitors over the stats a crawl job reports (item counts, log
//! levels, HTTP status counts, retries, field coverage, execution time), a
//! generic stat threshold builder, and a comparison with previous jobs
//! listed from Scrapy Cloud.

pub mod jobs;
pub mod keys;
pub mod monitors;
pub mod stat;
pub mod suites;

pub use jobs::{Job, JobListing, JobQuery, JobsComparison, JobsError, ScrapyCloudJobs};
pub use monitors::*;
pub use stat::{Comparison, StatMonitor, ThresholdType};
pub use suites::{periodic_suite, spider_close_suite, PERIODIC_SUITE, SPIDER_CLOSE_SUITE};
