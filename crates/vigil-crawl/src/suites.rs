//! Ready-made suites of the stock crawl monitors

use crate::monitors::*;
use std::sync::Arc;
use vigil_core::SettingsLookup;
use vigil_runtime::{AdaptError, Monitor, MonitorSuite};

type MonitorBuilder = fn(Arc<dyn SettingsLookup>) -> Result<Monitor, AdaptError>;

pub const SPIDER_CLOSE_SUITE: &str = "Spider Close Monitor Suite";
pub const PERIODIC_SUITE: &str = "Periodic Monitor Suite";

/// Monitors meant to run once the crawl has finished
pub fn spider_close_suite(settings: Arc<dyn SettingsLookup>) -> Result<MonitorSuite, AdaptError> {
    let monitors: [MonitorBuilder; 11] = [
        item_count_monitor,
        item_validation_monitor,
        error_count_monitor,
        warning_count_monitor,
        finish_reason_monitor,
        unwanted_http_codes_monitor,
        field_coverage_monitor,
        retry_count_monitor,
        downloader_exception_monitor,
        successful_requests_monitor,
        total_requests_monitor,
    ];

    let mut suite = MonitorSuite::new(SPIDER_CLOSE_SUITE)
        .describe("Stock monitors checking a finished crawl job");
    for build in monitors {
        suite.add_monitor(build(settings.clone())?);
    }
    Ok(suite)
}

/// Monitors meant to run repeatedly while the crawl is in progress
pub fn periodic_suite(settings: Arc<dyn SettingsLookup>) -> Result<MonitorSuite, AdaptError> {
    Ok(MonitorSuite::new(PERIODIC_SUITE)
        .describe("Stock monitors checking a running crawl job")
        .with_monitor(periodic_execution_time_monitor(settings)?))
}
