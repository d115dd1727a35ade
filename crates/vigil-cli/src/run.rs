//! Suite selection, execution and report rendering

use crate::cli::{Cli, Format};
use crate::settings::{load_settings, load_stats};
use anyhow::{Context, Result};
use std::sync::Arc;
use vigil_core::SettingsLookup;
use vigil_crawl::{periodic_suite, spider_close_suite, JobsComparison, ScrapyCloudJobs};
use vigil_runtime::{JsonReport, Loader, Registry, ResultNode, Runnable, Runner, TextReport};

/// Exit status of a successful run
pub const EXIT_SUCCESS: u8 = 0;
/// Exit status when any rule failed or errored
pub const EXIT_FAILED: u8 = 1;
/// Exit status for unusable input or definitions
pub const EXIT_USAGE: u8 = 2;

/// Run the selected suite against the stats file
pub fn execute(cli: &Cli) -> Result<ResultNode> {
    let settings: Arc<dyn SettingsLookup> = Arc::new(load_settings(cli.settings.as_deref())?);
    let facts = load_stats(&cli.stats)?;
    let root = select(cli, settings)?;
    Ok(Runner::run(&*root, facts))
}

fn select(cli: &Cli, settings: Arc<dyn SettingsLookup>) -> Result<Box<dyn Runnable>> {
    if let Some(path) = &cli.definition {
        let registry = Registry::new();
        let loaded = Loader::new(&registry)
            .with_settings(settings)
            .load_file(path)
            .with_context(|| format!("Failed to load definition {}", path.display()))?;
        return Ok(Box::new(loaded));
    }

    if cli.periodic {
        return Ok(Box::new(periodic_suite(settings)?));
    }

    let mut suite = spider_close_suite(settings.clone())?;
    if let (Some(project), Some(api_key)) = (&cli.jobs_project, &cli.api_key) {
        let mut listing = ScrapyCloudJobs::new(api_key, project)?;
        if let Some(spider) = &cli.spider {
            listing = listing.for_spider(spider);
        }
        suite.add_monitor(JobsComparison::new(settings, Arc::new(listing)).build()?);
    }
    Ok(Box::new(suite))
}

/// Render the result in the requested format
pub fn render(result: &ResultNode, format: Format) -> Result<String> {
    match format {
        Format::Text => Ok(TextReport::render(result)),
        Format::Json => JsonReport::to_json_pretty(result).context("Failed to render JSON report"),
    }
}

pub fn exit_code(result: &ResultNode) -> u8 {
    if result.is_successful() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILED
    }
}
