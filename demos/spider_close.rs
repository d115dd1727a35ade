//! Stock spider close suite against a finished job
//!
//! Set `VIGIL_WEBHOOK_URL` to also post the result tree to an endpoint.
//!
//! Run with: cargo run --example spider_close

use anyhow::Result;
use std::sync::Arc;
use vigil_core::Settings;
use vigil_crawl::keys::*;
use vigil_crawl::spider_close_suite;
use vigil_runtime::{Action, FactContext, JsonReport, LogAction, Runner, TextReport, Trigger, WebhookAction};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vigil=info".into()),
        )
        .init();

    let settings = Settings::new()
        .with(SPIDERMON_MIN_ITEMS, 10000)
        .with(SPIDERMON_MAX_ERRORS, 0)
        .with(SPIDERMON_MAX_WARNINGS, 50)
        .with(SPIDERMON_UNWANTED_HTTP_CODES_MAX_COUNT, 20)
        .with(SPIDERMON_ADD_FIELD_COVERAGE, true)
        .with(
            SPIDERMON_FIELD_COVERAGE_RULES,
            r#"{"dict/title": 1.0, "dict/price": 0.95}"#,
        );

    let stats = FactContext::from_json(serde_json::json!({
        "finish_reason": "finished",
        "item_scraped_count": 29836,
        "downloader/request_count": 64012,
        "downloader/response_count": 63785,
        "downloader/response_status_count/200": 63720,
        "downloader/response_status_count/503": 65,
        "log_count/WARNING": 12,
        "log_count/ERROR": 2,
        "spidermon_field_coverage/dict/title": 1.0,
        "spidermon_field_coverage/dict/price": 0.91
    }))?;

    let mut suite = spider_close_suite(Arc::new(settings))?;
    suite.add_action(LogAction::new());
    if let Ok(url) = std::env::var("VIGIL_WEBHOOK_URL") {
        suite.add_action(Action::object(WebhookAction::new(url)?).on(Trigger::Failed));
    }

    let result = Runner::run(&suite, stats);
    println!("{}", TextReport::render(&result));

    if std::env::args().any(|arg| arg == "--json") {
        println!("{}", JsonReport::to_json_pretty(&result)?);
    }
    Ok(())
}
