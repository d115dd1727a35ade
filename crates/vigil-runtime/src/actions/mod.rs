//! Built-in actions

mod log;
mod webhook;

pub use log::LogAction;
pub use webhook::{WebhookAction, DEFAULT_TIMEOUT_SECS};
