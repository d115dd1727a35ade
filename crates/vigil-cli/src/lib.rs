//! Vigil CLI - runs monitor suites from the command line
//!
//! Loads a job's stats and settings, runs the stock crawl suite or a
//! declared definition, and prints a text or JSON report.

pub mod cli;
pub mod run;
pub mod settings;

pub use cli::{Cli, Format};
pub use run::{execute, exit_code, render, EXIT_FAILED, EXIT_SUCCESS, EXIT_USAGE};
pub use settings::{load_settings, load_stats};
