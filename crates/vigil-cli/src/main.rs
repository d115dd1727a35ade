//! vigil - crawl job monitoring from the command line

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vigil_cli::{execute, exit_code, render, Cli, EXIT_USAGE};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_tracing() {
        eprintln!("{:#}", err);
    }

    let code = match execute(&cli).and_then(|result| {
        println!("{}", render(&result, cli.format)?);
        Ok(exit_code(&result))
    }) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("Error: {:#}", err);
            EXIT_USAGE
        }
    };
    ExitCode::from(code)
}

/// Initialize tracing subscriber writing to stderr
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vigil=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    Ok(())
}
