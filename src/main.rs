use std::env;
use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use rewards_ledger::config::{LedgerConfig, LogFormat, LoggingConfig};
use rewards_ledger::process_operations;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    anyhow::ensure!(
        args.len() == 2 || args.len() == 3,
        "Usage: {} <operations.csv> [config.json]",
        args.first().map(String::as_str).unwrap_or("rewards-ledger")
    );

    let config = LedgerConfig::load(args.get(2).map(Path::new))
        .context("Failed to load configuration")?;
    init_logging(&config.logging);

    let filename = &args[1];

    let file = File::open(filename)
        .with_context(|| format!("Failed to open input file '{}'", filename))?;

    process_operations(file, io::stdout(), &config)
        .await
        .context("Failed to process operations and write balances")?;

    Ok(())
}

/// Install the tracing subscriber; logs go to stderr so stdout stays CSV
fn init_logging(config: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format {
        LogFormat::Json => subscriber
            .with(fmt::layer().json().with_target(true).with_writer(io::stderr))
            .init(),
        LogFormat::Pretty => subscriber
            .with(fmt::layer().pretty().with_target(true).with_writer(io::stderr))
            .init(),
    }
}
