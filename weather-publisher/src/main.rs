//! Binary crate for the `weather-publisher` service.
//!
//! This crate focuses on:
//! - Parsing CLI arguments and environment overrides
//! - Installing the log subscriber
//! - Turning process signals into a shutdown future

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
