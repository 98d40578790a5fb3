//! Vitrine CLI
//!
//! Command-line interface for Vitrine search engines.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use vitrine_cli::Cli;

fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn,vitrine=info",
        1 => "info,vitrine=debug",
        _ => "debug",
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(cli.verbose).into()),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(command = ?cli.command, "Starting vitrine");
    vitrine_cli::run(cli).await?;
    Ok(())
}
