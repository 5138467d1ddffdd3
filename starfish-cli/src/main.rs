//! Binary crate for the `starfish` service.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Logging setup
//! - Hosting the HTTP endpoints

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    starfish_cli::telemetry::init("starfish", cmd.json_logs);
    cmd.run().await
}
