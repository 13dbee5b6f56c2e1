//! fuel-probe - resolve the health-check configuration for a cluster
//!
//! Runs the same resolution the harness performs at startup and prints the
//! resulting configuration together with the outcome of every step.

use anyhow::Result;
use clap::Parser;

mod commands;
mod error;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = cli.run().await {
        error::print_error(&e);
        std::process::exit(1);
    }

    Ok(())
}
