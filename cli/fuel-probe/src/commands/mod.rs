//! CLI commands.

mod defaults;
mod resolve;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fuel_config::{ConfigurationState, DefaultsSource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::output::OutputFormat;

/// fuel-probe - Resolve health-check configuration from Nailgun.
#[derive(Debug, Parser)]
#[command(name = "fuel-probe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (table or json).
    #[arg(long, global = true, default_value = "table")]
    format: String,

    /// Static defaults file (TOML). Defaults to the file selected by
    /// CUSTOM_FUEL_CONFIG / FUEL_CONFIG_DIR / FUEL_CONFIG.
    #[arg(long, global = true, env = "CUSTOM_FUEL_CONFIG")]
    defaults: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, global = true, env = "FUEL_PROBE_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve configuration from Nailgun and print it.
    Resolve(resolve::ResolveCommand),

    /// Print the static defaults without contacting Nailgun.
    Defaults(defaults::DefaultsCommand),

    /// Show CLI version.
    Version,
}

impl Cli {
    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        init_tracing(&self.log_level, self.json_logs);

        let format = match self.format.as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Table,
        };

        let source = match self.defaults {
            Some(path) => DefaultsSource::file(path),
            None => DefaultsSource::locate(),
        };

        let ctx = CommandContext { source, format };

        match self.command {
            Commands::Resolve(cmd) => cmd.run(ctx).await,
            Commands::Defaults(cmd) => cmd.run(ctx),
            Commands::Version => {
                println!("fuel-probe {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

/// Shared command context.
pub struct CommandContext {
    pub source: DefaultsSource,
    pub format: OutputFormat,
}

impl CommandContext {
    /// Load the static defaults the resolution starts from.
    pub fn load_defaults(&self) -> Result<ConfigurationState> {
        self.source
            .load()
            .context("Failed to load static defaults")
    }

    pub fn defaults_path(&self) -> Option<String> {
        self.source.path().map(|p| p.display().to_string())
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| log_level.into());
    let registry = tracing_subscriber::registry().with(filter);

    let result = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    if let Err(e) = result {
        eprintln!("Failed to initialize logging: {e}");
    }
}
