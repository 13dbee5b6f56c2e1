//! Defaults command.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use fuel_config::{MemoryProxySink, ProxyConfigurator};

use crate::output::print_state;

use super::CommandContext;

/// Print static defaults.
#[derive(Debug, Args)]
pub struct DefaultsCommand {
    /// Also derive the HTTP proxy from the configured controller nodes.
    #[arg(long)]
    proxy: bool,
}

impl DefaultsCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let (state, proxy) = if self.proxy {
            let sink = MemoryProxySink::new();
            ctx.source
                .load_with_proxy(&ProxyConfigurator::new(Arc::new(sink)))
                .context("Failed to load static defaults")?
        } else {
            (ctx.load_defaults()?, None)
        };

        print_state(
            &state,
            ctx.defaults_path().as_deref(),
            proxy.as_deref(),
            ctx.format,
        );
        Ok(())
    }
}
