//! Resolve command.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use fuel_config::identity::{CLUSTER_ID_VAR, NAILGUN_HOST_VAR, NAILGUN_PORT_VAR};
use fuel_config::{
    ClusterIdentity, ConfigOrchestrator, HttpClusterApi, IdentityError, InventoryPolicy,
    MemoryProxySink,
};
use tracing::info;

use crate::error::IncompleteResolution;
use crate::output::{print_resolution, Resolution};

use super::CommandContext;

/// Resolve configuration for one cluster.
///
/// The cluster identity comes from NAILGUN_HOST, NAILGUN_PORT and
/// CLUSTER_ID; the flags below override them one by one. The derived HTTP
/// proxy is reported, not exported.
#[derive(Debug, Args)]
pub struct ResolveCommand {
    /// Nailgun host [env: NAILGUN_HOST].
    #[arg(long)]
    nailgun_host: Option<String>,

    /// Nailgun port [env: NAILGUN_PORT].
    #[arg(long)]
    nailgun_port: Option<String>,

    /// Cluster to resolve [env: CLUSTER_ID].
    #[arg(long)]
    cluster_id: Option<String>,

    /// Per-request timeout in seconds (0 disables the timeout).
    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    /// Leave out controllers without a public network instead of failing
    /// the inventory lookup.
    #[arg(long)]
    skip_malformed_nodes: bool,

    /// Exit with an error when any step fails.
    #[arg(long)]
    strict: bool,
}

impl ResolveCommand {
    /// Flag values first, then `env`.
    fn identity<F>(&self, env: F) -> Result<ClusterIdentity, IdentityError>
    where
        F: Fn(&str) -> Option<String>,
    {
        ClusterIdentity::from_lookup(|name| {
            let flag = match name {
                NAILGUN_HOST_VAR => &self.nailgun_host,
                NAILGUN_PORT_VAR => &self.nailgun_port,
                CLUSTER_ID_VAR => &self.cluster_id,
                _ => return env(name),
            };
            flag.clone().or_else(|| env(name))
        })
    }

    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let identity = self
            .identity(|name| std::env::var(name).ok())
            .context("Cluster identity is incomplete")?;
        let mut state = ctx.load_defaults()?;

        let timeout = (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs));
        let api = HttpClusterApi::for_identity(&identity, timeout)
            .context("Failed to create Nailgun client")?;

        let policy = if self.skip_malformed_nodes {
            InventoryPolicy::Skip
        } else {
            InventoryPolicy::Abort
        };
        info!(
            nailgun_url = %identity.nailgun_url(),
            cluster_id = identity.cluster_id,
            policy = ?policy,
            "Starting resolution"
        );

        // The probe reports the proxy instead of exporting it.
        let proxy = MemoryProxySink::new();
        let report = ConfigOrchestrator::new(
            Arc::new(api),
            Arc::new(proxy.clone()),
            identity.cluster_id,
            policy,
        )
        .prepare(&mut state)
        .await;

        print_resolution(
            &Resolution {
                nailgun_url: identity.nailgun_url(),
                defaults_path: ctx.defaults_path(),
                state: &state,
                report: &report,
                proxy: proxy.installed(),
            },
            ctx.format,
        );

        if self.strict {
            if let Some((step, err)) = report.failure() {
                return Err(IncompleteResolution {
                    step: step.as_str(),
                    message: err.to_string(),
                    transport: err.is_transport(),
                }
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn command(host: Option<&str>, port: Option<&str>, cluster: Option<&str>) -> ResolveCommand {
        ResolveCommand {
            nailgun_host: host.map(str::to_string),
            nailgun_port: port.map(str::to_string),
            cluster_id: cluster.map(str::to_string),
            timeout_secs: 30,
            skip_malformed_nodes: false,
            strict: false,
        }
    }

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_flags_override_environment() {
        let identity = command(Some("10.20.0.9"), None, Some("7"))
            .identity(env(&[
                ("NAILGUN_HOST", "10.20.0.2"),
                ("NAILGUN_PORT", "8000"),
                ("CLUSTER_ID", "1"),
            ]))
            .unwrap();

        assert_eq!(identity, ClusterIdentity::new("10.20.0.9", 8000, 7));
    }

    #[test]
    fn test_port_is_required() {
        let err = command(Some("10.20.0.2"), None, Some("1"))
            .identity(env(&[]))
            .unwrap_err();

        assert_eq!(err, IdentityError::Missing("NAILGUN_PORT"));
    }

    #[test]
    fn test_invalid_port_flag() {
        let err = command(Some("10.20.0.2"), Some("http"), Some("1"))
            .identity(env(&[("NAILGUN_PORT", "8000")]))
            .unwrap_err();

        assert!(matches!(err, IdentityError::Invalid { name: "NAILGUN_PORT", .. }));
    }
}
