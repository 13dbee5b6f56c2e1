//! Identity endpoint derivation.
//!
//! The dashboard URL and Keystone URI are built from the cluster's public
//! virtual IP when the network configuration carries one, and from the first
//! controller's public IP otherwise. HA clusters without a VIP take the OSTF
//! fallback instead, see [`EndpointResolver::ha_fallback`].

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::client::{paths, ClusterApi};
use crate::error::ResolveError;
use crate::state::{ClusterMode, ConfigurationState};

const KEYSTONE_PORT: u16 = 5000;

/// Dashboard URL and Identity API URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityEndpoints {
    pub url: String,
    pub uri: String,
}

impl IdentityEndpoints {
    /// Endpoints served directly from `host`.
    pub fn for_host(host: &str) -> Self {
        Self {
            url: format!("http://{host}/dashboard/"),
            uri: format!("http://{host}:{KEYSTONE_PORT}/v2.0/"),
        }
    }
}

/// Derives `identity.url` and `identity.uri`.
pub struct EndpointResolver {
    api: Arc<dyn ClusterApi>,
    cluster_id: u64,
}

impl EndpointResolver {
    pub fn new(api: Arc<dyn ClusterApi>, cluster_id: u64) -> Self {
        Self { api, cluster_id }
    }

    /// Derive the identity endpoints and write them into the state.
    ///
    /// Needs mode, inventory and network configuration to be resolved first.
    pub async fn derive_endpoints(
        &self,
        state: &mut ConfigurationState,
    ) -> Result<IdentityEndpoints, ResolveError> {
        if state.mode == ClusterMode::Unknown {
            return Err(ResolveError::Unresolved("mode"));
        }
        let raw_data = state
            .network
            .raw_data
            .as_ref()
            .ok_or(ResolveError::Unresolved("network.raw_data"))?;

        let endpoints = match public_vip(raw_data) {
            Some(vip) => IdentityEndpoints::for_host(vip),
            None if state.mode.is_ha() => self.ha_fallback().await?,
            None => {
                let public_ip = state
                    .compute
                    .public_ips
                    .first()
                    .ok_or(ResolveError::Empty("compute.public_ips"))?;
                IdentityEndpoints::for_host(public_ip)
            }
        };

        info!(url = %endpoints.url, uri = %endpoints.uri, "Resolved identity endpoints");
        state.identity.url = endpoints.url.clone();
        state.identity.uri = endpoints.uri.clone();
        Ok(endpoints)
    }

    /// Ask OSTF for the endpoints of an HA cluster that reports no VIP.
    ///
    /// Works around Nailgun versions that omit `public_vip` in HA mode. Only
    /// reachable from the HA branch; a non-HA cluster without a usable
    /// address is a configuration error, not a case for this lookup.
    pub async fn ha_fallback(&self) -> Result<IdentityEndpoints, ResolveError> {
        warn!(
            cluster_id = self.cluster_id,
            "HA cluster has no public_vip, falling back to OSTF endpoints"
        );

        let data = self.api.get_json(&paths::ostf(self.cluster_id)).await?;
        let horizon_url = ostf_field(&data, "horizon_url")?;
        let keystone_url = ostf_field(&data, "keystone_url")?;

        Ok(IdentityEndpoints {
            url: format!("{horizon_url}dashboard"),
            uri: format!("{keystone_url}v2.0/"),
        })
    }
}

/// The VIP from a network configuration document, if set and non-empty.
pub fn public_vip(raw_data: &Value) -> Option<&str> {
    raw_data
        .get("public_vip")
        .and_then(Value::as_str)
        .filter(|vip| !vip.is_empty())
}

fn ostf_field<'a>(data: &'a Value, field: &str) -> Result<&'a str, ResolveError> {
    data.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| ResolveError::MissingField {
            document: "OSTF endpoints",
            field: field.to_string(),
        })
}
