//! Cluster metadata lookups.
//!
//! Each `resolve_*` method is one resolution step: a single GET against
//! Nailgun followed by extraction into [`ConfigurationState`]. Extraction
//! completes before anything is written, so a failing step leaves the state
//! untouched.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::client::{paths, ClusterApi};
use crate::error::ResolveError;
use crate::state::{ClusterMode, ConfigurationState, Secret};

const CONTROLLER_ROLE: &str = "controller";
const PUBLIC_NETWORK: &str = "public";

/// What to do with a controller node that has no `public` network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InventoryPolicy {
    /// Fail the whole inventory lookup.
    #[default]
    Abort,
    /// Leave the node out and keep going.
    Skip,
}

/// Controller node as listed by `/api/nodes`. Other roles are never decoded.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeRecord {
    pub role: String,
    pub ip: String,
    pub fqdn: String,
    #[serde(default)]
    pub network_data: Vec<NetworkAttachment>,
}

/// One network a node is attached to.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkAttachment {
    pub name: String,
    #[serde(default)]
    pub ip: Option<String>,
}

/// Admin credentials taken from the cluster attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub tenant: String,
    pub username: String,
    pub password: Secret,
}

/// Controller addresses in node order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerInventory {
    pub public_ips: Vec<String>,
    pub controller_ips: Vec<String>,
    pub controller_names: Vec<String>,
}

impl ControllerInventory {
    pub fn len(&self) -> usize {
        self.controller_ips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controller_ips.is_empty()
    }
}

/// Issues the metadata lookups for one cluster.
pub struct ClusterMetadataResolver {
    api: Arc<dyn ClusterApi>,
    cluster_id: u64,
    policy: InventoryPolicy,
}

impl ClusterMetadataResolver {
    pub fn new(api: Arc<dyn ClusterApi>, cluster_id: u64, policy: InventoryPolicy) -> Self {
        Self {
            api,
            cluster_id,
            policy,
        }
    }

    /// Resolve the deployment mode.
    pub async fn resolve_mode(&self, state: &mut ConfigurationState) -> Result<(), ResolveError> {
        let data = self.api.get_json(&paths::cluster(self.cluster_id)).await?;
        let mode = parse_mode(&data)?;

        info!(cluster_id = self.cluster_id, mode = %mode, "Resolved cluster mode");
        state.mode = mode;
        Ok(())
    }

    /// Resolve the admin credentials into the identity group.
    pub async fn resolve_credentials(
        &self,
        state: &mut ConfigurationState,
    ) -> Result<(), ResolveError> {
        let data = self
            .api
            .get_json(&paths::cluster_attributes(self.cluster_id))
            .await?;
        let credentials = parse_credentials(&data)?;

        info!(
            cluster_id = self.cluster_id,
            tenant = %credentials.tenant,
            username = %credentials.username,
            "Resolved admin credentials"
        );
        state.identity.admin_tenant_name = credentials.tenant;
        state.identity.admin_username = credentials.username;
        state.identity.admin_password = credentials.password;
        Ok(())
    }

    /// Resolve the controller inventory into the compute group.
    pub async fn resolve_inventory(
        &self,
        state: &mut ConfigurationState,
    ) -> Result<(), ResolveError> {
        let data = self
            .api
            .get_json(&paths::cluster_nodes(self.cluster_id))
            .await?;
        let nodes: Vec<Value> =
            serde_json::from_value(data).map_err(|source| ResolveError::Shape {
                document: "node list",
                source,
            })?;
        let controllers = controller_records(nodes)?;
        let inventory = controller_inventory(&controllers, self.policy)?;

        info!(
            cluster_id = self.cluster_id,
            controller_ips = ?inventory.controller_ips,
            controller_names = ?inventory.controller_names,
            public_ips = ?inventory.public_ips,
            "Resolved controller inventory"
        );
        state.compute.public_ips = inventory.public_ips;
        state.compute.controller_nodes = inventory.controller_ips;
        state.compute.controller_nodes_name = inventory.controller_names;
        Ok(())
    }

    /// Store the network configuration document verbatim.
    pub async fn resolve_network_configuration(
        &self,
        state: &mut ConfigurationState,
    ) -> Result<(), ResolveError> {
        let data = self
            .api
            .get_json(&paths::network_configuration(self.cluster_id))
            .await?;

        info!(
            cluster_id = self.cluster_id,
            has_public_vip = data.get("public_vip").is_some(),
            "Resolved network configuration"
        );
        state.network.raw_data = Some(data);
        Ok(())
    }
}

/// Extract the mode from a cluster document.
pub fn parse_mode(data: &Value) -> Result<ClusterMode, ResolveError> {
    let mode = required_str(data, "cluster", "/mode")?;
    Ok(ClusterMode::from_api(mode))
}

/// Extract `editable.access.{tenant,user,password}.value`.
pub fn parse_credentials(data: &Value) -> Result<Credentials, ResolveError> {
    let tenant = required_str(data, "cluster attributes", "/editable/access/tenant/value")?;
    let username = required_str(data, "cluster attributes", "/editable/access/user/value")?;
    let password = required_str(data, "cluster attributes", "/editable/access/password/value")?;

    Ok(Credentials {
        tenant: tenant.to_string(),
        username: username.to_string(),
        password: Secret::new(password),
    })
}

/// Decode the controller entries of a node list.
///
/// Only `role` is read from other nodes, so unassigned or partially
/// provisioned nodes with null fields do not affect the result.
pub fn controller_records(nodes: Vec<Value>) -> Result<Vec<NodeRecord>, ResolveError> {
    nodes
        .into_iter()
        .filter(|node| node.get("role").and_then(Value::as_str) == Some(CONTROLLER_ROLE))
        .map(|node| {
            serde_json::from_value(node).map_err(|source| ResolveError::Shape {
                document: "controller node",
                source,
            })
        })
        .collect()
}

/// Keep controller nodes and collect their addresses in node order.
pub fn controller_inventory(
    nodes: &[NodeRecord],
    policy: InventoryPolicy,
) -> Result<ControllerInventory, ResolveError> {
    let mut inventory = ControllerInventory::default();

    for node in nodes.iter().filter(|n| n.role == CONTROLLER_ROLE) {
        let public_ip = node
            .network_data
            .iter()
            .find(|network| network.name == PUBLIC_NETWORK)
            .and_then(|network| network.ip.as_deref());

        let Some(public_ip) = public_ip else {
            match policy {
                InventoryPolicy::Abort => {
                    return Err(ResolveError::MissingPublicNetwork {
                        fqdn: node.fqdn.clone(),
                        ip: node.ip.clone(),
                    });
                }
                InventoryPolicy::Skip => {
                    warn!(
                        fqdn = %node.fqdn,
                        ip = %node.ip,
                        "Skipping controller without public network"
                    );
                    continue;
                }
            }
        };

        inventory.public_ips.push(strip_prefix_len(public_ip).to_string());
        inventory.controller_ips.push(node.ip.clone());
        inventory.controller_names.push(node.fqdn.clone());
    }

    Ok(inventory)
}

/// Drop a CIDR suffix: `"10.0.0.5/24"` becomes `"10.0.0.5"`.
pub fn strip_prefix_len(address: &str) -> &str {
    address
        .split_once('/')
        .map_or(address, |(address, _)| address)
}

fn required_str<'a>(
    data: &'a Value,
    document: &'static str,
    pointer: &str,
) -> Result<&'a str, ResolveError> {
    data.pointer(pointer)
        .and_then(Value::as_str)
        .ok_or_else(|| ResolveError::MissingField {
            document,
            field: pointer.trim_start_matches('/').replace('/', "."),
        })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::client::MockClusterApi;

    fn node(role: &str, ip: &str, fqdn: &str, public: Option<&str>) -> NodeRecord {
        let mut network_data = vec![NetworkAttachment {
            name: "management".to_string(),
            ip: Some(format!("{ip}/24")),
        }];
        if let Some(public) = public {
            network_data.push(NetworkAttachment {
                name: "public".to_string(),
                ip: Some(public.to_string()),
            });
        }
        NodeRecord {
            role: role.to_string(),
            ip: ip.to_string(),
            fqdn: fqdn.to_string(),
            network_data,
        }
    }

    fn attributes() -> Value {
        json!({
            "editable": {
                "access": {
                    "tenant": {"value": "services"},
                    "user": {"value": "nova"},
                    "password": {"value": "s3cret"}
                }
            }
        })
    }

    #[rstest]
    #[case("10.0.0.5/24", "10.0.0.5")]
    #[case("172.16.0.3", "172.16.0.3")]
    #[case("fd00::1/64", "fd00::1")]
    fn test_strip_prefix_len(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(strip_prefix_len(input), expected);
    }

    #[test]
    fn test_controllers_keep_node_order() {
        let nodes = vec![
            node("controller", "10.20.0.3", "node-1.domain", Some("172.16.0.3/24")),
            node("compute", "10.20.0.4", "node-2.domain", Some("172.16.0.4/24")),
            node("controller", "10.20.0.5", "node-3.domain", Some("172.16.0.5/24")),
        ];

        let inventory = controller_inventory(&nodes, InventoryPolicy::Abort).unwrap();

        assert_eq!(inventory.len(), 2);
        assert_eq!(inventory.controller_ips, vec!["10.20.0.3", "10.20.0.5"]);
        assert_eq!(
            inventory.controller_names,
            vec!["node-1.domain", "node-3.domain"]
        );
        assert_eq!(inventory.public_ips, vec!["172.16.0.3", "172.16.0.5"]);
    }

    #[test]
    fn test_missing_public_network_aborts() {
        let nodes = vec![
            node("controller", "10.20.0.3", "node-1.domain", Some("172.16.0.3/24")),
            node("controller", "10.20.0.5", "node-3.domain", None),
        ];

        let err = controller_inventory(&nodes, InventoryPolicy::Abort).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::MissingPublicNetwork { ref fqdn, .. } if fqdn == "node-3.domain"
        ));
    }

    #[test]
    fn test_missing_public_network_skipped() {
        let nodes = vec![
            node("controller", "10.20.0.3", "node-1.domain", None),
            node("controller", "10.20.0.5", "node-3.domain", Some("172.16.0.5/24")),
        ];

        let inventory = controller_inventory(&nodes, InventoryPolicy::Skip).unwrap();
        assert_eq!(inventory.controller_ips, vec!["10.20.0.5"]);
        assert_eq!(inventory.controller_names, vec!["node-3.domain"]);
        assert_eq!(inventory.public_ips, vec!["172.16.0.5"]);
    }

    #[test]
    fn test_parse_credentials() {
        let credentials = parse_credentials(&attributes()).unwrap();
        assert_eq!(credentials.tenant, "services");
        assert_eq!(credentials.username, "nova");
        assert_eq!(credentials.password.expose(), "s3cret");
    }

    #[test]
    fn test_parse_credentials_missing_key() {
        let data = json!({"editable": {"access": {"tenant": {"value": "admin"}}}});
        let err = parse_credentials(&data).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cluster attributes is missing 'editable.access.user.value'"
        );
    }

    #[test]
    fn test_parse_mode_missing() {
        assert!(matches!(
            parse_mode(&json!({"name": "env"})),
            Err(ResolveError::MissingField { .. })
        ));
    }

    #[tokio::test]
    async fn test_resolve_credentials_writes_identity() {
        let api = MockClusterApi::new().with_json("/api/clusters/3/attributes", attributes());
        let resolver = ClusterMetadataResolver::new(Arc::new(api), 3, InventoryPolicy::Abort);
        let mut state = ConfigurationState::default();

        resolver.resolve_credentials(&mut state).await.unwrap();

        assert_eq!(state.identity.admin_tenant_name, "services");
        assert_eq!(state.identity.admin_username, "nova");
        assert_eq!(state.identity.admin_password.expose(), "s3cret");
    }

    #[tokio::test]
    async fn test_failed_inventory_writes_nothing() {
        let api = MockClusterApi::new().with_json(
            "/api/nodes?clusters_id=3",
            json!([
                {"role": "controller", "ip": "10.20.0.3", "fqdn": "node-1",
                 "network_data": [{"name": "public", "ip": "172.16.0.3/24"}]},
                {"role": "controller", "ip": "10.20.0.4", "fqdn": "node-2",
                 "network_data": []}
            ]),
        );
        let resolver = ClusterMetadataResolver::new(Arc::new(api), 3, InventoryPolicy::Abort);
        let mut state = ConfigurationState::default();

        assert!(resolver.resolve_inventory(&mut state).await.is_err());
        assert_eq!(state, ConfigurationState::default());
    }

    #[tokio::test]
    async fn test_malformed_node_list() {
        let api = MockClusterApi::new()
            .with_json("/api/nodes?clusters_id=3", json!({"nodes": []}));
        let resolver = ClusterMetadataResolver::new(Arc::new(api), 3, InventoryPolicy::Skip);
        let mut state = ConfigurationState::default();

        let err = resolver.resolve_inventory(&mut state).await.unwrap_err();
        assert!(matches!(err, ResolveError::Shape { document: "node list", .. }));
    }

    #[rstest]
    #[case::abort_policy(InventoryPolicy::Abort)]
    #[case::skip_policy(InventoryPolicy::Skip)]
    #[tokio::test]
    async fn test_non_controller_nodes_with_null_fields(#[case] policy: InventoryPolicy) {
        let api = MockClusterApi::new().with_json(
            "/api/nodes?clusters_id=3",
            json!([
                {"role": "controller", "ip": "10.20.0.3", "fqdn": "node-1",
                 "network_data": [{"name": "public", "ip": "172.16.0.3/24"}]},
                {"role": null, "ip": null, "fqdn": null},
                {"role": "compute", "ip": null, "fqdn": null, "network_data": null}
            ]),
        );
        let resolver = ClusterMetadataResolver::new(Arc::new(api), 3, policy);
        let mut state = ConfigurationState::default();

        resolver.resolve_inventory(&mut state).await.unwrap();

        assert_eq!(state.compute.controller_nodes, vec!["10.20.0.3"]);
        assert_eq!(state.compute.controller_nodes_name, vec!["node-1"]);
        assert_eq!(state.compute.public_ips, vec!["172.16.0.3"]);
    }

    #[test]
    fn test_controller_with_null_ip_is_shape_error() {
        let nodes = vec![
            json!({"role": "compute", "ip": null, "fqdn": null}),
            json!({"role": "controller", "ip": null, "fqdn": "node-1"}),
        ];

        let err = controller_records(nodes).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Shape {
                document: "controller node",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_network_configuration_stored_verbatim() {
        let document = json!({"public_vip": "172.16.0.2", "networks": []});
        let api = MockClusterApi::new()
            .with_json("/api/clusters/3/network_configuration/", document.clone());
        let resolver = ClusterMetadataResolver::new(Arc::new(api), 3, InventoryPolicy::Abort);
        let mut state = ConfigurationState::default();

        resolver
            .resolve_network_configuration(&mut state)
            .await
            .unwrap();
        assert_eq!(state.network.raw_data, Some(document));
    }
}
