//! Grouped configuration state consumed by the health-check harness.
//!
//! Every group is a fixed set of fields with static defaults. The state is
//! seeded from [`crate::defaults`] and then overwritten field by field by the
//! resolution pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Deployment mode of the cluster under test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterMode {
    /// Redundant controllers fronted by a virtual IP.
    Ha,
    /// Any other deployment mode.
    NonHa,
    /// Not resolved yet.
    #[default]
    Unknown,
}

impl ClusterMode {
    /// Interpret the `mode` value returned by the management API.
    ///
    /// Only the exact value `ha` selects HA handling.
    pub fn from_api(value: &str) -> Self {
        if value == "ha" {
            ClusterMode::Ha
        } else {
            ClusterMode::NonHa
        }
    }

    pub fn is_ha(self) -> bool {
        self == ClusterMode::Ha
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ClusterMode::Ha => "ha",
            ClusterMode::NonHa => "non_ha",
            ClusterMode::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ClusterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A string value that must not end up in logs or printed output.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the underlying value.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(********)")
    }
}

impl Serialize for Secret {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("********")
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// String lists that accept either a sequence or one comma-separated string.
pub(crate) mod comma_list {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrJoined {
        List(Vec<String>),
        Joined(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match ListOrJoined::deserialize(deserializer)? {
            ListOrJoined::List(items) => items,
            ListOrJoined::Joined(joined) => split(&joined),
        })
    }

    pub(crate) fn split(joined: &str) -> Vec<String> {
        joined
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Keystone options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdentityGroup {
    /// Catalog type of the Identity service.
    pub catalog_type: String,

    /// Set to true when the environment uses self-signed certificates.
    pub disable_ssl_certificate_validation: bool,

    /// Full URI of the Identity API, v2.
    pub uri: String,

    /// Dashboard URL.
    pub url: String,

    /// Auth method used by the environment (basic|keystone).
    pub strategy: String,

    pub admin_username: String,
    pub admin_tenant_name: String,
    pub admin_password: Secret,
}

impl Default for IdentityGroup {
    fn default() -> Self {
        Self {
            catalog_type: "identity".to_string(),
            disable_ssl_certificate_validation: false,
            uri: "http://192.168.56.103:5000/v2.0/".to_string(),
            url: "http://192.168.56.103/".to_string(),
            strategy: "keystone".to_string(),
            admin_username: "admin".to_string(),
            admin_tenant_name: "admin".to_string(),
            admin_password: Secret::new("user"),
        }
    }
}

/// Compute service options, including the resolved controller inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComputeGroup {
    /// Whether the environment supports snapshots.
    pub create_image_enabled: bool,

    /// Seconds between build status checks.
    pub build_interval: u64,

    /// Seconds to wait for an instance to build.
    pub build_timeout: u64,

    /// Seconds to wait for SSH authentication.
    pub ssh_timeout: u64,

    /// Seconds to wait for output from an SSH channel.
    pub ssh_channel_timeout: u64,

    pub catalog_type: String,

    /// Private key for SSH access to remote hosts.
    pub path_to_private_key: String,

    /// Management IPs of the controller nodes.
    #[serde(deserialize_with = "comma_list::deserialize")]
    pub controller_nodes: Vec<String>,

    /// FQDNs of the controller nodes, parallel to `controller_nodes`.
    #[serde(deserialize_with = "comma_list::deserialize")]
    pub controller_nodes_name: Vec<String>,

    /// Public IPs of the controller nodes, parallel to `controller_nodes`.
    #[serde(deserialize_with = "comma_list::deserialize")]
    pub public_ips: Vec<String>,

    pub controller_node_ssh_user: String,
    pub controller_node_ssh_password: Secret,

    /// Image used by tests that boot instances.
    pub image_name: String,

    /// Flavor used by tests that boot instances.
    pub flavor_ref: u32,
}

impl Default for ComputeGroup {
    fn default() -> Self {
        Self {
            create_image_enabled: true,
            build_interval: 10,
            build_timeout: 160,
            ssh_timeout: 50,
            ssh_channel_timeout: 20,
            catalog_type: "compute".to_string(),
            path_to_private_key: "~/.ssh/id_rsa".to_string(),
            controller_nodes: vec!["192.168.56.103".to_string()],
            controller_nodes_name: Vec::new(),
            public_ips: Vec::new(),
            controller_node_ssh_user: "stack".to_string(),
            controller_node_ssh_password: Secret::new("user"),
            image_name: "TestVM".to_string(),
            flavor_ref: 1,
        }
    }
}

/// Image service options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageGroup {
    pub api_version: String,
    pub catalog_type: String,
}

impl Default for ImageGroup {
    fn default() -> Self {
        Self {
            api_version: "1".to_string(),
            catalog_type: "image".to_string(),
        }
    }
}

/// Network service options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkGroup {
    pub catalog_type: String,

    /// CIDR block tenant networks are allocated from.
    pub tenant_network_cidr: String,

    /// Whether tenant network connectivity is evaluated directly.
    pub tenant_networks_reachable: bool,

    pub neutron_available: bool,

    /// Network configuration document as returned by Nailgun.
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<serde_json::Value>,
}

impl Default for NetworkGroup {
    fn default() -> Self {
        Self {
            catalog_type: "network".to_string(),
            tenant_network_cidr: "10.13.0.0/16".to_string(),
            tenant_networks_reachable: true,
            neutron_available: false,
            raw_data: None,
        }
    }
}

/// Block storage options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VolumeGroup {
    /// Seconds between volume availability checks.
    pub build_interval: u64,

    /// Seconds to wait for a volume to become available.
    pub build_timeout: u64,

    pub catalog_type: String,
}

impl Default for VolumeGroup {
    fn default() -> Self {
        Self {
            build_interval: 10,
            build_timeout: 180,
            catalog_type: "volume".to_string(),
        }
    }
}

/// Complete configuration state for one harness process.
///
/// Constructed once at startup and passed explicitly to everything that needs
/// it. Only the resolution pipeline writes to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigurationState {
    #[serde(skip_deserializing)]
    pub mode: ClusterMode,

    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<u64>,

    pub identity: IdentityGroup,
    pub compute: ComputeGroup,
    pub image: ImageGroup,
    pub network: NetworkGroup,
    pub volume: VolumeGroup,
}
