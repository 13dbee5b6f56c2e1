//! Location of the management API and the cluster under test.

use crate::error::IdentityError;

pub const NAILGUN_HOST_VAR: &str = "NAILGUN_HOST";
pub const NAILGUN_PORT_VAR: &str = "NAILGUN_PORT";
pub const CLUSTER_ID_VAR: &str = "CLUSTER_ID";

/// Identity of the cluster under test and of the Nailgun API serving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterIdentity {
    pub nailgun_host: String,
    pub nailgun_port: u16,
    pub cluster_id: u64,
}

impl ClusterIdentity {
    pub fn new(nailgun_host: impl Into<String>, nailgun_port: u16, cluster_id: u64) -> Self {
        Self {
            nailgun_host: nailgun_host.into(),
            nailgun_port,
            cluster_id,
        }
    }

    /// Load the identity from `NAILGUN_HOST`, `NAILGUN_PORT` and `CLUSTER_ID`.
    pub fn from_env() -> Result<Self, IdentityError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load the identity through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, IdentityError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let nailgun_host = lookup(NAILGUN_HOST_VAR)
            .filter(|v| !v.trim().is_empty())
            .ok_or(IdentityError::Missing(NAILGUN_HOST_VAR))?;

        let nailgun_port = parse_var(&lookup, NAILGUN_PORT_VAR)?;
        let cluster_id = parse_var(&lookup, CLUSTER_ID_VAR)?;

        Ok(Self {
            nailgun_host: nailgun_host.trim().to_string(),
            nailgun_port,
            cluster_id,
        })
    }

    /// Base URL of the Nailgun API (no trailing slash).
    pub fn nailgun_url(&self) -> String {
        format!("http://{}:{}", self.nailgun_host, self.nailgun_port)
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str) -> Result<T, IdentityError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(name).ok_or(IdentityError::Missing(name))?;
    raw.trim().parse().map_err(|_| IdentityError::Invalid {
        name,
        value: raw.clone(),
    })
}
