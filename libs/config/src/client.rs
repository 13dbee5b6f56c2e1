//! Nailgun API client.
//!
//! The client performs plain GET requests and decodes JSON bodies. It does not
//! retry and does not interpret results; that is left to the resolvers.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::identity::ClusterIdentity;

/// Paths of the Nailgun resources consumed during resolution.
pub mod paths {
    pub fn cluster(cluster_id: u64) -> String {
        format!("/api/clusters/{cluster_id}")
    }

    pub fn cluster_attributes(cluster_id: u64) -> String {
        format!("/api/clusters/{cluster_id}/attributes")
    }

    pub fn cluster_nodes(cluster_id: u64) -> String {
        format!("/api/nodes?clusters_id={cluster_id}")
    }

    pub fn network_configuration(cluster_id: u64) -> String {
        format!("/api/clusters/{cluster_id}/network_configuration/")
    }

    pub fn ostf(cluster_id: u64) -> String {
        format!("/api/ostf/{cluster_id}")
    }
}

/// Read access to the management API.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// GET `path` (relative to the API base URL) and decode the JSON body.
    async fn get_json(&self, path: &str) -> Result<Value, ApiError>;
}

/// HTTP implementation of [`ClusterApi`].
#[derive(Debug, Clone)]
pub struct HttpClusterApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpClusterApi {
    /// Create a client bound to `base_url`.
    ///
    /// Proxy environment variables are ignored: the resolver itself installs
    /// `http_proxy` for the harness, and that proxy must not carry API calls.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder().no_proxy();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ApiError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client for the Nailgun instance named by `identity`.
    pub fn for_identity(
        identity: &ClusterIdentity,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        Self::new(&identity.nailgun_url(), timeout)
    }

    /// Build a URL for an API path.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ClusterApi for HttpClusterApi {
    async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|source| ApiError::Network {
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        info!(path = %path, status = status.as_u16(), "Nailgun response");

        let body = response.text().await.map_err(|source| ApiError::Network {
            path: path.to_string(),
            source,
        })?;

        if !status.is_success() {
            return Err(ApiError::Status {
                path: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        debug!(path = %path, bytes = body.len(), "Decoding Nailgun response");
        serde_json::from_str(&body).map_err(|source| ApiError::Decode {
            path: path.to_string(),
            source,
        })
    }
}

#[derive(Debug, Clone)]
enum MockResponse {
    Json(Value),
    Status(u16),
}

/// In-memory [`ClusterApi`] serving canned documents.
///
/// Every request is recorded so callers can assert which lookups ran.
#[derive(Debug, Default)]
pub struct MockClusterApi {
    responses: HashMap<String, MockResponse>,
    calls: Mutex<Vec<String>>,
}

impl MockClusterApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `path`.
    pub fn with_json(mut self, path: impl Into<String>, body: Value) -> Self {
        self.responses.insert(path.into(), MockResponse::Json(body));
        self
    }

    /// Answer `path` with an error status.
    pub fn with_status(mut self, path: impl Into<String>, status: u16) -> Self {
        self.responses
            .insert(path.into(), MockResponse::Status(status));
        self
    }

    /// Paths requested so far, in request order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Whether `path` has been requested.
    pub fn was_called(&self, path: &str) -> bool {
        self.calls().iter().any(|p| p == path)
    }
}

#[async_trait]
impl ClusterApi for MockClusterApi {
    async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(path.to_string());

        match self.responses.get(path) {
            Some(MockResponse::Json(body)) => Ok(body.clone()),
            Some(MockResponse::Status(status)) => Err(ApiError::Status {
                path: path.to_string(),
                status: *status,
                body: String::new(),
            }),
            None => Err(ApiError::Unregistered(path.to_string())),
        }
    }
}
