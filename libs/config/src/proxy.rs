//! HTTP proxy setup for the harness.
//!
//! Test traffic to the cluster goes through the proxy listening on the first
//! controller. The proxy URL is handed to a [`ProxySink`]; in production that
//! is the `http_proxy` environment variable of the current process.

use std::sync::{Arc, Mutex};

use tracing::info;

use crate::error::ResolveError;
use crate::state::ConfigurationState;

/// Port of the proxy running on the controllers.
pub const PROXY_PORT: u16 = 8888;

/// Environment variable the proxy URL is exported through.
pub const HTTP_PROXY_VAR: &str = "http_proxy";

/// Destination for the derived proxy URL.
pub trait ProxySink: Send + Sync {
    fn install(&self, proxy_url: &str);
}

/// Exports the proxy URL through an environment variable of the whole
/// process (`http_proxy` unless told otherwise).
#[derive(Debug, Clone, Copy)]
pub struct EnvProxySink {
    var: &'static str,
}

impl EnvProxySink {
    pub fn new() -> Self {
        Self::with_var(HTTP_PROXY_VAR)
    }

    pub fn with_var(var: &'static str) -> Self {
        Self { var }
    }

    pub fn var(&self) -> &'static str {
        self.var
    }
}

impl Default for EnvProxySink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProxySink for EnvProxySink {
    fn install(&self, proxy_url: &str) {
        // Runs during single-threaded startup, before test threads exist.
        std::env::set_var(self.var, proxy_url);
    }
}

/// Keeps the last installed proxy URL in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryProxySink {
    installed: Arc<Mutex<Option<String>>>,
}

impl MemoryProxySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last installed proxy URL, if any.
    pub fn installed(&self) -> Option<String> {
        self.installed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ProxySink for MemoryProxySink {
    fn install(&self, proxy_url: &str) {
        *self
            .installed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(proxy_url.to_string());
    }
}

/// Derives the proxy URL from the controller inventory.
pub struct ProxyConfigurator {
    sink: Arc<dyn ProxySink>,
}

impl ProxyConfigurator {
    pub fn new(sink: Arc<dyn ProxySink>) -> Self {
        Self { sink }
    }

    /// Install `http://{first controller}:8888`. Must run after inventory
    /// resolution.
    pub fn configure_proxy(&self, state: &ConfigurationState) -> Result<String, ResolveError> {
        let controller = state
            .compute
            .controller_nodes
            .first()
            .ok_or(ResolveError::Empty("compute.controller_nodes"))?;

        let proxy_url = format!("http://{controller}:{PROXY_PORT}");
        self.sink.install(&proxy_url);

        info!(proxy = %proxy_url, "Configured HTTP proxy");
        Ok(proxy_url)
    }
}
