//! Static configuration defaults.
//!
//! Sources, lowest to highest priority:
//! 1. Built-in group defaults (see [`crate::state`])
//! 2. A TOML file with one table per group (`[identity]`, `[compute]`, ...)
//! 3. Environment variables, e.g. `FUEL__IDENTITY__ADMIN_USERNAME=admin`
//!    (list fields take comma-separated values)
//!
//! Environment values reach the state as strings. Numeric and boolean fields
//! are converted on deserialization; string fields keep the value verbatim.
//!
//! The file is picked from `CUSTOM_FUEL_CONFIG`, or from `FUEL_CONFIG_DIR`
//! and `FUEL_CONFIG`, falling back to `/etc/fuel/test.toml`. A missing file
//! is not an error.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use tracing::{info, warn};

use crate::error::DefaultsError;
use crate::proxy::ProxyConfigurator;
use crate::state::ConfigurationState;

pub const CUSTOM_CONFIG_VAR: &str = "CUSTOM_FUEL_CONFIG";
pub const CONFIG_DIR_VAR: &str = "FUEL_CONFIG_DIR";
pub const CONFIG_FILE_VAR: &str = "FUEL_CONFIG";

pub const DEFAULT_CONFIG_FILE: &str = "test.toml";
pub const FAILSAFE_CONFIG_PATH: &str = "/etc/fuel/test.toml";

/// Prefix of environment overrides (`FUEL__<GROUP>__<FIELD>`).
const ENV_PREFIX: &str = "FUEL";
const ENV_SEPARATOR: &str = "__";

/// Directory holding the bundled defaults file.
pub fn default_config_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("etc")
}

/// Pick the defaults file through an arbitrary variable lookup.
pub fn locate_config_path<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(custom) = lookup(CUSTOM_CONFIG_VAR).filter(|v| !v.is_empty()) {
        return PathBuf::from(custom);
    }

    let dir = lookup(CONFIG_DIR_VAR);
    let file = lookup(CONFIG_FILE_VAR);
    let explicit = dir.is_some() || file.is_some();

    let path = dir
        .map(PathBuf::from)
        .unwrap_or_else(default_config_dir)
        .join(file.as_deref().unwrap_or(DEFAULT_CONFIG_FILE));

    if path.is_file() || explicit {
        path
    } else {
        PathBuf::from(FAILSAFE_CONFIG_PATH)
    }
}

/// Where static defaults are read from.
#[derive(Debug, Clone, Default)]
pub struct DefaultsSource {
    file: Option<PathBuf>,
    env: Option<HashMap<String, String>>,
}

impl DefaultsSource {
    /// Built-in defaults plus environment overrides, no file.
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Use the file selected by the process environment.
    pub fn locate() -> Self {
        Self::file(locate_config_path(|name| std::env::var(name).ok()))
    }

    /// Use an explicit file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            file: Some(path.into()),
            env: None,
        }
    }

    /// Read overrides from `vars` instead of the process environment.
    pub fn with_env(mut self, vars: HashMap<String, String>) -> Self {
        self.env = Some(vars);
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Build the initial configuration state.
    pub fn load(&self) -> Result<ConfigurationState, DefaultsError> {
        let mut builder = Config::builder();

        if let Some(path) = &self.file {
            if path.is_file() {
                info!(path = %path.display(), "Using fuel config file");
                builder = builder.add_source(File::from(path.as_path()).format(FileFormat::Toml));
            } else {
                warn!(path = %path.display(), "Config file not found, using built-in defaults");
            }
        }

        // Values stay strings here ("0123" must not become 123); the compute
        // group splits its own list fields.
        let mut environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .ignore_empty(true);
        if let Some(vars) = &self.env {
            environment = environment.source(Some(vars.clone().into_iter().collect()));
        }

        builder
            .add_source(environment)
            .build()
            .and_then(|config| config.try_deserialize::<ConfigurationState>())
            .map_err(|source| match &self.file {
                Some(path) => DefaultsError::Load {
                    path: path.clone(),
                    source,
                },
                None => DefaultsError::Environment(source),
            })
    }

    /// Load the defaults and install the proxy of the first configured
    /// controller. For runs that never contact Nailgun.
    ///
    /// An empty controller list only skips the proxy.
    pub fn load_with_proxy(
        &self,
        proxy: &ProxyConfigurator,
    ) -> Result<(ConfigurationState, Option<String>), DefaultsError> {
        let state = self.load()?;

        let proxy_url = match proxy.configure_proxy(&state) {
            Ok(url) => Some(url),
            Err(error) => {
                warn!(%error, "No HTTP proxy from static defaults");
                None
            }
        };

        Ok((state, proxy_url))
    }
}
