//! Configuration resolution for the fuel health-check harness.
//!
//! The harness runs against a deployed cluster and needs to know where that
//! cluster's endpoints live. Two sources feed [`ConfigurationState`]:
//!
//! - static defaults (compiled-in values, an optional TOML file and `FUEL__*`
//!   environment overrides), see [`defaults`]
//! - the Nailgun management API, queried once at startup, see [`orchestrator`]
//!
//! ## Resolution pipeline
//!
//! ```text
//! ConfigOrchestrator::prepare
//! ├── ClusterMetadataResolver   (mode, credentials, inventory, network config)
//! ├── EndpointResolver          (identity url/uri, HA fallback via OSTF)
//! └── ProxyConfigurator         (http_proxy from the first controller)
//! ```
//!
//! Resolution is best effort: `prepare` never fails. The first failing step is
//! logged, recorded in the returned [`ResolutionReport`], and the state keeps
//! whatever the completed steps wrote.

pub mod client;
pub mod defaults;
pub mod endpoints;
pub mod error;
pub mod identity;
pub mod metadata;
pub mod orchestrator;
pub mod proxy;
pub mod state;

// Re-export commonly used types
pub use client::{ClusterApi, HttpClusterApi, MockClusterApi};
pub use defaults::DefaultsSource;
pub use endpoints::EndpointResolver;
pub use error::{ApiError, DefaultsError, IdentityError, ResolveError};
pub use identity::ClusterIdentity;
pub use metadata::{ClusterMetadataResolver, InventoryPolicy};
pub use orchestrator::{ConfigOrchestrator, ResolutionReport, Step, StepOutcome};
pub use proxy::{EnvProxySink, MemoryProxySink, ProxyConfigurator, ProxySink};
pub use state::{ClusterMode, ConfigurationState};
