//! Best-effort resolution pipeline.
//!
//! [`ConfigOrchestrator::prepare`] runs every resolution step in order and
//! stops at the first failure. It never returns an error: the failure is
//! logged, recorded in the [`ResolutionReport`], and the state keeps whatever
//! the completed steps wrote. Fields owned by the failed and skipped steps
//! keep their previous (usually static default) values, so the harness can
//! always start.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::client::{ClusterApi, HttpClusterApi};
use crate::endpoints::EndpointResolver;
use crate::error::{ApiError, ResolveError};
use crate::identity::ClusterIdentity;
use crate::metadata::{ClusterMetadataResolver, InventoryPolicy};
use crate::proxy::{EnvProxySink, ProxyConfigurator, ProxySink};
use crate::state::ConfigurationState;

/// One resolution step, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Mode,
    Credentials,
    Inventory,
    NetworkConfiguration,
    Endpoints,
    Proxy,
}

impl Step {
    /// All steps in the order they run.
    pub const ALL: [Step; 6] = [
        Step::Mode,
        Step::Credentials,
        Step::Inventory,
        Step::NetworkConfiguration,
        Step::Endpoints,
        Step::Proxy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Step::Mode => "mode",
            Step::Credentials => "credentials",
            Step::Inventory => "inventory",
            Step::NetworkConfiguration => "network_configuration",
            Step::Endpoints => "endpoints",
            Step::Proxy => "proxy",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to a step.
#[derive(Debug)]
pub enum StepOutcome {
    Completed,
    Failed(ResolveError),
    /// Not attempted because an earlier step failed.
    Skipped,
}

impl StepOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, StepOutcome::Completed)
    }
}

#[derive(Debug)]
pub struct StepRecord {
    pub step: Step,
    pub outcome: StepOutcome,
}

/// Per-step outcome of one `prepare` run.
#[derive(Debug, Default)]
pub struct ResolutionReport {
    steps: Vec<StepRecord>,
}

impl ResolutionReport {
    fn record(&mut self, step: Step, outcome: StepOutcome) {
        self.steps.push(StepRecord { step, outcome });
    }

    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    pub fn outcome(&self, step: Step) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|record| record.step == step)
            .map(|record| &record.outcome)
    }

    /// True when every step completed.
    pub fn is_complete(&self) -> bool {
        self.steps.len() == Step::ALL.len()
            && self.steps.iter().all(|record| record.outcome.is_completed())
    }

    /// The step that stopped the pipeline and its error.
    pub fn failure(&self) -> Option<(Step, &ResolveError)> {
        self.steps.iter().find_map(|record| match &record.outcome {
            StepOutcome::Failed(err) => Some((record.step, err)),
            _ => None,
        })
    }
}

/// Sequences the resolution steps behind a single failure boundary.
///
/// `prepare` consumes the orchestrator: resolution runs once per process.
pub struct ConfigOrchestrator {
    cluster_id: u64,
    metadata: ClusterMetadataResolver,
    endpoints: EndpointResolver,
    proxy: ProxyConfigurator,
}

impl ConfigOrchestrator {
    pub fn new(
        api: Arc<dyn ClusterApi>,
        proxy_sink: Arc<dyn ProxySink>,
        cluster_id: u64,
        policy: InventoryPolicy,
    ) -> Self {
        Self {
            cluster_id,
            metadata: ClusterMetadataResolver::new(Arc::clone(&api), cluster_id, policy),
            endpoints: EndpointResolver::new(api, cluster_id),
            proxy: ProxyConfigurator::new(proxy_sink),
        }
    }

    /// Orchestrator for the harness process itself: talks HTTP to the Nailgun
    /// named by `identity` and exports the proxy as `http_proxy`.
    pub fn for_identity(
        identity: &ClusterIdentity,
        timeout: Option<Duration>,
        policy: InventoryPolicy,
    ) -> Result<Self, ApiError> {
        let api = HttpClusterApi::for_identity(identity, timeout)?;
        Ok(Self::new(
            Arc::new(api),
            Arc::new(EnvProxySink::new()),
            identity.cluster_id,
            policy,
        ))
    }

    /// Run the pipeline against `state`. Always returns normally.
    pub async fn prepare(self, state: &mut ConfigurationState) -> ResolutionReport {
        info!(cluster_id = self.cluster_id, "Resolving configuration from Nailgun");
        state.cluster_id = Some(self.cluster_id);

        let mut report = ResolutionReport::default();
        let mut failed = false;

        for step in Step::ALL {
            if failed {
                report.record(step, StepOutcome::Skipped);
                continue;
            }

            match self.run_step(step, state).await {
                Ok(()) => report.record(step, StepOutcome::Completed),
                Err(err) => {
                    warn!(
                        cluster_id = self.cluster_id,
                        step = %step,
                        error = %err,
                        "Nailgun config creation failed, continuing with partial configuration"
                    );
                    report.record(step, StepOutcome::Failed(err));
                    failed = true;
                }
            }
        }

        if !failed {
            info!(
                cluster_id = self.cluster_id,
                mode = %state.mode,
                url = %state.identity.url,
                "Configuration resolved"
            );
        }

        report
    }

    async fn run_step(
        &self,
        step: Step,
        state: &mut ConfigurationState,
    ) -> Result<(), ResolveError> {
        match step {
            Step::Mode => self.metadata.resolve_mode(state).await,
            Step::Credentials => self.metadata.resolve_credentials(state).await,
            Step::Inventory => self.metadata.resolve_inventory(state).await,
            Step::NetworkConfiguration => self.metadata.resolve_network_configuration(state).await,
            Step::Endpoints => self.endpoints.derive_endpoints(state).await.map(|_| ()),
            Step::Proxy => self.proxy.configure_proxy(state).map(|_| ()),
        }
    }
}
