//! Drift detection between deployed and registered configuration versions.

use super::versions::{RegistryServiceError, RegistryServiceResult};
use crate::config_diff::{ConfigDiff, diff_configs};
use crate::registry::{
    domain::{ConfigVersion, ConnectorDeploymentState, ConnectorId, RegistryName, VersionNumber},
    ports::{ConfigVersionRepository, DeploymentStateRepository},
};
use mockable::Clock;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Snapshot of a connector's drift against its registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftReport {
    /// Current deployment state.
    pub state: ConnectorDeploymentState,
    /// Pinned registry version, else the registry's latest.
    pub effective_registry_version: Option<VersionNumber>,
    /// Whether the deployment lags the effective registry version.
    pub pending_update: bool,
    /// Changes since the last deployment; present only when pending.
    pub diff: Option<ConfigDiff>,
}

/// Tracks deployment state and reports drift for connectors.
#[derive(Clone)]
pub struct DriftDetector<R, D, C>
where
    R: ConfigVersionRepository,
    D: DeploymentStateRepository,
    C: Clock + Send + Sync,
{
    versions: Arc<R>,
    states: Arc<D>,
    clock: Arc<C>,
}

impl<R, D, C> DriftDetector<R, D, C>
where
    R: ConfigVersionRepository,
    D: DeploymentStateRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new drift detector.
    #[must_use]
    pub const fn new(versions: Arc<R>, states: Arc<D>, clock: Arc<C>) -> Self {
        Self {
            versions,
            states,
            clock,
        }
    }

    /// Starts tracking a connector, or refreshes the registry name and live
    /// configuration of an already tracked one. Recorded versions are
    /// preserved.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::DeploymentState`] when persistence
    /// fails.
    pub async fn track_connector(
        &self,
        connector_id: ConnectorId,
        registry_name: RegistryName,
        last_known_config: Option<Value>,
    ) -> RegistryServiceResult<ConnectorDeploymentState> {
        let mut state = match self.states.find(connector_id).await? {
            Some(mut existing) => {
                if existing.registry_name() != &registry_name {
                    existing.rename_registry(registry_name, &*self.clock);
                }
                existing
            }
            None => ConnectorDeploymentState::new(connector_id, registry_name, &*self.clock),
        };
        if let Some(config) = last_known_config {
            state.record_live_config(config, &*self.clock);
        }

        self.states.upsert(&state).await?;
        info!(
            connector = %connector_id,
            registry = %state.registry_name(),
            "tracking connector deployment state"
        );
        Ok(state)
    }

    /// Records that `version` is now deployed for the connector.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::ConnectorNotTracked`] for unknown
    /// connectors and [`RegistryServiceError::VersionNotFound`] when the
    /// version is not in the connector's registry.
    pub async fn record_deployment(
        &self,
        connector_id: ConnectorId,
        version: VersionNumber,
    ) -> RegistryServiceResult<ConnectorDeploymentState> {
        let mut state = self.require_state(connector_id).await?;
        self.require_version(state.registry_name(), version).await?;

        state.record_deployment(version, &*self.clock);
        self.states.upsert(&state).await?;
        info!(connector = %connector_id, version = %version, "recorded deployment");
        Ok(state)
    }

    /// Pins the connector's active registry version, or unpins it with
    /// `None` so the registry's latest applies.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::ConnectorNotTracked`] for unknown
    /// connectors and [`RegistryServiceError::VersionNotFound`] when a pinned
    /// version is not in the connector's registry.
    pub async fn pin_registry_version(
        &self,
        connector_id: ConnectorId,
        version: Option<VersionNumber>,
    ) -> RegistryServiceResult<ConnectorDeploymentState> {
        let mut state = self.require_state(connector_id).await?;
        if let Some(pinned) = version {
            self.require_version(state.registry_name(), pinned).await?;
        }

        state.pin_registry_version(version, &*self.clock);
        self.states.upsert(&state).await?;
        debug!(connector = %connector_id, pinned = ?version, "updated pinned registry version");
        Ok(state)
    }

    /// Computes the diff from the deployed configuration to a registry
    /// version.
    ///
    /// The deployed side is the recorded snapshot of `deployed_version`.
    /// When that is unset or predates recorded history, `live_fallback` is
    /// used; with no fallback an unset version compares against an empty
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::VersionNotFound`] when
    /// `registry_version` is absent, or when `deployed_version` is absent
    /// and no fallback is supplied.
    pub async fn compute_drift_diff(
        &self,
        registry_name: &RegistryName,
        deployed_version: Option<VersionNumber>,
        registry_version: VersionNumber,
        live_fallback: Option<&Value>,
    ) -> RegistryServiceResult<ConfigDiff> {
        let target = self.require_version(registry_name, registry_version).await?;
        let deployed_record = match deployed_version {
            Some(version) => self.versions.find_version(registry_name, version).await?,
            None => None,
        };

        let empty = Value::Object(Map::new());
        let previous = match (deployed_record.as_ref(), live_fallback, deployed_version) {
            (Some(record), _, _) => record.config(),
            (None, Some(live), _) => live,
            (None, None, None) => &empty,
            (None, None, Some(version)) => {
                return Err(RegistryServiceError::VersionNotFound {
                    registry_name: registry_name.clone(),
                    version,
                });
            }
        };

        Ok(diff_configs(previous, target.config()))
    }

    /// Reports whether a connector lags its registry and what changed.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::ConnectorNotTracked`] for unknown
    /// connectors and propagates repository failures.
    pub async fn drift_report(
        &self,
        connector_id: ConnectorId,
    ) -> RegistryServiceResult<DriftReport> {
        let state = self.require_state(connector_id).await?;
        let effective_registry_version = match state.registry_version() {
            Some(pinned) => Some(pinned),
            None => self.versions.latest_version(state.registry_name()).await?,
        };
        let pending_update = state.pending_update_against(effective_registry_version);

        let diff = match effective_registry_version {
            Some(target) if pending_update => Some(
                self.compute_drift_diff(
                    state.registry_name(),
                    state.last_deployed_version(),
                    target,
                    state.last_known_config(),
                )
                .await?,
            ),
            _ => None,
        };

        Ok(DriftReport {
            state,
            effective_registry_version,
            pending_update,
            diff,
        })
    }

    async fn require_state(
        &self,
        connector_id: ConnectorId,
    ) -> RegistryServiceResult<ConnectorDeploymentState> {
        self.states
            .find(connector_id)
            .await?
            .ok_or(RegistryServiceError::ConnectorNotTracked(connector_id))
    }

    async fn require_version(
        &self,
        registry_name: &RegistryName,
        version: VersionNumber,
    ) -> RegistryServiceResult<ConfigVersion> {
        self.versions
            .find_version(registry_name, version)
            .await?
            .ok_or_else(|| RegistryServiceError::VersionNotFound {
                registry_name: registry_name.clone(),
                version,
            })
    }
}
