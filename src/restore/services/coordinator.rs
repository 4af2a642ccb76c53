//! Orchestration of staging, applying, and dismissing restores.

use crate::config::ConnectorVersionsConfig;
use crate::registry::{
    domain::{
        ConfigVersion, ConnectorDeploymentState, ConnectorId, RegistryDomainError, RegistryName,
        VersionNumber,
    },
    ports::{
        ConfigVersionRepository, DeploymentStateError, DeploymentStateRepository,
        VersionRegistryError,
    },
};
use crate::restore::{
    domain::{ConnectorType, PipelineId, RestoreLifecycleState, StagedRestore, StagedRestoreId},
    ports::{DeploymentTarget, DeploymentTargetError, StagingRepository, StagingRepositoryError},
};
use mockable::Clock;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Service-level errors for restore operations.
#[derive(Debug, Error)]
pub enum RestoreServiceError {
    /// The target version is absent from the registry history.
    #[error("version {version} not found for registry {registry_name}")]
    VersionNotFound {
        /// Registry that was queried.
        registry_name: RegistryName,
        /// Missing version.
        version: VersionNumber,
    },

    /// No deployment state is recorded for the connector.
    #[error("connector {0} is not tracked")]
    ConnectorNotTracked(ConnectorId),

    /// No staged restore exists with the identifier.
    #[error("staged restore {0} not found")]
    StagedRestoreNotFound(StagedRestoreId),

    /// The staging store is not provisioned or reachable.
    #[error("staging unavailable: {0}")]
    StagingUnavailable(StagingRepositoryError),

    /// Activation failed or timed out; the staged restore is kept for retry.
    #[error("deployment of '{connector_name}' failed: {source}")]
    DeploymentError {
        /// Connector name on the deployment target.
        connector_name: String,
        /// Underlying deployment target failure.
        #[source]
        source: DeploymentTargetError,
    },

    /// The stored target payload failed verification.
    #[error(transparent)]
    Domain(#[from] RegistryDomainError),

    /// Staging repository operation failed.
    #[error(transparent)]
    Staging(StagingRepositoryError),

    /// Version repository operation failed.
    #[error(transparent)]
    Repository(#[from] VersionRegistryError),

    /// Deployment state repository operation failed.
    #[error(transparent)]
    DeploymentState(#[from] DeploymentStateError),
}

impl From<StagingRepositoryError> for RestoreServiceError {
    fn from(err: StagingRepositoryError) -> Self {
        if err.is_unavailable() {
            warn!(error = %err, "staging store unavailable, restore staging disabled");
            Self::StagingUnavailable(err)
        } else {
            Self::Staging(err)
        }
    }
}

/// Result type for restore service operations.
pub type RestoreServiceResult<T> = Result<T, RestoreServiceError>;

/// Request payload for staging a restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageRestoreRequest {
    pipeline_id: PipelineId,
    connector_id: ConnectorId,
    connector_type: ConnectorType,
    target_version: VersionNumber,
}

impl StageRestoreRequest {
    /// Creates a stage request.
    #[must_use]
    pub const fn new(
        pipeline_id: PipelineId,
        connector_id: ConnectorId,
        connector_type: ConnectorType,
        target_version: VersionNumber,
    ) -> Self {
        Self {
            pipeline_id,
            connector_id,
            connector_type,
            target_version,
        }
    }
}

/// Restore options offered for a connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreCandidates {
    /// Current deployment state.
    pub state: ConnectorDeploymentState,
    /// Most recent versions, newest first.
    pub versions: Vec<ConfigVersion>,
    /// The pending restore, if any.
    pub staged: Option<StagedRestore>,
    /// `false` when the staging store could not be used; the listing is
    /// then read-only.
    pub staging_available: bool,
}

/// Tunables for [`RestoreCoordinator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreSettings {
    deployment_timeout: Duration,
    history_limit: usize,
}

impl Default for RestoreSettings {
    fn default() -> Self {
        Self::from_config(&ConnectorVersionsConfig::default())
    }
}

impl RestoreSettings {
    /// Extracts restore settings from the crate configuration.
    #[must_use]
    pub const fn from_config(config: &ConnectorVersionsConfig) -> Self {
        Self {
            deployment_timeout: config.deployment_timeout(),
            history_limit: config.history_limit,
        }
    }

    /// Sets the activation timeout.
    #[must_use]
    pub const fn with_deployment_timeout(mut self, deployment_timeout: Duration) -> Self {
        self.deployment_timeout = deployment_timeout;
        self
    }

    /// Sets the number of restore candidates listed.
    #[must_use]
    pub const fn with_history_limit(mut self, history_limit: usize) -> Self {
        self.history_limit = history_limit;
        self
    }

    /// Returns the activation timeout.
    #[must_use]
    pub const fn deployment_timeout(&self) -> Duration {
        self.deployment_timeout
    }

    /// Returns the number of restore candidates listed.
    #[must_use]
    pub const fn history_limit(&self) -> usize {
        self.history_limit
    }
}

/// Stages restores and applies them against the deployment target.
///
/// Applying runs three steps, each completing before the next starts:
/// activation on the target, deployment state update, staged row removal.
/// A failure leaves every later step undone, so the staged row survives for
/// retry.
#[derive(Clone)]
pub struct RestoreCoordinator<R, D, S, T, C>
where
    R: ConfigVersionRepository,
    D: DeploymentStateRepository,
    S: StagingRepository,
    T: DeploymentTarget,
    C: Clock + Send + Sync,
{
    versions: Arc<R>,
    states: Arc<D>,
    staging: Arc<S>,
    target: Arc<T>,
    clock: Arc<C>,
    settings: RestoreSettings,
}

impl<R, D, S, T, C> RestoreCoordinator<R, D, S, T, C>
where
    R: ConfigVersionRepository,
    D: DeploymentStateRepository,
    S: StagingRepository,
    T: DeploymentTarget,
    C: Clock + Send + Sync,
{
    /// Creates a coordinator with default settings.
    #[must_use]
    pub fn new(
        versions: Arc<R>,
        states: Arc<D>,
        staging: Arc<S>,
        target: Arc<T>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            versions,
            states,
            staging,
            target,
            clock,
            settings: RestoreSettings::default(),
        }
    }

    /// Replaces the coordinator settings.
    #[must_use]
    pub const fn with_settings(mut self, settings: RestoreSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Stages `target_version` for a connector, replacing any restore
    /// already staged for the same pipeline and connector.
    ///
    /// The diff is computed against the recorded snapshot of the deployed
    /// version, else the connector's last-known configuration, else an
    /// empty configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RestoreServiceError::ConnectorNotTracked`],
    /// [`RestoreServiceError::VersionNotFound`], or
    /// [`RestoreServiceError::StagingUnavailable`]; nothing is written on
    /// failure.
    pub async fn stage_restore(
        &self,
        request: StageRestoreRequest,
    ) -> RestoreServiceResult<StagedRestore> {
        let state = self.require_state(request.connector_id).await?;
        let target = self
            .require_version(state.registry_name(), request.target_version)
            .await?;
        let current = self.current_config(&state).await?;

        let staged = StagedRestore::new(
            request.pipeline_id,
            request.connector_id,
            request.connector_type,
            &target,
            &current,
            &*self.clock,
        );
        let stored = self.staging.stage(&staged).await?;

        info!(
            pipeline = %stored.pipeline_id(),
            connector = %stored.connector_id(),
            staged_restore = %stored.id(),
            target_version = %stored.target_version(),
            "staged configuration restore"
        );
        Ok(stored)
    }

    /// Applies a staged restore and returns the updated deployment state.
    ///
    /// # Errors
    ///
    /// Returns [`RestoreServiceError::DeploymentError`] when activation fails
    /// or exceeds the configured timeout, leaving deployment state and the
    /// staged row untouched. Returns
    /// [`RestoreServiceError::StagedRestoreNotFound`] for unknown
    /// identifiers.
    pub async fn apply_staged_restore(
        &self,
        staged_restore_id: StagedRestoreId,
    ) -> RestoreServiceResult<ConnectorDeploymentState> {
        let staged = self
            .staging
            .find_by_id(staged_restore_id)
            .await?
            .ok_or(RestoreServiceError::StagedRestoreNotFound(staged_restore_id))?;
        self.require_state(staged.connector_id()).await?;
        let target = self
            .require_version(staged.registry_name(), staged.target_version())
            .await?;
        target.verify_checksum()?;

        let connector_name = staged.registry_name().as_str();
        self.activate_with_timeout(connector_name, &target).await?;

        // Activation can take up to the timeout; pick up any tracking change
        // made meanwhile instead of overwriting it.
        let mut state = self.require_state(staged.connector_id()).await?;
        let applied = target.version();
        state.record_deployment(applied, &*self.clock);
        state.pin_registry_version(Some(applied), &*self.clock);
        state.record_live_config(target.config().clone(), &*self.clock);
        self.states.upsert(&state).await?;

        self.staging.remove(staged_restore_id).await?;
        info!(
            connector = %staged.connector_id(),
            staged_restore = %staged_restore_id,
            version = %applied,
            "applied staged restore"
        );
        Ok(state)
    }

    /// Deletes a staged restore without applying it. Returns `false` when
    /// nothing was staged under the identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RestoreServiceError::StagingUnavailable`] or
    /// [`RestoreServiceError::Staging`] when the store fails.
    pub async fn dismiss_staged_restore(
        &self,
        staged_restore_id: StagedRestoreId,
    ) -> RestoreServiceResult<bool> {
        let removed = self.staging.remove(staged_restore_id).await?;
        if removed {
            info!(staged_restore = %staged_restore_id, "dismissed staged restore");
        }
        Ok(removed)
    }

    /// Lists staged restores for a pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`RestoreServiceError::StagingUnavailable`] or
    /// [`RestoreServiceError::Staging`] when the store fails.
    pub async fn list_staged_by_pipeline(
        &self,
        pipeline_id: PipelineId,
    ) -> RestoreServiceResult<Vec<StagedRestore>> {
        Ok(self.staging.list_by_pipeline(pipeline_id).await?)
    }

    /// Returns the restore lifecycle state of a connector in a pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`RestoreServiceError::StagingUnavailable`] or
    /// [`RestoreServiceError::Staging`] when the store fails.
    pub async fn restore_state(
        &self,
        pipeline_id: PipelineId,
        connector_id: ConnectorId,
    ) -> RestoreServiceResult<RestoreLifecycleState> {
        let staged = self
            .staging
            .find_by_connector(pipeline_id, connector_id)
            .await?;
        Ok(RestoreLifecycleState::from(staged))
    }

    /// Lists the versions a connector can be restored to, with any pending
    /// restore. An unavailable staging store degrades to a read-only listing.
    ///
    /// # Errors
    ///
    /// Returns [`RestoreServiceError::ConnectorNotTracked`] for unknown
    /// connectors and propagates repository failures other than staging
    /// unavailability.
    pub async fn restore_candidates(
        &self,
        pipeline_id: PipelineId,
        connector_id: ConnectorId,
    ) -> RestoreServiceResult<RestoreCandidates> {
        let state = self.require_state(connector_id).await?;
        let versions = self
            .versions
            .list_versions(state.registry_name(), Some(self.settings.history_limit))
            .await?;

        let (staged, staging_available) = match self
            .staging
            .find_by_connector(pipeline_id, connector_id)
            .await
        {
            Ok(staged) => (staged, true),
            Err(err) if err.is_unavailable() => {
                warn!(
                    connector = %connector_id,
                    error = %err,
                    "staging unavailable, offering read-only restore history"
                );
                (None, false)
            }
            Err(err) => return Err(RestoreServiceError::Staging(err)),
        };

        Ok(RestoreCandidates {
            state,
            versions,
            staged,
            staging_available,
        })
    }

    async fn activate_with_timeout(
        &self,
        connector_name: &str,
        target: &ConfigVersion,
    ) -> RestoreServiceResult<()> {
        let timeout = self.settings.deployment_timeout;
        let outcome = tokio::time::timeout(timeout, self.target.activate(connector_name, target))
            .await
            .unwrap_or_else(|_| Err(DeploymentTargetError::TimedOut(timeout)));

        outcome.map_err(|source| {
            warn!(
                connector = connector_name,
                version = %target.version(),
                error = %source,
                "deployment target activation failed, staged restore kept"
            );
            RestoreServiceError::DeploymentError {
                connector_name: connector_name.to_owned(),
                source,
            }
        })
    }

    async fn current_config(
        &self,
        state: &ConnectorDeploymentState,
    ) -> RestoreServiceResult<Value> {
        if let Some(deployed) = state.last_deployed_version() {
            let recorded = self
                .versions
                .find_version(state.registry_name(), deployed)
                .await?;
            if let Some(snapshot) = recorded {
                return Ok(snapshot.config().clone());
            }
        }
        Ok(state
            .last_known_config()
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new())))
    }

    async fn require_state(
        &self,
        connector_id: ConnectorId,
    ) -> RestoreServiceResult<ConnectorDeploymentState> {
        self.states
            .find(connector_id)
            .await?
            .ok_or(RestoreServiceError::ConnectorNotTracked(connector_id))
    }

    async fn require_version(
        &self,
        registry_name: &RegistryName,
        version: VersionNumber,
    ) -> RestoreServiceResult<ConfigVersion> {
        self.versions
            .find_version(registry_name, version)
            .await?
            .ok_or_else(|| RestoreServiceError::VersionNotFound {
                registry_name: registry_name.clone(),
                version,
            })
    }
}
