//! Service layer for appending, listing, and reading configuration versions.

use crate::config::{AppendPolicy, ConnectorVersionsConfig};
use crate::config_diff::{ConfigDiff, diff_configs};
use crate::registry::{
    domain::{
        ConfigVersion, ConnectorId, NewConfigVersion, RegistryDomainError, RegistryName,
        VersionNumber,
    },
    ports::{
        ConfigVersionRepository, DeploymentStateError, DeploymentStateRepository,
        VersionRegistryError,
    },
};
use mockable::Clock;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Service-level errors for registry and drift operations.
#[derive(Debug, Error)]
pub enum RegistryServiceError {
    /// The registry name has no entry and the append policy requires one.
    #[error("registry name not found: {0}")]
    RegistryNameNotFound(RegistryName),

    /// The requested version is absent from the registry history.
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

    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] RegistryDomainError),

    /// Version repository operation failed.
    #[error(transparent)]
    Repository(#[from] VersionRegistryError),

    /// Deployment state repository operation failed.
    #[error(transparent)]
    DeploymentState(#[from] DeploymentStateError),
}

/// Result type for registry service operations.
pub type RegistryServiceResult<T> = Result<T, RegistryServiceError>;

/// Tunables for [`VersionRegistryService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrySettings {
    history_limit: usize,
    max_append_attempts: u32,
    append_policy: AppendPolicy,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self::from_config(&ConnectorVersionsConfig::default())
    }
}

impl RegistrySettings {
    /// Extracts registry settings from the crate configuration.
    #[must_use]
    pub const fn from_config(config: &ConnectorVersionsConfig) -> Self {
        Self {
            history_limit: config.history_limit,
            max_append_attempts: config.max_append_attempts,
            append_policy: config.append_policy,
        }
    }

    /// Sets the default listing cap.
    #[must_use]
    pub const fn with_history_limit(mut self, history_limit: usize) -> Self {
        self.history_limit = history_limit;
        self
    }

    /// Sets the number of attempts made for a contended append.
    #[must_use]
    pub const fn with_max_append_attempts(mut self, max_append_attempts: u32) -> Self {
        self.max_append_attempts = max_append_attempts;
        self
    }

    /// Sets the behaviour for appends to unregistered names.
    #[must_use]
    pub const fn with_append_policy(mut self, append_policy: AppendPolicy) -> Self {
        self.append_policy = append_policy;
        self
    }

    /// Returns the default listing cap.
    #[must_use]
    pub const fn history_limit(&self) -> usize {
        self.history_limit
    }

    /// Returns the number of attempts made for a contended append.
    #[must_use]
    pub const fn max_append_attempts(&self) -> u32 {
        self.max_append_attempts
    }

    /// Returns the append policy.
    #[must_use]
    pub const fn append_policy(&self) -> AppendPolicy {
        self.append_policy
    }
}

/// One row of a version history view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionHistoryEntry {
    /// The stored version.
    pub version: ConfigVersion,
    /// Changes introduced by this version relative to its predecessor.
    pub diff: ConfigDiff,
}

/// Orchestrates the append-only configuration history.
#[derive(Clone)]
pub struct VersionRegistryService<R, D, C>
where
    R: ConfigVersionRepository,
    D: DeploymentStateRepository,
    C: Clock + Send + Sync,
{
    versions: Arc<R>,
    states: Arc<D>,
    clock: Arc<C>,
    settings: RegistrySettings,
}

impl<R, D, C> VersionRegistryService<R, D, C>
where
    R: ConfigVersionRepository,
    D: DeploymentStateRepository,
    C: Clock + Send + Sync,
{
    /// Creates a registry service with default settings.
    #[must_use]
    pub fn new(versions: Arc<R>, states: Arc<D>, clock: Arc<C>) -> Self {
        Self {
            versions,
            states,
            clock,
            settings: RegistrySettings::default(),
        }
    }

    /// Replaces the service settings.
    #[must_use]
    pub const fn with_settings(mut self, settings: RegistrySettings) -> Self {
        self.settings = settings;
        self
    }

    /// Returns the active settings.
    #[must_use]
    pub const fn settings(&self) -> RegistrySettings {
        self.settings
    }

    /// Creates an empty registry entry. Returns `false` when it already
    /// existed.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::Repository`] when persistence fails.
    pub async fn register(&self, registry_name: &RegistryName) -> RegistryServiceResult<bool> {
        let created = self.versions.register(registry_name).await?;
        if created {
            info!(registry = %registry_name, "registered connector configuration registry");
        }
        Ok(created)
    }

    /// Appends `config` as the next version for `registry_name`.
    ///
    /// Contended appends are retried with a freshly assigned number up to
    /// the configured attempt count.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::RegistryNameNotFound`] under
    /// [`AppendPolicy::RequireExisting`] when the name is unregistered, and
    /// [`RegistryServiceError::Repository`] when persistence fails or the
    /// attempts are exhausted.
    pub async fn append(
        &self,
        registry_name: &RegistryName,
        config: &Value,
    ) -> RegistryServiceResult<ConfigVersion> {
        if self.settings.append_policy == AppendPolicy::RequireExisting
            && !self.versions.exists(registry_name).await?
        {
            return Err(RegistryServiceError::RegistryNameNotFound(
                registry_name.clone(),
            ));
        }

        let mut attempt: u32 = 1;
        loop {
            let candidate =
                NewConfigVersion::new(registry_name.clone(), config.clone(), &*self.clock);
            match self.versions.append(candidate).await {
                Ok(stored) => {
                    info!(
                        registry = %registry_name,
                        version = %stored.version(),
                        checksum = %stored.checksum(),
                        "appended configuration version"
                    );
                    return Ok(stored);
                }
                Err(VersionRegistryError::ConcurrentVersionConflict { version, .. })
                    if attempt < self.settings.max_append_attempts =>
                {
                    warn!(
                        registry = %registry_name,
                        version = %version,
                        attempt,
                        "version number contended, retrying append"
                    );
                    attempt = attempt.saturating_add(1);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Lists versions in descending order, capped at `limit` or the
    /// configured history limit.
    ///
    /// Unknown registry names yield an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::Repository`] when persistence fails.
    pub async fn list_versions(
        &self,
        registry_name: &RegistryName,
        limit: Option<usize>,
    ) -> RegistryServiceResult<Vec<ConfigVersion>> {
        let cap = limit.unwrap_or(self.settings.history_limit);
        Ok(self.versions.list_versions(registry_name, Some(cap)).await?)
    }

    /// Returns the configuration payload stored for a version.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::VersionNotFound`] when absent.
    pub async fn get_version(
        &self,
        registry_name: &RegistryName,
        version: VersionNumber,
    ) -> RegistryServiceResult<Value> {
        let record = self.get_config_version(registry_name, version).await?;
        Ok(record.config().clone())
    }

    /// Returns the full record for a version after verifying its checksum.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::VersionNotFound`] when absent and
    /// [`RegistryServiceError::Domain`] on a checksum mismatch.
    pub async fn get_config_version(
        &self,
        registry_name: &RegistryName,
        version: VersionNumber,
    ) -> RegistryServiceResult<ConfigVersion> {
        let record = self.require_version(registry_name, version).await?;
        record.verify_checksum()?;
        Ok(record)
    }

    /// Recomputes and compares the stored checksum of a version.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError::ChecksumMismatch`] (wrapped in
    /// [`RegistryServiceError::Domain`]) when the payload no longer matches
    /// and [`RegistryServiceError::VersionNotFound`] when absent.
    pub async fn verify_checksum(
        &self,
        registry_name: &RegistryName,
        version: VersionNumber,
    ) -> RegistryServiceResult<()> {
        let record = self.require_version(registry_name, version).await?;
        if let Err(err) = record.verify_checksum() {
            warn!(registry = %registry_name, version = %version, "stored checksum mismatch");
            return Err(err.into());
        }
        Ok(())
    }

    /// Returns the version currently considered live for a connector: its
    /// pinned registry version, else the registry's latest.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::ConnectorNotTracked`] when the
    /// connector has no deployment state.
    pub async fn get_active_version(
        &self,
        connector_id: ConnectorId,
    ) -> RegistryServiceResult<Option<VersionNumber>> {
        let state = self
            .states
            .find(connector_id)
            .await?
            .ok_or(RegistryServiceError::ConnectorNotTracked(connector_id))?;

        if let Some(pinned) = state.registry_version() {
            return Ok(Some(pinned));
        }
        Ok(self.versions.latest_version(state.registry_name()).await?)
    }

    /// Lists versions in descending order, each paired with its diff
    /// against the preceding version. Version 1 diffs against an empty
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::Repository`] when persistence fails.
    pub async fn version_history(
        &self,
        registry_name: &RegistryName,
        limit: Option<usize>,
    ) -> RegistryServiceResult<Vec<VersionHistoryEntry>> {
        let cap = limit.unwrap_or(self.settings.history_limit);
        let mut versions = self
            .versions
            .list_versions(registry_name, Some(cap.saturating_add(1)))
            .await?;

        let empty = Value::Object(Map::new());
        let predecessors: Vec<Value> = versions
            .iter()
            .skip(1)
            .map(|older| older.config().clone())
            .collect();
        versions.truncate(cap);

        let history: Vec<VersionHistoryEntry> = versions
            .into_iter()
            .enumerate()
            .map(|(index, version)| {
                let previous = predecessors.get(index).unwrap_or(&empty);
                let diff = diff_configs(previous, version.config());
                VersionHistoryEntry { version, diff }
            })
            .collect();

        debug!(registry = %registry_name, entries = history.len(), "built version history");
        Ok(history)
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
