//! Per-connector deployment state and pending-update derivation.

use super::{ConnectorId, RegistryName, VersionNumber};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Returns whether a connector's deployment lags its registry version.
///
/// True iff a registry version exists and either nothing has been deployed
/// yet or the deployed version differs from it.
///
/// # Examples
///
/// ```
/// use connector_versions::registry::domain::{VersionNumber, compute_pending_update};
///
/// let v1 = VersionNumber::new(1).expect("valid");
/// let v2 = VersionNumber::new(2).expect("valid");
/// assert!(compute_pending_update(Some(v1), Some(v2)));
/// assert!(!compute_pending_update(Some(v2), Some(v2)));
/// assert!(compute_pending_update(None, Some(v1)));
/// assert!(!compute_pending_update(Some(v1), None));
/// ```
#[must_use]
pub fn compute_pending_update(
    deployed_version: Option<VersionNumber>,
    registry_version: Option<VersionNumber>,
) -> bool {
    match (deployed_version, registry_version) {
        (_, None) => false,
        (None, Some(_)) => true,
        (Some(deployed), Some(registry)) => deployed != registry,
    }
}

/// Deployment bookkeeping for a single connector.
///
/// `registry_version` is the pinned active version. When unset, the latest
/// registered version is considered active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorDeploymentState {
    connector_id: ConnectorId,
    registry_name: RegistryName,
    last_deployed_version: Option<VersionNumber>,
    registry_version: Option<VersionNumber>,
    last_known_config: Option<Value>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing persisted deployment state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedDeploymentStateData {
    /// Persisted connector identifier.
    pub connector_id: ConnectorId,
    /// Persisted registry name.
    pub registry_name: RegistryName,
    /// Persisted last deployed version.
    pub last_deployed_version: Option<VersionNumber>,
    /// Persisted pinned registry version.
    pub registry_version: Option<VersionNumber>,
    /// Persisted last-known runtime configuration.
    pub last_known_config: Option<Value>,
    /// Persisted update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl ConnectorDeploymentState {
    /// Creates state for a connector that has never been deployed.
    #[must_use]
    pub fn new(connector_id: ConnectorId, registry_name: RegistryName, clock: &impl Clock) -> Self {
        Self {
            connector_id,
            registry_name,
            last_deployed_version: None,
            registry_version: None,
            last_known_config: None,
            updated_at: clock.utc(),
        }
    }

    /// Reconstructs deployment state from persistence.
    #[must_use]
    pub fn from_persisted(data: PersistedDeploymentStateData) -> Self {
        Self {
            connector_id: data.connector_id,
            registry_name: data.registry_name,
            last_deployed_version: data.last_deployed_version,
            registry_version: data.registry_version,
            last_known_config: data.last_known_config,
            updated_at: data.updated_at,
        }
    }

    /// Returns the connector identifier.
    #[must_use]
    pub const fn connector_id(&self) -> ConnectorId {
        self.connector_id
    }

    /// Returns the registry name.
    #[must_use]
    pub const fn registry_name(&self) -> &RegistryName {
        &self.registry_name
    }

    /// Returns the version last applied to the deployment target.
    #[must_use]
    pub const fn last_deployed_version(&self) -> Option<VersionNumber> {
        self.last_deployed_version
    }

    /// Returns the pinned registry version, if any.
    #[must_use]
    pub const fn registry_version(&self) -> Option<VersionNumber> {
        self.registry_version
    }

    /// Returns the last-known runtime configuration.
    #[must_use]
    pub const fn last_known_config(&self) -> Option<&Value> {
        self.last_known_config.as_ref()
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns whether the deployment lags the stored registry version.
    #[must_use]
    pub fn pending_update(&self) -> bool {
        compute_pending_update(self.last_deployed_version, self.registry_version)
    }

    /// Returns whether the deployment lags `effective_version`.
    #[must_use]
    pub fn pending_update_against(&self, effective_version: Option<VersionNumber>) -> bool {
        compute_pending_update(self.last_deployed_version, effective_version)
    }

    /// Records a successful deployment of `version`.
    pub fn record_deployment(&mut self, version: VersionNumber, clock: &impl Clock) {
        self.last_deployed_version = Some(version);
        self.touch(clock);
    }

    /// Pins (or with `None`, unpins) the active registry version.
    pub fn pin_registry_version(&mut self, version: Option<VersionNumber>, clock: &impl Clock) {
        self.registry_version = version;
        self.touch(clock);
    }

    /// Replaces the last-known runtime configuration.
    pub fn record_live_config(&mut self, config: Value, clock: &impl Clock) {
        self.last_known_config = Some(config);
        self.touch(clock);
    }

    /// Points the connector at a different registry name.
    pub fn rename_registry(&mut self, registry_name: RegistryName, clock: &impl Clock) {
        self.registry_name = registry_name;
        self.touch(clock);
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
