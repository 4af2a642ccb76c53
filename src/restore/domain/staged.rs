//! Staged restore aggregate and restore lifecycle state.

use super::{ConnectorType, PipelineId, StagedRestoreId};
use crate::config_diff::{ConfigDiff, DiffSnapshot};
use crate::registry::domain::{
    ConfigChecksum, ConfigVersion, ConnectorId, RegistryName, VersionNumber,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A pending request to roll a connector back to a historical version.
///
/// At most one exists per `(pipeline_id, connector_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedRestore {
    id: StagedRestoreId,
    pipeline_id: PipelineId,
    connector_id: ConnectorId,
    registry_name: RegistryName,
    connector_type: ConnectorType,
    target_version: VersionNumber,
    checksum: ConfigChecksum,
    staged_config: Value,
    diff: DiffSnapshot,
    staged_at: DateTime<Utc>,
}

/// Parameter object for reconstructing persisted staged restores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedStagedRestoreData {
    /// Persisted identifier.
    pub id: StagedRestoreId,
    /// Persisted pipeline identifier.
    pub pipeline_id: PipelineId,
    /// Persisted connector identifier.
    pub connector_id: ConnectorId,
    /// Persisted registry name.
    pub registry_name: RegistryName,
    /// Persisted connector type.
    pub connector_type: ConnectorType,
    /// Persisted target version.
    pub target_version: VersionNumber,
    /// Persisted checksum of the target payload.
    pub checksum: ConfigChecksum,
    /// Persisted target payload.
    pub staged_config: Value,
    /// Persisted flattened diff sides.
    pub diff: DiffSnapshot,
    /// Persisted staging timestamp.
    pub staged_at: DateTime<Utc>,
}

impl StagedRestore {
    /// Stages `target` for a connector whose live configuration is
    /// `current_config`.
    #[must_use]
    pub fn new(
        pipeline_id: PipelineId,
        connector_id: ConnectorId,
        connector_type: ConnectorType,
        target: &ConfigVersion,
        current_config: &Value,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: StagedRestoreId::new(),
            pipeline_id,
            connector_id,
            registry_name: target.registry_name().clone(),
            connector_type,
            target_version: target.version(),
            checksum: target.checksum().clone(),
            staged_config: target.config().clone(),
            diff: DiffSnapshot::capture(current_config, target.config()),
            staged_at: clock.utc(),
        }
    }

    /// Reconstructs a staged restore from persistence.
    #[must_use]
    pub fn from_persisted(data: PersistedStagedRestoreData) -> Self {
        Self {
            id: data.id,
            pipeline_id: data.pipeline_id,
            connector_id: data.connector_id,
            registry_name: data.registry_name,
            connector_type: data.connector_type,
            target_version: data.target_version,
            checksum: data.checksum,
            staged_config: data.staged_config,
            diff: data.diff,
            staged_at: data.staged_at,
        }
    }

    /// Returns the staged restore identifier.
    #[must_use]
    pub const fn id(&self) -> StagedRestoreId {
        self.id
    }

    /// Returns the pipeline identifier.
    #[must_use]
    pub const fn pipeline_id(&self) -> PipelineId {
        self.pipeline_id
    }

    /// Returns the connector identifier.
    #[must_use]
    pub const fn connector_id(&self) -> ConnectorId {
        self.connector_id
    }

    /// Returns the registry name of the target version.
    #[must_use]
    pub const fn registry_name(&self) -> &RegistryName {
        &self.registry_name
    }

    /// Returns the connector type.
    #[must_use]
    pub const fn connector_type(&self) -> ConnectorType {
        self.connector_type
    }

    /// Returns the version to restore.
    #[must_use]
    pub const fn target_version(&self) -> VersionNumber {
        self.target_version
    }

    /// Returns the checksum of the staged payload.
    #[must_use]
    pub const fn checksum(&self) -> &ConfigChecksum {
        &self.checksum
    }

    /// Returns the configuration that will be activated.
    #[must_use]
    pub const fn staged_config(&self) -> &Value {
        &self.staged_config
    }

    /// Returns the flattened sides captured at staging time.
    #[must_use]
    pub const fn diff_snapshot(&self) -> &DiffSnapshot {
        &self.diff
    }

    /// Renders the diff from the live configuration to the staged one.
    #[must_use]
    pub fn diff(&self) -> ConfigDiff {
        self.diff.to_diff()
    }

    /// Returns the staging timestamp.
    #[must_use]
    pub const fn staged_at(&self) -> DateTime<Utc> {
        self.staged_at
    }
}

/// Restore lifecycle of a single connector.
///
/// `NoStaging -> Staged` on stage; `Staged -> NoStaging` on a successful
/// apply or a dismiss. A failed apply stays in `Staged`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreLifecycleState {
    /// No restore is pending.
    NoStaging,
    /// A restore is pending.
    Staged(Box<StagedRestore>),
}

impl RestoreLifecycleState {
    /// Returns `true` when a restore is pending.
    #[must_use]
    pub const fn is_staged(&self) -> bool {
        matches!(self, Self::Staged(_))
    }

    /// Returns the pending restore, if any.
    #[must_use]
    pub fn staged(&self) -> Option<&StagedRestore> {
        match self {
            Self::Staged(staged) => Some(&**staged),
            Self::NoStaging => None,
        }
    }
}

impl From<Option<StagedRestore>> for RestoreLifecycleState {
    fn from(staged: Option<StagedRestore>) -> Self {
        staged.map_or(Self::NoStaging, |restore| Self::Staged(Box::new(restore)))
    }
}
