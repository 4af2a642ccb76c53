//! Immutable configuration version records.

use super::{ConfigChecksum, RegistryDomainError, RegistryName, VersionNumber};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A configuration payload awaiting version assignment.
///
/// The store assigns the version number atomically when appending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewConfigVersion {
    registry_name: RegistryName,
    config: Value,
    checksum: ConfigChecksum,
    created_at: DateTime<Utc>,
}

impl NewConfigVersion {
    /// Prepares a payload for appending, computing its checksum.
    #[must_use]
    pub fn new(registry_name: RegistryName, config: Value, clock: &impl Clock) -> Self {
        let checksum = ConfigChecksum::compute(&config);
        Self {
            registry_name,
            config,
            checksum,
            created_at: clock.utc(),
        }
    }

    /// Returns the target registry name.
    #[must_use]
    pub const fn registry_name(&self) -> &RegistryName {
        &self.registry_name
    }

    /// Returns the configuration payload.
    #[must_use]
    pub const fn config(&self) -> &Value {
        &self.config
    }

    /// Returns the payload checksum.
    #[must_use]
    pub const fn checksum(&self) -> &ConfigChecksum {
        &self.checksum
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Finalizes the record with the version number assigned by the store.
    #[must_use]
    pub fn into_version(self, version: VersionNumber) -> ConfigVersion {
        ConfigVersion {
            registry_name: self.registry_name,
            version,
            config: self.config,
            checksum: self.checksum,
            created_at: self.created_at,
        }
    }
}

/// Immutable snapshot of a connector configuration at a registry version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigVersion {
    registry_name: RegistryName,
    version: VersionNumber,
    config: Value,
    checksum: ConfigChecksum,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing persisted versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedConfigVersionData {
    /// Persisted registry name.
    pub registry_name: RegistryName,
    /// Persisted version number.
    pub version: VersionNumber,
    /// Persisted configuration payload.
    pub config: Value,
    /// Persisted checksum.
    pub checksum: ConfigChecksum,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl ConfigVersion {
    /// Reconstructs a version from persistence.
    #[must_use]
    pub fn from_persisted(data: PersistedConfigVersionData) -> Self {
        Self {
            registry_name: data.registry_name,
            version: data.version,
            config: data.config,
            checksum: data.checksum,
            created_at: data.created_at,
        }
    }

    /// Returns the registry name.
    #[must_use]
    pub const fn registry_name(&self) -> &RegistryName {
        &self.registry_name
    }

    /// Returns the version number.
    #[must_use]
    pub const fn version(&self) -> VersionNumber {
        self.version
    }

    /// Returns the configuration payload.
    #[must_use]
    pub const fn config(&self) -> &Value {
        &self.config
    }

    /// Returns the recorded checksum.
    #[must_use]
    pub const fn checksum(&self) -> &ConfigChecksum {
        &self.checksum
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Recomputes the payload checksum and compares it with the record.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError::ChecksumMismatch`] when the payload no
    /// longer hashes to the recorded checksum.
    pub fn verify_checksum(&self) -> Result<(), RegistryDomainError> {
        let computed = ConfigChecksum::compute(&self.config);
        if computed == self.checksum {
            return Ok(());
        }

        Err(RegistryDomainError::ChecksumMismatch {
            registry_name: self.registry_name.clone(),
            version: self.version,
            recorded: self.checksum.clone(),
            computed,
        })
    }
}
