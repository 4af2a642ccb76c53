//! Repository port for the append-only configuration version history.

use crate::registry::domain::{ConfigVersion, NewConfigVersion, RegistryName, VersionNumber};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for version registry repository operations.
pub type VersionRegistryResult<T> = Result<T, VersionRegistryError>;

/// Persistence contract for configuration versions.
///
/// Implementations must serialise version assignment per registry name so
/// that numbers stay gapless and strictly increasing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfigVersionRepository: Send + Sync {
    /// Creates an empty registry entry.
    ///
    /// Returns `true` when the entry was created and `false` when it already
    /// existed.
    async fn register(&self, registry_name: &RegistryName) -> VersionRegistryResult<bool>;

    /// Returns whether a registry entry exists for the name.
    async fn exists(&self, registry_name: &RegistryName) -> VersionRegistryResult<bool>;

    /// Appends a payload as the next version, creating the registry entry
    /// when absent.
    ///
    /// # Errors
    ///
    /// Returns [`VersionRegistryError::ConcurrentVersionConflict`] when a
    /// concurrent append claimed the same version number.
    async fn append(&self, version: NewConfigVersion) -> VersionRegistryResult<ConfigVersion>;

    /// Finds a single version.
    async fn find_version(
        &self,
        registry_name: &RegistryName,
        version: VersionNumber,
    ) -> VersionRegistryResult<Option<ConfigVersion>>;

    /// Lists versions in descending version order, capped at `limit` when
    /// given.
    async fn list_versions(
        &self,
        registry_name: &RegistryName,
        limit: Option<usize>,
    ) -> VersionRegistryResult<Vec<ConfigVersion>>;

    /// Returns the highest assigned version number.
    async fn latest_version(
        &self,
        registry_name: &RegistryName,
    ) -> VersionRegistryResult<Option<VersionNumber>>;
}

/// Errors returned by version registry repository implementations.
#[derive(Debug, Clone, Error)]
pub enum VersionRegistryError {
    /// Two appends raced for the same version number.
    #[error("concurrent append claimed {registry_name} v{version}")]
    ConcurrentVersionConflict {
        /// Registry being appended to.
        registry_name: RegistryName,
        /// Contended version number.
        version: VersionNumber,
    },

    /// The version counter for the registry cannot advance.
    #[error("version counter exhausted for registry {0}")]
    VersionOverflow(RegistryName),

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted version data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl VersionRegistryError {
    /// Wraps persisted-data decoding or validation failures.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
