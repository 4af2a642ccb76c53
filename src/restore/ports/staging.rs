//! Repository port for staged restores.

use crate::registry::domain::ConnectorId;
use crate::restore::domain::{PipelineId, StagedRestore, StagedRestoreId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for staging repository operations.
pub type StagingRepositoryResult<T> = Result<T, StagingRepositoryError>;

/// Persistence contract for staged restores.
///
/// Rows are unique by `(pipeline_id, connector_id)`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StagingRepository: Send + Sync {
    /// Atomically inserts the staged restore, replacing any existing row for
    /// the same pipeline and connector. Returns the stored row.
    async fn stage(&self, staged: &StagedRestore) -> StagingRepositoryResult<StagedRestore>;

    /// Lists staged restores for a pipeline, oldest first.
    async fn list_by_pipeline(
        &self,
        pipeline_id: PipelineId,
    ) -> StagingRepositoryResult<Vec<StagedRestore>>;

    /// Finds a staged restore by identifier.
    async fn find_by_id(
        &self,
        id: StagedRestoreId,
    ) -> StagingRepositoryResult<Option<StagedRestore>>;

    /// Finds the staged restore for a pipeline and connector.
    async fn find_by_connector(
        &self,
        pipeline_id: PipelineId,
        connector_id: ConnectorId,
    ) -> StagingRepositoryResult<Option<StagedRestore>>;

    /// Removes a staged restore. Returns `false` when nothing was removed;
    /// removing an unknown identifier is not an error.
    async fn remove(&self, id: StagedRestoreId) -> StagingRepositoryResult<bool>;
}

/// Errors returned by staging repository implementations.
#[derive(Debug, Clone, Error)]
pub enum StagingRepositoryError {
    /// The backing store is not provisioned, migrated, or reachable.
    #[error("staging store unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted staged restore: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl StagingRepositoryError {
    /// Wraps a failure to reach or use the backing store.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }

    /// Wraps persisted-data decoding or validation failures.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Returns `true` for [`StagingRepositoryError::Unavailable`].
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
