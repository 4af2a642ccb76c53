//! Repository port for per-connector deployment state.

use crate::registry::domain::{ConnectorDeploymentState, ConnectorId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for deployment state repository operations.
pub type DeploymentStateResult<T> = Result<T, DeploymentStateError>;

/// Persistence contract for connector deployment state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeploymentStateRepository: Send + Sync {
    /// Inserts or replaces the state for its connector.
    async fn upsert(&self, state: &ConnectorDeploymentState) -> DeploymentStateResult<()>;

    /// Finds the state for a connector.
    async fn find(
        &self,
        connector_id: ConnectorId,
    ) -> DeploymentStateResult<Option<ConnectorDeploymentState>>;
}

/// Errors returned by deployment state repository implementations.
#[derive(Debug, Clone, Error)]
pub enum DeploymentStateError {
    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted deployment state: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl DeploymentStateError {
    /// Wraps persisted-data decoding or validation failures.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
