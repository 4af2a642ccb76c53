//! Port for the live connector deployment target.

use crate::registry::domain::ConfigVersion;
use crate::restore::domain::RuntimeStatus;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result type for deployment target operations.
pub type DeploymentTargetResult<T> = Result<T, DeploymentTargetError>;

/// Connector-management API that runs connectors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeploymentTarget: Send + Sync {
    /// Reconfigures the named connector to run `version`.
    async fn activate(
        &self,
        connector_name: &str,
        version: &ConfigVersion,
    ) -> DeploymentTargetResult<()>;

    /// Reports the named connector's runtime state.
    async fn current_status(&self, connector_name: &str) -> DeploymentTargetResult<RuntimeStatus>;
}

/// Errors returned by deployment target implementations.
#[derive(Debug, Clone, Error)]
pub enum DeploymentTargetError {
    /// The target does not know the connector.
    #[error("connector not found on deployment target: {0}")]
    NotFound(String),

    /// The target rejected the configuration.
    #[error("deployment target rejected connector '{connector_name}': {message}")]
    Rejected {
        /// Connector being reconfigured.
        connector_name: String,
        /// Reason reported by the target.
        message: String,
    },

    /// The target is busy, for example rebalancing.
    #[error("deployment target conflict for connector '{0}'")]
    Conflict(String),

    /// No response arrived within the activation timeout.
    #[error("deployment target did not respond within {0:?}")]
    TimedOut(Duration),

    /// The target could not be reached.
    #[error("deployment target unreachable: {0}")]
    Unreachable(Arc<dyn std::error::Error + Send + Sync>),

    /// The target returned something this client does not understand.
    #[error("unexpected deployment target response: {0}")]
    Unexpected(String),
}

impl DeploymentTargetError {
    /// Wraps a transport failure.
    pub fn unreachable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unreachable(Arc::new(err))
    }
}
