//! In-memory deployment target with failure injection.

use crate::registry::domain::{ConfigVersion, VersionNumber};
use crate::restore::{
    domain::{ConnectorRuntimeState, RuntimeStatus},
    ports::{DeploymentTarget, DeploymentTargetError, DeploymentTargetResult},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

#[derive(Debug, Default)]
struct TargetState {
    connectors: HashMap<String, RuntimeStatus>,
    activations: Vec<(String, VersionNumber)>,
    failure: Option<DeploymentTargetError>,
    delay: Option<Duration>,
}

/// Deployment target that records activations in memory.
///
/// A configured failure is returned by every activation until cleared; a
/// configured delay is slept before each activation.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDeploymentTarget {
    state: Arc<RwLock<TargetState>>,
}

fn lock_error(err: impl std::fmt::Display) -> DeploymentTargetError {
    DeploymentTargetError::Unexpected(err.to_string())
}

impl InMemoryDeploymentTarget {
    /// Creates a target with no connectors.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent activations fail with `failure`, or succeed again
    /// with `None`.
    ///
    /// # Errors
    ///
    /// Returns [`DeploymentTargetError::Unexpected`] when the state lock is
    /// poisoned.
    pub fn set_failure(
        &self,
        failure: Option<DeploymentTargetError>,
    ) -> DeploymentTargetResult<()> {
        self.state.write().map_err(lock_error)?.failure = failure;
        Ok(())
    }

    /// Delays subsequent activations, or removes the delay with `None`.
    ///
    /// # Errors
    ///
    /// Returns [`DeploymentTargetError::Unexpected`] when the state lock is
    /// poisoned.
    pub fn set_delay(&self, delay: Option<Duration>) -> DeploymentTargetResult<()> {
        self.state.write().map_err(lock_error)?.delay = delay;
        Ok(())
    }

    /// Returns every successful activation in order.
    ///
    /// # Errors
    ///
    /// Returns [`DeploymentTargetError::Unexpected`] when the state lock is
    /// poisoned.
    pub fn activations(&self) -> DeploymentTargetResult<Vec<(String, VersionNumber)>> {
        Ok(self.state.read().map_err(lock_error)?.activations.clone())
    }
}

#[async_trait]
impl DeploymentTarget for InMemoryDeploymentTarget {
    async fn activate(
        &self,
        connector_name: &str,
        version: &ConfigVersion,
    ) -> DeploymentTargetResult<()> {
        let delay = self.state.read().map_err(lock_error)?.delay;
        if let Some(pause) = delay {
            tokio::time::sleep(pause).await;
        }

        let mut state = self.state.write().map_err(lock_error)?;
        if let Some(failure) = state.failure.clone() {
            return Err(failure);
        }

        state.connectors.insert(
            connector_name.to_owned(),
            RuntimeStatus {
                state: ConnectorRuntimeState::Running,
                config: Some(version.config().clone()),
            },
        );
        state
            .activations
            .push((connector_name.to_owned(), version.version()));
        Ok(())
    }

    async fn current_status(&self, connector_name: &str) -> DeploymentTargetResult<RuntimeStatus> {
        let state = self.state.read().map_err(lock_error)?;
        state
            .connectors
            .get(connector_name)
            .cloned()
            .ok_or_else(|| DeploymentTargetError::NotFound(connector_name.to_owned()))
    }
}
