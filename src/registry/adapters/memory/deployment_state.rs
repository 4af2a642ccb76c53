//! In-memory repository for connector deployment state.

use crate::registry::{
    domain::{ConnectorDeploymentState, ConnectorId},
    ports::{DeploymentStateError, DeploymentStateRepository, DeploymentStateResult},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory deployment state repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDeploymentStateRepository {
    states: Arc<RwLock<HashMap<ConnectorId, ConnectorDeploymentState>>>,
}

impl InMemoryDeploymentStateRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeploymentStateRepository for InMemoryDeploymentStateRepository {
    async fn upsert(&self, state: &ConnectorDeploymentState) -> DeploymentStateResult<()> {
        let mut states = self.states.write().map_err(|err| {
            DeploymentStateError::persistence(std::io::Error::other(err.to_string()))
        })?;
        states.insert(state.connector_id(), state.clone());
        Ok(())
    }

    async fn find(
        &self,
        connector_id: ConnectorId,
    ) -> DeploymentStateResult<Option<ConnectorDeploymentState>> {
        let states = self.states.read().map_err(|err| {
            DeploymentStateError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(states.get(&connector_id).cloned())
    }
}
