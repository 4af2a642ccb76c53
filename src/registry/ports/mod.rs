//! Port contracts for configuration history and deployment state.

mod deployment_state;
mod repository;

pub use deployment_state::{
    DeploymentStateError, DeploymentStateRepository, DeploymentStateResult,
};
pub use repository::{ConfigVersionRepository, VersionRegistryError, VersionRegistryResult};

#[cfg(test)]
pub use deployment_state::MockDeploymentStateRepository;
#[cfg(test)]
pub use repository::MockConfigVersionRepository;
