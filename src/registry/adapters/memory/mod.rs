//! In-memory adapters for configuration history and deployment state.

mod deployment_state;
mod versions;

pub use deployment_state::InMemoryDeploymentStateRepository;
pub use versions::InMemoryConfigVersionRepository;
