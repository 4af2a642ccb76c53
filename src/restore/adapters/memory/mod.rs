//! In-memory adapters for restore staging and deployment.

mod deployment_target;
mod staging;

pub use deployment_target::InMemoryDeploymentTarget;
pub use staging::InMemoryStagingRepository;
