//! Port contracts for restore staging and deployment.

mod deployment_target;
mod staging;

pub use deployment_target::{DeploymentTarget, DeploymentTargetError, DeploymentTargetResult};
pub use staging::{StagingRepository, StagingRepositoryError, StagingRepositoryResult};

#[cfg(test)]
pub use deployment_target::MockDeploymentTarget;
#[cfg(test)]
pub use staging::MockStagingRepository;
