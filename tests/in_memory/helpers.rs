//! Shared test helpers for in-memory integration tests.

use connector_versions::registry::{
    adapters::memory::{InMemoryConfigVersionRepository, InMemoryDeploymentStateRepository},
    domain::{ConfigVersion, ConnectorId, RegistryName, VersionNumber},
    services::{DriftDetector, VersionRegistryService},
};
use connector_versions::restore::{
    adapters::memory::{InMemoryDeploymentTarget, InMemoryStagingRepository},
    domain::PipelineId,
    services::RestoreCoordinator,
};
use mockable::DefaultClock;
use rstest::fixture;
use serde_json::Value;
use std::sync::Arc;

/// Boxed error used by fallible test helpers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Registry service wired to in-memory adapters.
pub type TestRegistry = VersionRegistryService<
    InMemoryConfigVersionRepository,
    InMemoryDeploymentStateRepository,
    DefaultClock,
>;

/// Drift detector wired to in-memory adapters.
pub type TestDrift = DriftDetector<
    InMemoryConfigVersionRepository,
    InMemoryDeploymentStateRepository,
    DefaultClock,
>;

/// Restore coordinator wired to in-memory adapters.
pub type TestCoordinator = RestoreCoordinator<
    InMemoryConfigVersionRepository,
    InMemoryDeploymentStateRepository,
    InMemoryStagingRepository,
    InMemoryDeploymentTarget,
    DefaultClock,
>;

/// Services sharing one set of in-memory stores.
pub struct Harness {
    /// Version registry service.
    pub registry: TestRegistry,
    /// Drift detector.
    pub drift: TestDrift,
    /// Restore coordinator.
    pub restores: TestCoordinator,
    /// Staging store, for availability toggling.
    pub staging: Arc<InMemoryStagingRepository>,
    /// Deployment target, for failure injection.
    pub target: Arc<InMemoryDeploymentTarget>,
}

/// Provides services over fresh in-memory stores for each test.
#[fixture]
pub fn harness() -> Harness {
    let versions = Arc::new(InMemoryConfigVersionRepository::new());
    let states = Arc::new(InMemoryDeploymentStateRepository::new());
    let staging = Arc::new(InMemoryStagingRepository::new());
    let target = Arc::new(InMemoryDeploymentTarget::new());
    let clock = Arc::new(DefaultClock);

    Harness {
        registry: VersionRegistryService::new(
            Arc::clone(&versions),
            Arc::clone(&states),
            Arc::clone(&clock),
        ),
        drift: DriftDetector::new(Arc::clone(&versions), Arc::clone(&states), Arc::clone(&clock)),
        restores: RestoreCoordinator::new(
            versions,
            states,
            Arc::clone(&staging),
            Arc::clone(&target),
            clock,
        ),
        staging,
        target,
    }
}

/// Provides a pipeline identifier.
#[fixture]
pub fn pipeline_id() -> PipelineId {
    PipelineId::new()
}

/// Provides a connector identifier.
#[fixture]
pub fn connector_id() -> ConnectorId {
    ConnectorId::new()
}

/// Builds a registry name, failing the test on invalid input.
///
/// # Errors
///
/// Returns an error if the name fails validation.
pub fn registry_name(value: &str) -> Result<RegistryName, BoxError> {
    Ok(RegistryName::new(value)?)
}

/// Builds a version number, failing the test on zero.
///
/// # Errors
///
/// Returns an error if the value is zero.
pub fn version(value: u32) -> Result<VersionNumber, BoxError> {
    Ok(VersionNumber::new(value)?)
}

/// Appends each configuration in order and returns the stored versions.
///
/// # Errors
///
/// Returns an error if any append fails.
pub async fn append_all(
    registry: &TestRegistry,
    name: &RegistryName,
    configs: &[Value],
) -> Result<Vec<ConfigVersion>, BoxError> {
    let mut stored = Vec::with_capacity(configs.len());
    for config in configs {
        stored.push(registry.append(name, config).await?);
    }
    Ok(stored)
}
