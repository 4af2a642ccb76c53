//! Domain model for connector configuration history and deployment state.
//!
//! Versions are immutable once assigned; deployment state is the only
//! mutable record and is keyed by connector.

mod checksum;
mod deployment;
mod error;
mod ids;
mod version;

pub use checksum::ConfigChecksum;
pub use deployment::{
    ConnectorDeploymentState, PersistedDeploymentStateData, compute_pending_update,
};
pub use error::RegistryDomainError;
pub use ids::{ConnectorId, RegistryName, VersionNumber};
pub use version::{ConfigVersion, NewConfigVersion, PersistedConfigVersionData};
