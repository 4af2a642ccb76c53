//! Registry orchestration services.

mod drift;
mod versions;

pub use drift::{DriftDetector, DriftReport};
pub use versions::{
    RegistryServiceError, RegistryServiceResult, RegistrySettings, VersionHistoryEntry,
    VersionRegistryService,
};
