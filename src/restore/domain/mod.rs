//! Domain model for staging and applying configuration restores.

mod connector_type;
mod error;
mod ids;
mod runtime;
mod staged;

pub use connector_type::ConnectorType;
pub use error::RestoreDomainError;
pub use ids::{PipelineId, StagedRestoreId};
pub use runtime::{ConnectorRuntimeState, RuntimeStatus};
pub use staged::{PersistedStagedRestoreData, RestoreLifecycleState, StagedRestore};
