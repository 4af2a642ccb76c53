//! Restore orchestration services.

mod coordinator;

pub use coordinator::{
    RestoreCandidates, RestoreCoordinator, RestoreServiceError, RestoreServiceResult,
    RestoreSettings, StageRestoreRequest,
};
