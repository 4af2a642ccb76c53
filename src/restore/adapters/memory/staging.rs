//! In-memory repository for staged restores.

use crate::registry::domain::ConnectorId;
use crate::restore::{
    domain::{PipelineId, StagedRestore, StagedRestoreId},
    ports::{StagingRepository, StagingRepositoryError, StagingRepositoryResult},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory staging repository.
///
/// Rows are keyed by `(pipeline_id, connector_id)`, so staging the same
/// connector twice replaces the earlier row. The store can be switched
/// offline to exercise degraded flows.
#[derive(Debug, Clone)]
pub struct InMemoryStagingRepository {
    rows: Arc<RwLock<HashMap<(PipelineId, ConnectorId), StagedRestore>>>,
    available: Arc<AtomicBool>,
}

impl Default for InMemoryStagingRepository {
    fn default() -> Self {
        Self {
            rows: Arc::default(),
            available: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl InMemoryStagingRepository {
    /// Creates an empty, available in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the store as provisioned or not. While unavailable every
    /// operation fails with [`StagingRepositoryError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> StagingRepositoryResult<()> {
        if self.available.load(Ordering::SeqCst) {
            return Ok(());
        }
        Err(StagingRepositoryError::unavailable(std::io::Error::new(
            std::io::ErrorKind::NotConnected,
            "staging store is not provisioned",
        )))
    }
}

fn lock_error(err: impl std::fmt::Display) -> StagingRepositoryError {
    StagingRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl StagingRepository for InMemoryStagingRepository {
    async fn stage(&self, staged: &StagedRestore) -> StagingRepositoryResult<StagedRestore> {
        self.ensure_available()?;
        let mut rows = self.rows.write().map_err(lock_error)?;
        rows.insert((staged.pipeline_id(), staged.connector_id()), staged.clone());
        Ok(staged.clone())
    }

    async fn list_by_pipeline(
        &self,
        pipeline_id: PipelineId,
    ) -> StagingRepositoryResult<Vec<StagedRestore>> {
        self.ensure_available()?;
        let rows = self.rows.read().map_err(lock_error)?;
        let mut matching: Vec<StagedRestore> = rows
            .values()
            .filter(|staged| staged.pipeline_id() == pipeline_id)
            .cloned()
            .collect();
        matching.sort_by_key(|staged| (staged.staged_at(), staged.connector_id()));
        Ok(matching)
    }

    async fn find_by_id(
        &self,
        id: StagedRestoreId,
    ) -> StagingRepositoryResult<Option<StagedRestore>> {
        self.ensure_available()?;
        let rows = self.rows.read().map_err(lock_error)?;
        Ok(rows.values().find(|staged| staged.id() == id).cloned())
    }

    async fn find_by_connector(
        &self,
        pipeline_id: PipelineId,
        connector_id: ConnectorId,
    ) -> StagingRepositoryResult<Option<StagedRestore>> {
        self.ensure_available()?;
        let rows = self.rows.read().map_err(lock_error)?;
        Ok(rows.get(&(pipeline_id, connector_id)).cloned())
    }

    async fn remove(&self, id: StagedRestoreId) -> StagingRepositoryResult<bool> {
        self.ensure_available()?;
        let mut rows = self.rows.write().map_err(lock_error)?;
        let before = rows.len();
        rows.retain(|_, staged| staged.id() != id);
        Ok(rows.len() < before)
    }
}
