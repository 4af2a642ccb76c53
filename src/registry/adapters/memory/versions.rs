//! In-memory repository for configuration versions.

use crate::registry::{
    domain::{ConfigVersion, NewConfigVersion, RegistryName, VersionNumber},
    ports::{ConfigVersionRepository, VersionRegistryError, VersionRegistryResult},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory configuration version repository.
///
/// Version assignment happens under the write lock, so concurrent appends
/// never collide.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConfigVersionRepository {
    state: Arc<RwLock<HashMap<RegistryName, Vec<ConfigVersion>>>>,
}

impl InMemoryConfigVersionRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl std::fmt::Display) -> VersionRegistryError {
    VersionRegistryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl ConfigVersionRepository for InMemoryConfigVersionRepository {
    async fn register(&self, registry_name: &RegistryName) -> VersionRegistryResult<bool> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.contains_key(registry_name) {
            return Ok(false);
        }
        state.insert(registry_name.clone(), Vec::new());
        Ok(true)
    }

    async fn exists(&self, registry_name: &RegistryName) -> VersionRegistryResult<bool> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.contains_key(registry_name))
    }

    async fn append(&self, version: NewConfigVersion) -> VersionRegistryResult<ConfigVersion> {
        let mut state = self.state.write().map_err(lock_error)?;
        let history = state.entry(version.registry_name().clone()).or_default();

        let next = match history.last() {
            Some(latest) => latest.version().next().ok_or_else(|| {
                VersionRegistryError::VersionOverflow(latest.registry_name().clone())
            })?,
            None => VersionNumber::FIRST,
        };

        let stored = version.into_version(next);
        history.push(stored.clone());
        Ok(stored)
    }

    async fn find_version(
        &self,
        registry_name: &RegistryName,
        version: VersionNumber,
    ) -> VersionRegistryResult<Option<ConfigVersion>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.get(registry_name).and_then(|history| {
            history
                .iter()
                .find(|stored| stored.version() == version)
                .cloned()
        }))
    }

    async fn list_versions(
        &self,
        registry_name: &RegistryName,
        limit: Option<usize>,
    ) -> VersionRegistryResult<Vec<ConfigVersion>> {
        let state = self.state.read().map_err(lock_error)?;
        let Some(history) = state.get(registry_name) else {
            return Ok(Vec::new());
        };

        Ok(history
            .iter()
            .rev()
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn latest_version(
        &self,
        registry_name: &RegistryName,
    ) -> VersionRegistryResult<Option<VersionNumber>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .get(registry_name)
            .and_then(|history| history.last())
            .map(ConfigVersion::version))
    }
}
