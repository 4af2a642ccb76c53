//! Connection pool construction from [`ConnectorVersionsConfig`].

use super::repository::RegistryPgPool;
use crate::config::ConnectorVersionsConfig;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use thiserror::Error;

/// Errors returned while building a pool from configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PoolSetupError {
    /// Neither the configuration file nor the environment names a database.
    #[error("no database URL configured; set `database_url` or CONNECTOR_VERSIONS_DATABASE_URL")]
    MissingDatabaseUrl,
}

/// Builds the pool shared by the registry and staging repositories.
///
/// Connections are opened on demand, so an unreachable server surfaces as a
/// persistence error on first use rather than here.
///
/// # Errors
///
/// Returns [`PoolSetupError::MissingDatabaseUrl`] when
/// [`ConnectorVersionsConfig::database_url`] is unset.
pub fn pool_from_config(
    config: &ConnectorVersionsConfig,
) -> Result<RegistryPgPool, PoolSetupError> {
    let url = config
        .database_url
        .as_deref()
        .ok_or(PoolSetupError::MissingDatabaseUrl)?;
    Ok(Pool::builder()
        .min_idle(Some(0))
        .build_unchecked(ConnectionManager::<PgConnection>::new(url)))
}
