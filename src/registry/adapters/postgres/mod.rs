//! `PostgreSQL` adapters for configuration history and deployment state.

mod models;
mod pool;
mod repository;
mod schema;

pub use pool::{PoolSetupError, pool_from_config};
pub use repository::{
    PostgresConfigVersionRepository, PostgresDeploymentStateRepository, RegistryPgPool,
};
