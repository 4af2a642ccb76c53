//! Diesel row models for configuration history and deployment state.

use super::schema::{connector_config_versions, connector_deployment_states, connector_registries};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Insert model for registry entries.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = connector_registries)]
pub struct NewRegistryRow {
    /// Registry name.
    pub name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Query result row for configuration versions.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = connector_config_versions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ConfigVersionRow {
    /// Owning registry name.
    pub registry_name: String,
    /// Version number.
    pub version: i32,
    /// Configuration payload.
    pub config: Value,
    /// Payload checksum.
    pub checksum: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Row model for deployment state, used for both reads and upserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = connector_deployment_states)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct DeploymentStateRow {
    /// Connector identifier.
    pub connector_id: uuid::Uuid,
    /// Registry name.
    pub registry_name: String,
    /// Last deployed version.
    pub last_deployed_version: Option<i32>,
    /// Pinned registry version.
    pub registry_version: Option<i32>,
    /// Last-known runtime configuration.
    pub last_known_config: Option<Value>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
