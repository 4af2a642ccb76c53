//! Diesel row model for staged restores.

use super::schema::staged_restores;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

/// Row model for staged restores, used for reads and upserts.
///
/// The changeset skips the `(pipeline_id, connector_id)` conflict key, so a
/// re-stage replaces every other column including `id`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = staged_restores)]
#[diesel(primary_key(pipeline_id, connector_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StagedRestoreRow {
    /// Staged restore identifier.
    pub id: Uuid,
    /// Owning pipeline.
    pub pipeline_id: Uuid,
    /// Connector being restored.
    pub connector_id: Uuid,
    /// Registry name of the target version.
    pub registry_name: String,
    /// Connector type.
    pub connector_type: String,
    /// Version to restore.
    pub target_version: i32,
    /// Checksum of the target payload.
    pub checksum: String,
    /// Target payload.
    pub staged_config: Value,
    /// Serialized diff snapshot.
    pub diff: Value,
    /// Staging timestamp.
    pub staged_at: DateTime<Utc>,
}
