//! `PostgreSQL` repository for staged restores.

use super::{models::StagedRestoreRow, schema::staged_restores};
use crate::registry::domain::{ConfigChecksum, ConnectorId, RegistryName, VersionNumber};
use crate::restore::{
    domain::{
        ConnectorType, PersistedStagedRestoreData, PipelineId, StagedRestore, StagedRestoreId,
    },
    ports::{StagingRepository, StagingRepositoryError, StagingRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by the staging adapter.
pub type StagingPgPool = Pool<ConnectionManager<PgConnection>>;

impl From<DieselError> for StagingRepositoryError {
    fn from(err: DieselError) -> Self {
        if is_unprovisioned(&err) {
            Self::unavailable(err)
        } else {
            Self::persistence(err)
        }
    }
}

fn is_unprovisioned(err: &DieselError) -> bool {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => true,
        DieselError::DatabaseError(_, info) => info.message().contains("does not exist"),
        _ => false,
    }
}

/// `PostgreSQL`-backed staging repository.
///
/// Staging is a single `INSERT ... ON CONFLICT (pipeline_id, connector_id)
/// DO UPDATE`. An unreachable pool or missing table reports
/// [`StagingRepositoryError::Unavailable`].
#[derive(Debug, Clone)]
pub struct PostgresStagingRepository {
    pool: StagingPgPool,
}

impl PostgresStagingRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: StagingPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, operation: F) -> StagingRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> StagingRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(StagingRepositoryError::unavailable)?;
            operation(&mut connection)
        })
        .await
        .map_err(StagingRepositoryError::persistence)?
    }
}

#[async_trait]
impl StagingRepository for PostgresStagingRepository {
    async fn stage(&self, staged: &StagedRestore) -> StagingRepositoryResult<StagedRestore> {
        let row = staged_to_row(staged)?;
        self.run_blocking(move |connection| {
            let stored = diesel::insert_into(staged_restores::table)
                .values(&row)
                .on_conflict((staged_restores::pipeline_id, staged_restores::connector_id))
                .do_update()
                .set(&row)
                .returning(StagedRestoreRow::as_returning())
                .get_result::<StagedRestoreRow>(connection)?;
            row_to_staged(stored)
        })
        .await
    }

    async fn list_by_pipeline(
        &self,
        pipeline_id: PipelineId,
    ) -> StagingRepositoryResult<Vec<StagedRestore>> {
        self.run_blocking(move |connection| {
            let rows = staged_restores::table
                .filter(staged_restores::pipeline_id.eq(pipeline_id.into_inner()))
                .order((staged_restores::staged_at.asc(), staged_restores::connector_id.asc()))
                .select(StagedRestoreRow::as_select())
                .load::<StagedRestoreRow>(connection)?;
            rows.into_iter().map(row_to_staged).collect()
        })
        .await
    }

    async fn find_by_id(
        &self,
        id: StagedRestoreId,
    ) -> StagingRepositoryResult<Option<StagedRestore>> {
        self.run_blocking(move |connection| {
            let row = staged_restores::table
                .filter(staged_restores::id.eq(id.into_inner()))
                .select(StagedRestoreRow::as_select())
                .first::<StagedRestoreRow>(connection)
                .optional()?;
            row.map(row_to_staged).transpose()
        })
        .await
    }

    async fn find_by_connector(
        &self,
        pipeline_id: PipelineId,
        connector_id: ConnectorId,
    ) -> StagingRepositoryResult<Option<StagedRestore>> {
        self.run_blocking(move |connection| {
            let row = staged_restores::table
                .filter(staged_restores::pipeline_id.eq(pipeline_id.into_inner()))
                .filter(staged_restores::connector_id.eq(connector_id.into_inner()))
                .select(StagedRestoreRow::as_select())
                .first::<StagedRestoreRow>(connection)
                .optional()?;
            row.map(row_to_staged).transpose()
        })
        .await
    }

    async fn remove(&self, id: StagedRestoreId) -> StagingRepositoryResult<bool> {
        self.run_blocking(move |connection| {
            let target = staged_restores::table.filter(staged_restores::id.eq(id.into_inner()));
            let deleted = diesel::delete(target).execute(connection)?;
            Ok(deleted > 0)
        })
        .await
    }
}

fn staged_to_row(staged: &StagedRestore) -> StagingRepositoryResult<StagedRestoreRow> {
    Ok(StagedRestoreRow {
        id: staged.id().into_inner(),
        pipeline_id: staged.pipeline_id().into_inner(),
        connector_id: staged.connector_id().into_inner(),
        registry_name: staged.registry_name().as_str().to_owned(),
        connector_type: staged.connector_type().as_str().to_owned(),
        target_version: i32::try_from(staged.target_version().value())
            .map_err(StagingRepositoryError::persistence)?,
        checksum: staged.checksum().as_str().to_owned(),
        staged_config: staged.staged_config().clone(),
        diff: serde_json::to_value(staged.diff_snapshot())
            .map_err(StagingRepositoryError::persistence)?,
        staged_at: staged.staged_at(),
    })
}

fn row_to_staged(row: StagedRestoreRow) -> StagingRepositoryResult<StagedRestore> {
    let StagedRestoreRow {
        id,
        pipeline_id,
        connector_id,
        registry_name,
        connector_type,
        target_version,
        checksum,
        staged_config,
        diff,
        staged_at,
    } = row;

    let data = PersistedStagedRestoreData {
        id: StagedRestoreId::from_uuid(id),
        pipeline_id: PipelineId::from_uuid(pipeline_id),
        connector_id: ConnectorId::from_uuid(connector_id),
        registry_name: RegistryName::new(registry_name)
            .map_err(StagingRepositoryError::invalid_persisted_data)?,
        connector_type: ConnectorType::try_from(connector_type.as_str())
            .map_err(StagingRepositoryError::invalid_persisted_data)?,
        target_version: VersionNumber::try_from(target_version)
            .map_err(StagingRepositoryError::invalid_persisted_data)?,
        checksum: ConfigChecksum::parse(checksum)
            .map_err(StagingRepositoryError::invalid_persisted_data)?,
        staged_config,
        diff: serde_json::from_value(diff)
            .map_err(StagingRepositoryError::invalid_persisted_data)?,
        staged_at,
    };
    Ok(StagedRestore::from_persisted(data))
}
