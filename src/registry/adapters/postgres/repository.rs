//! `PostgreSQL` repositories for configuration history and deployment state.

use super::{
    models::{ConfigVersionRow, DeploymentStateRow, NewRegistryRow},
    schema::{connector_config_versions, connector_deployment_states, connector_registries},
};
use crate::registry::{
    domain::{
        ConfigChecksum, ConfigVersion, ConnectorDeploymentState, ConnectorId, NewConfigVersion,
        PersistedConfigVersionData, PersistedDeploymentStateData, RegistryName, VersionNumber,
    },
    ports::{
        ConfigVersionRepository, DeploymentStateError, DeploymentStateRepository,
        DeploymentStateResult, VersionRegistryError, VersionRegistryResult,
    },
};
use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by registry adapters.
pub type RegistryPgPool = Pool<ConnectionManager<PgConnection>>;

impl From<DieselError> for VersionRegistryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

/// `PostgreSQL`-backed configuration version repository.
///
/// Appends lock the registry row (`SELECT ... FOR UPDATE`) before reading the
/// current maximum, and the `(registry_name, version)` primary key rejects
/// any duplicate that slips past the lock.
#[derive(Debug, Clone)]
pub struct PostgresConfigVersionRepository {
    pool: RegistryPgPool,
}

impl PostgresConfigVersionRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: RegistryPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, operation: F) -> VersionRegistryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> VersionRegistryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(VersionRegistryError::persistence)?;
            operation(&mut connection)
        })
        .await
        .map_err(VersionRegistryError::persistence)?
    }
}

#[async_trait]
impl ConfigVersionRepository for PostgresConfigVersionRepository {
    async fn register(&self, registry_name: &RegistryName) -> VersionRegistryResult<bool> {
        let row = NewRegistryRow {
            name: registry_name.as_str().to_owned(),
            created_at: Utc::now(),
        };
        self.run_blocking(move |connection| {
            let inserted = insert_registry_row(connection, &row)?;
            Ok(inserted > 0)
        })
        .await
    }

    async fn exists(&self, registry_name: &RegistryName) -> VersionRegistryResult<bool> {
        let name = registry_name.as_str().to_owned();
        self.run_blocking(move |connection| {
            let count: i64 = connector_registries::table
                .filter(connector_registries::name.eq(&name))
                .count()
                .get_result(connection)?;
            Ok(count > 0)
        })
        .await
    }

    async fn append(&self, version: NewConfigVersion) -> VersionRegistryResult<ConfigVersion> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, VersionRegistryError, _>(|tx_conn| {
                let registry_name = version.registry_name().clone();
                let name = registry_name.as_str().to_owned();
                insert_registry_row(
                    tx_conn,
                    &NewRegistryRow {
                        name: name.clone(),
                        created_at: version.created_at(),
                    },
                )?;

                connector_registries::table
                    .filter(connector_registries::name.eq(&name))
                    .select(connector_registries::name)
                    .for_update()
                    .first::<String>(tx_conn)?;

                let next = next_version_number(tx_conn, &registry_name)?;
                let row = ConfigVersionRow {
                    registry_name: name,
                    version: version_to_db(&registry_name, next)?,
                    config: version.config().clone(),
                    checksum: version.checksum().as_str().to_owned(),
                    created_at: version.created_at(),
                };

                diesel::insert_into(connector_config_versions::table)
                    .values(&row)
                    .execute(tx_conn)
                    .map_err(|err| match err {
                        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                            VersionRegistryError::ConcurrentVersionConflict {
                                registry_name: registry_name.clone(),
                                version: next,
                            }
                        }
                        _ => VersionRegistryError::persistence(err),
                    })?;

                Ok(version.into_version(next))
            })
        })
        .await
    }

    async fn find_version(
        &self,
        registry_name: &RegistryName,
        version: VersionNumber,
    ) -> VersionRegistryResult<Option<ConfigVersion>> {
        let name = registry_name.as_str().to_owned();
        let Ok(db_version) = i32::try_from(version.value()) else {
            return Ok(None);
        };

        self.run_blocking(move |connection| {
            let row = connector_config_versions::table
                .filter(connector_config_versions::registry_name.eq(&name))
                .filter(connector_config_versions::version.eq(db_version))
                .select(ConfigVersionRow::as_select())
                .first::<ConfigVersionRow>(connection)
                .optional()?;
            row.map(row_to_version).transpose()
        })
        .await
    }

    async fn list_versions(
        &self,
        registry_name: &RegistryName,
        limit: Option<usize>,
    ) -> VersionRegistryResult<Vec<ConfigVersion>> {
        let name = registry_name.as_str().to_owned();
        self.run_blocking(move |connection| {
            let mut query = connector_config_versions::table
                .filter(connector_config_versions::registry_name.eq(&name))
                .order(connector_config_versions::version.desc())
                .select(ConfigVersionRow::as_select())
                .into_boxed();
            if let Some(cap) = limit {
                query = query.limit(i64::try_from(cap).unwrap_or(i64::MAX));
            }

            let rows = query.load::<ConfigVersionRow>(connection)?;
            rows.into_iter().map(row_to_version).collect()
        })
        .await
    }

    async fn latest_version(
        &self,
        registry_name: &RegistryName,
    ) -> VersionRegistryResult<Option<VersionNumber>> {
        let registry = registry_name.clone();
        self.run_blocking(move |connection| latest_version_number(connection, &registry))
            .await
    }
}

fn insert_registry_row(
    connection: &mut PgConnection,
    row: &NewRegistryRow,
) -> VersionRegistryResult<usize> {
    Ok(diesel::insert_into(connector_registries::table)
        .values(row)
        .on_conflict(connector_registries::name)
        .do_nothing()
        .execute(connection)?)
}

fn latest_version_number(
    connection: &mut PgConnection,
    registry_name: &RegistryName,
) -> VersionRegistryResult<Option<VersionNumber>> {
    let max_version: Option<i32> = connector_config_versions::table
        .filter(connector_config_versions::registry_name.eq(registry_name.as_str()))
        .select(diesel::dsl::max(connector_config_versions::version))
        .first(connection)?;

    max_version
        .map(|raw| {
            VersionNumber::try_from(raw).map_err(VersionRegistryError::invalid_persisted_data)
        })
        .transpose()
}

fn next_version_number(
    connection: &mut PgConnection,
    registry_name: &RegistryName,
) -> VersionRegistryResult<VersionNumber> {
    match latest_version_number(connection, registry_name)? {
        Some(latest) => latest
            .next()
            .ok_or_else(|| VersionRegistryError::VersionOverflow(registry_name.clone())),
        None => Ok(VersionNumber::FIRST),
    }
}

fn version_to_db(
    registry_name: &RegistryName,
    version: VersionNumber,
) -> VersionRegistryResult<i32> {
    i32::try_from(version.value())
        .map_err(|_| VersionRegistryError::VersionOverflow(registry_name.clone()))
}

fn row_to_version(row: ConfigVersionRow) -> VersionRegistryResult<ConfigVersion> {
    let ConfigVersionRow {
        registry_name,
        version,
        config,
        checksum,
        created_at,
    } = row;

    let data = PersistedConfigVersionData {
        registry_name: RegistryName::new(registry_name)
            .map_err(VersionRegistryError::invalid_persisted_data)?,
        version: VersionNumber::try_from(version)
            .map_err(VersionRegistryError::invalid_persisted_data)?,
        config,
        checksum: ConfigChecksum::parse(checksum)
            .map_err(VersionRegistryError::invalid_persisted_data)?,
        created_at,
    };
    Ok(ConfigVersion::from_persisted(data))
}

/// `PostgreSQL`-backed connector deployment state repository.
#[derive(Debug, Clone)]
pub struct PostgresDeploymentStateRepository {
    pool: RegistryPgPool,
}

impl PostgresDeploymentStateRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: RegistryPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, operation: F) -> DeploymentStateResult<T>
    where
        F: FnOnce(&mut PgConnection) -> DeploymentStateResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(DeploymentStateError::persistence)?;
            operation(&mut connection)
        })
        .await
        .map_err(DeploymentStateError::persistence)?
    }
}

#[async_trait]
impl DeploymentStateRepository for PostgresDeploymentStateRepository {
    async fn upsert(&self, state: &ConnectorDeploymentState) -> DeploymentStateResult<()> {
        let row = state_to_row(state)?;
        self.run_blocking(move |connection| {
            diesel::insert_into(connector_deployment_states::table)
                .values(&row)
                .on_conflict(connector_deployment_states::connector_id)
                .do_update()
                .set(&row)
                .execute(connection)
                .map_err(DeploymentStateError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn find(
        &self,
        connector_id: ConnectorId,
    ) -> DeploymentStateResult<Option<ConnectorDeploymentState>> {
        self.run_blocking(move |connection| {
            let row = connector_deployment_states::table
                .filter(connector_deployment_states::connector_id.eq(connector_id.into_inner()))
                .select(DeploymentStateRow::as_select())
                .first::<DeploymentStateRow>(connection)
                .optional()
                .map_err(DeploymentStateError::persistence)?;
            row.map(row_to_state).transpose()
        })
        .await
    }
}

fn optional_version_to_db(version: Option<VersionNumber>) -> DeploymentStateResult<Option<i32>> {
    version
        .map(|value| i32::try_from(value.value()).map_err(DeploymentStateError::persistence))
        .transpose()
}

fn optional_version_from_db(raw: Option<i32>) -> DeploymentStateResult<Option<VersionNumber>> {
    raw.map(|value| {
        VersionNumber::try_from(value).map_err(DeploymentStateError::invalid_persisted_data)
    })
    .transpose()
}

fn state_to_row(state: &ConnectorDeploymentState) -> DeploymentStateResult<DeploymentStateRow> {
    Ok(DeploymentStateRow {
        connector_id: state.connector_id().into_inner(),
        registry_name: state.registry_name().as_str().to_owned(),
        last_deployed_version: optional_version_to_db(state.last_deployed_version())?,
        registry_version: optional_version_to_db(state.registry_version())?,
        last_known_config: state.last_known_config().cloned(),
        updated_at: state.updated_at(),
    })
}

fn row_to_state(row: DeploymentStateRow) -> DeploymentStateResult<ConnectorDeploymentState> {
    let DeploymentStateRow {
        connector_id,
        registry_name,
        last_deployed_version,
        registry_version,
        last_known_config,
        updated_at,
    } = row;

    let data = PersistedDeploymentStateData {
        connector_id: ConnectorId::from_uuid(connector_id),
        registry_name: RegistryName::new(registry_name)
            .map_err(DeploymentStateError::invalid_persisted_data)?,
        last_deployed_version: optional_version_from_db(last_deployed_version)?,
        registry_version: optional_version_from_db(registry_version)?,
        last_known_config,
        updated_at,
    };
    Ok(ConnectorDeploymentState::from_persisted(data))
}
