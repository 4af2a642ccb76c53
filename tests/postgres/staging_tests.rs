//! Staging adapter tests against `PostgreSQL`.

use crate::postgres::helpers::{
    BoxError, CleanupGuard, Migrations, database_name, setup_database, test_runtime,
};
use connector_versions::registry::domain::{
    ConnectorId, NewConfigVersion, RegistryName, VersionNumber,
};
use connector_versions::restore::{
    domain::{ConnectorType, PipelineId, StagedRestore},
    ports::{StagingRepository, StagingRepositoryError},
};
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::TestCluster;
use pg_embedded_setup_unpriv::test_support::shared_test_cluster;
use rstest::rstest;
use serde_json::{Value, json};

fn staged(
    pipeline_id: PipelineId,
    connector_id: ConnectorId,
    config: Value,
) -> Result<StagedRestore, BoxError> {
    let target = NewConfigVersion::new(RegistryName::new("C1")?, config, &DefaultClock)
        .into_version(VersionNumber::FIRST);
    Ok(StagedRestore::new(
        pipeline_id,
        connector_id,
        ConnectorType::Sink,
        &target,
        &json!({"host": "live"}),
        &DefaultClock,
    ))
}

#[rstest]
fn restaging_upserts_one_row_per_connector(
    shared_test_cluster: &'static TestCluster,
) -> Result<(), BoxError> {
    let db_name = database_name("restage");
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    let db = setup_database(shared_test_cluster, &db_name, Migrations::All)?;
    let pipeline_id = PipelineId::new();
    let connector_id = ConnectorId::new();
    let first = staged(pipeline_id, connector_id, json!({"host": "a"}))?;
    let second = staged(pipeline_id, connector_id, json!({"host": "b"}))?;

    test_runtime()?.block_on(async {
        db.staging.stage(&first).await?;
        let stored = db.staging.stage(&second).await?;

        assert_eq!(stored.id(), second.id());
        let rows = db.staging.list_by_pipeline(pipeline_id).await?;
        assert_eq!(rows.len(), 1);
        let row = rows.first().ok_or("one staged row")?;
        assert_eq!(row.staged_config(), &json!({"host": "b"}));
        assert_eq!(row.connector_type(), ConnectorType::Sink);
        assert_eq!(row.diff().details(), ["host: \"live\" -> \"b\""]);
        assert!(db.staging.find_by_id(first.id()).await?.is_none());

        assert!(db.staging.remove(second.id()).await?);
        assert!(!db.staging.remove(second.id()).await?);
        assert!(
            db.staging
                .find_by_connector(pipeline_id, connector_id)
                .await?
                .is_none()
        );
        Ok::<(), BoxError>(())
    })
}

#[rstest]
fn staged_payload_round_trips_unchanged(
    shared_test_cluster: &'static TestCluster,
) -> Result<(), BoxError> {
    let db_name = database_name("staged_payload");
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    let db = setup_database(shared_test_cluster, &db_name, Migrations::All)?;
    let config: Value = serde_json::from_str(r#"{"ratio":-0.0,"topic":"a\u0000b"}"#)?;
    let restore = staged(PipelineId::new(), ConnectorId::new(), config.clone())?;

    test_runtime()?.block_on(async {
        db.staging.stage(&restore).await?;

        let stored = db
            .staging
            .find_by_id(restore.id())
            .await?
            .ok_or("staged row is stored")?;
        assert_eq!(stored.staged_config().to_string(), config.to_string());
        assert_eq!(stored.checksum(), restore.checksum());
        Ok::<(), BoxError>(())
    })
}

#[rstest]
fn missing_table_reports_unavailable(
    shared_test_cluster: &'static TestCluster,
) -> Result<(), BoxError> {
    let db_name = database_name("unavailable");
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    let db = setup_database(shared_test_cluster, &db_name, Migrations::RegistryOnly)?;

    let result = test_runtime()?.block_on(db.staging.list_by_pipeline(PipelineId::new()));

    assert!(matches!(result, Err(StagingRepositoryError::Unavailable(_))));
    Ok(())
}
