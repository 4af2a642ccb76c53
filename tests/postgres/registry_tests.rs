//! Registry adapter tests against `PostgreSQL`.

use crate::postgres::helpers::{
    BoxError, CleanupGuard, Migrations, database_name, setup_database, test_runtime,
};
use connector_versions::registry::{
    domain::{ConnectorDeploymentState, ConnectorId, NewConfigVersion, RegistryName, VersionNumber},
    ports::{ConfigVersionRepository, DeploymentStateRepository},
};
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::TestCluster;
use pg_embedded_setup_unpriv::test_support::shared_test_cluster;
use rstest::rstest;
use serde_json::{Value, json};
use std::sync::Arc;

#[rstest]
fn appends_are_numbered_and_listed_descending(
    shared_test_cluster: &'static TestCluster,
) -> Result<(), BoxError> {
    let db_name = database_name("appends");
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    let db = setup_database(shared_test_cluster, &db_name, Migrations::All)?;
    let name = RegistryName::new("orders-source")?;

    test_runtime()?.block_on(async {
        for host in ["a", "b", "c"] {
            db.versions
                .append(NewConfigVersion::new(
                    name.clone(),
                    json!({"host": host}),
                    &DefaultClock,
                ))
                .await?;
        }

        let listed = db.versions.list_versions(&name, Some(2)).await?;
        let numbers: Vec<u32> = listed.iter().map(|entry| entry.version().value()).collect();
        assert_eq!(numbers, vec![3, 2]);
        assert_eq!(db.versions.latest_version(&name).await?, VersionNumber::new(3).ok());

        let first = db
            .versions
            .find_version(&name, VersionNumber::FIRST)
            .await?
            .ok_or("version 1 is stored")?;
        assert_eq!(first.config(), &json!({"host": "a"}));
        first.verify_checksum()?;
        Ok::<(), BoxError>(())
    })
}

#[rstest]
#[case::negative_zero(r#"{"ratio":-0.0}"#)]
#[case::nul_escape(r#"{"topic":"a\u0000b"}"#)]
#[case::large_numbers(r#"{"nested":{"z":1,"a":[1.5e300]},"offset":18446744073709551615}"#)]
fn stored_payloads_still_match_their_checksum(
    shared_test_cluster: &'static TestCluster,
    #[case] raw: &str,
) -> Result<(), BoxError> {
    let config: Value = serde_json::from_str(raw)?;
    let db_name = database_name("payloads");
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    let db = setup_database(shared_test_cluster, &db_name, Migrations::All)?;
    let name = RegistryName::new("payloads")?;

    test_runtime()?.block_on(async {
        let appended = db
            .versions
            .append(NewConfigVersion::new(name.clone(), config.clone(), &DefaultClock))
            .await?;

        let stored = db
            .versions
            .find_version(&name, appended.version())
            .await?
            .ok_or("appended version is stored")?;
        stored.verify_checksum()?;
        assert_eq!(stored.checksum(), appended.checksum());
        assert_eq!(stored.config().to_string(), config.to_string());
        Ok::<(), BoxError>(())
    })
}

#[rstest]
fn concurrent_appends_never_share_a_number(
    shared_test_cluster: &'static TestCluster,
) -> Result<(), BoxError> {
    let db_name = database_name("contended");
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    let db = setup_database(shared_test_cluster, &db_name, Migrations::All)?;
    let name = RegistryName::new("contended")?;
    let versions = Arc::new(db.versions.clone());

    test_runtime()?.block_on(async {
        let mut handles = Vec::new();
        for index in 0..8 {
            let repository = Arc::clone(&versions);
            let registry = name.clone();
            handles.push(tokio::spawn(async move {
                repository
                    .append(NewConfigVersion::new(
                        registry,
                        json!({"writer": index}),
                        &DefaultClock,
                    ))
                    .await
            }));
        }

        let mut stored = Vec::new();
        for handle in handles {
            stored.push(handle.await??.version().value());
        }
        stored.sort_unstable();
        assert_eq!(stored, (1..=8).collect::<Vec<u32>>());
        Ok::<(), BoxError>(())
    })
}

#[rstest]
fn register_is_idempotent(shared_test_cluster: &'static TestCluster) -> Result<(), BoxError> {
    let db_name = database_name("register");
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    let db = setup_database(shared_test_cluster, &db_name, Migrations::All)?;
    let name = RegistryName::new("orders-sink")?;

    test_runtime()?.block_on(async {
        assert!(!db.versions.exists(&name).await?);
        assert!(db.versions.register(&name).await?);
        assert!(!db.versions.register(&name).await?);
        assert!(db.versions.exists(&name).await?);
        assert!(db.versions.list_versions(&name, None).await?.is_empty());
        Ok::<(), BoxError>(())
    })
}

#[rstest]
fn deployment_state_upsert_replaces_fields(
    shared_test_cluster: &'static TestCluster,
) -> Result<(), BoxError> {
    let db_name = database_name("states");
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    let db = setup_database(shared_test_cluster, &db_name, Migrations::All)?;
    let connector_id = ConnectorId::new();
    let name = RegistryName::new("orders-source")?;

    test_runtime()?.block_on(async {
        let mut state = ConnectorDeploymentState::new(connector_id, name.clone(), &DefaultClock);
        db.states.upsert(&state).await?;

        state.record_deployment(VersionNumber::FIRST, &DefaultClock);
        state.record_live_config(json!({"host": "a"}), &DefaultClock);
        db.states.upsert(&state).await?;

        let found = db.states.find(connector_id).await?.ok_or("state is stored")?;
        assert_eq!(found.last_deployed_version(), Some(VersionNumber::FIRST));
        assert_eq!(found.last_known_config(), Some(&json!({"host": "a"})));
        Ok::<(), BoxError>(())
    })
}
