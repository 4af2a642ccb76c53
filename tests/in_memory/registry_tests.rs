//! Version registry tests over in-memory stores.

use crate::in_memory::helpers::{
    BoxError, Harness, append_all, connector_id, harness, registry_name, version,
};
use connector_versions::config::AppendPolicy;
use connector_versions::config_diff::{DiffStatus, NO_CHANGES_SUMMARY};
use connector_versions::registry::{
    domain::{ConnectorId, VersionNumber},
    services::{RegistryServiceError, RegistrySettings},
};
use rstest::rstest;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn versions_are_gapless_and_listed_newest_first(harness: Harness) -> Result<(), BoxError> {
    let name = registry_name("orders-source")?;
    let configs: Vec<_> = (0..12).map(|batch| json!({"batch.size": batch})).collect();

    let stored = append_all(&harness.registry, &name, &configs).await?;
    let numbers: Vec<u32> = stored.iter().map(|entry| entry.version().value()).collect();
    assert_eq!(numbers, (1..=12).collect::<Vec<u32>>());

    let listed = harness.registry.list_versions(&name, None).await?;
    let listed_numbers: Vec<u32> = listed.iter().map(|entry| entry.version().value()).collect();
    assert_eq!(listed_numbers, (3..=12).rev().collect::<Vec<u32>>());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_appends_get_distinct_gapless_numbers(
    harness: Harness,
) -> Result<(), BoxError> {
    let name = registry_name("contended")?;
    let registry = Arc::new(harness.registry);

    let handles: Vec<_> = (0..32)
        .map(|writer| {
            let service = Arc::clone(&registry);
            let target = name.clone();
            tokio::spawn(async move { service.append(&target, &json!({"writer": writer})).await })
        })
        .collect();

    let mut numbers = Vec::with_capacity(handles.len());
    for handle in handles {
        numbers.push(handle.await??.version().value());
    }
    let distinct: BTreeSet<u32> = numbers.iter().copied().collect();
    assert_eq!(distinct.len(), numbers.len(), "no number is assigned twice");
    assert_eq!(distinct, (1..=32).collect::<BTreeSet<u32>>());

    let history = registry.list_versions(&name, Some(32)).await?;
    let writers: BTreeSet<_> = history
        .iter()
        .filter_map(|entry| entry.config().get("writer").and_then(serde_json::Value::as_u64))
        .collect();
    assert_eq!(writers.len(), 32, "every payload is kept");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stored_payload_round_trips_with_checksum(harness: Harness) -> Result<(), BoxError> {
    let name = registry_name("orders-source")?;
    let config = json!({"database": {"host": "db", "port": 5432}, "tables": ["t1", "t2"]});

    let stored = harness.registry.append(&name, &config).await?;

    assert_eq!(harness.registry.get_version(&name, stored.version()).await?, config);
    harness.registry.verify_checksum(&name, stored.version()).await?;
    let record = harness
        .registry
        .get_config_version(&name, VersionNumber::FIRST)
        .await?;
    assert_eq!(record.checksum(), stored.checksum());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_version_is_reported(harness: Harness) -> Result<(), BoxError> {
    let name = registry_name("orders-source")?;
    harness.registry.append(&name, &json!({"a": 1})).await?;

    let result = harness.registry.get_version(&name, version(2)?).await;

    assert!(matches!(
        result,
        Err(RegistryServiceError::VersionNotFound { version: missing, .. })
            if missing.value() == 2
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn require_existing_policy_needs_registration(harness: Harness) -> Result<(), BoxError> {
    let settings = RegistrySettings::default().with_append_policy(AppendPolicy::RequireExisting);
    let registry = harness.registry.with_settings(settings);
    let name = registry_name("orders-sink")?;

    let rejected = registry.append(&name, &json!({"topic": "orders"})).await;
    assert!(matches!(
        rejected,
        Err(RegistryServiceError::RegistryNameNotFound(_))
    ));

    assert!(registry.register(&name).await?);
    assert!(!registry.register(&name).await?);
    let stored = registry.append(&name, &json!({"topic": "orders"})).await?;
    assert_eq!(stored.version(), VersionNumber::FIRST);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn history_pairs_each_version_with_its_changes(harness: Harness) -> Result<(), BoxError> {
    let name = registry_name("orders-source")?;
    append_all(
        &harness.registry,
        &name,
        &[
            json!({"host": "a", "port": 5432}),
            json!({"host": "b", "port": 5432}),
            json!({"host": "b", "port": 5432}),
        ],
    )
    .await?;

    let history = harness.registry.version_history(&name, None).await?;
    let summaries: Vec<(u32, &str)> = history
        .iter()
        .map(|entry| (entry.version.version().value(), entry.diff.summary()))
        .collect();

    assert_eq!(
        summaries,
        vec![(3, NO_CHANGES_SUMMARY), (2, "host"), (1, "host, port")]
    );
    let oldest = history.last().ok_or("history has entries")?;
    assert_eq!(oldest.diff.with_status(DiffStatus::Added).count(), 2);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn active_version_follows_pin_then_latest(
    harness: Harness,
    connector_id: ConnectorId,
) -> Result<(), BoxError> {
    let name = registry_name("orders-source")?;
    append_all(&harness.registry, &name, &[json!({"v": 1}), json!({"v": 2})]).await?;
    harness
        .drift
        .track_connector(connector_id, name.clone(), None)
        .await?;

    assert_eq!(
        harness.registry.get_active_version(connector_id).await?,
        Some(version(2)?)
    );

    harness
        .drift
        .pin_registry_version(connector_id, Some(VersionNumber::FIRST))
        .await?;
    assert_eq!(
        harness.registry.get_active_version(connector_id).await?,
        Some(VersionNumber::FIRST)
    );
    Ok(())
}
