//! Restore lifecycle tests over in-memory stores.

use crate::in_memory::helpers::{
    BoxError, Harness, append_all, connector_id, harness, pipeline_id, registry_name, version,
};
use connector_versions::registry::domain::{ConnectorId, VersionNumber};
use connector_versions::restore::{
    domain::{ConnectorType, PipelineId, RestoreLifecycleState},
    ports::DeploymentTargetError,
    services::{RestoreServiceError, StageRestoreRequest},
};
use rstest::rstest;
use serde_json::json;

/// Registers three versions for `C1` and records version 3 as deployed.
async fn deployed_at_three(harness: &Harness, connector_id: ConnectorId) -> Result<(), BoxError> {
    let name = registry_name("C1")?;
    append_all(
        &harness.registry,
        &name,
        &[
            json!({"host": "a", "port": 5432}),
            json!({"host": "b", "port": 5432}),
            json!({"host": "c", "port": 5432}),
        ],
    )
    .await?;
    harness
        .drift
        .track_connector(connector_id, name, None)
        .await?;
    harness
        .drift
        .record_deployment(connector_id, version(3)?)
        .await?;
    Ok(())
}

async fn deployed_version(
    harness: &Harness,
    connector_id: ConnectorId,
) -> Result<Option<VersionNumber>, BoxError> {
    let report = harness.drift.drift_report(connector_id).await?;
    Ok(report.state.last_deployed_version())
}

fn request(
    pipeline_id: PipelineId,
    connector_id: ConnectorId,
    target: VersionNumber,
) -> StageRestoreRequest {
    StageRestoreRequest::new(pipeline_id, connector_id, ConnectorType::Source, target)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn staging_twice_keeps_latest_payload(
    harness: Harness,
    pipeline_id: PipelineId,
    connector_id: ConnectorId,
) -> Result<(), BoxError> {
    deployed_at_three(&harness, connector_id).await?;

    harness
        .restores
        .stage_restore(request(pipeline_id, connector_id, VersionNumber::FIRST))
        .await?;
    let second = harness
        .restores
        .stage_restore(request(pipeline_id, connector_id, version(2)?))
        .await?;

    let rows = harness.restores.list_staged_by_pipeline(pipeline_id).await?;
    assert_eq!(rows, vec![second]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn staging_then_dismissing_leaves_nothing(
    harness: Harness,
    pipeline_id: PipelineId,
    connector_id: ConnectorId,
) -> Result<(), BoxError> {
    deployed_at_three(&harness, connector_id).await?;

    let staged = harness
        .restores
        .stage_restore(request(pipeline_id, connector_id, version(3)?))
        .await?;
    assert!(staged.diff().details().is_empty());
    assert!(harness.restores.dismiss_staged_restore(staged.id()).await?);

    let rows = harness.restores.list_staged_by_pipeline(pipeline_id).await?;
    assert!(rows.is_empty());
    assert_eq!(
        harness.restores.restore_state(pipeline_id, connector_id).await?,
        RestoreLifecycleState::NoStaging
    );
    assert_eq!(deployed_version(&harness, connector_id).await?, Some(version(3)?));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn successful_apply_moves_deployment_to_target(
    harness: Harness,
    pipeline_id: PipelineId,
    connector_id: ConnectorId,
) -> Result<(), BoxError> {
    deployed_at_three(&harness, connector_id).await?;
    let staged = harness
        .restores
        .stage_restore(request(pipeline_id, connector_id, VersionNumber::FIRST))
        .await?;
    assert_eq!(staged.diff().summary(), "host");

    harness.restores.apply_staged_restore(staged.id()).await?;

    assert_eq!(
        deployed_version(&harness, connector_id).await?,
        Some(VersionNumber::FIRST)
    );
    assert!(
        harness
            .restores
            .list_staged_by_pipeline(pipeline_id)
            .await?
            .is_empty()
    );
    let report = harness.drift.drift_report(connector_id).await?;
    assert!(!report.pending_update, "pinned restore is not drift");
    assert_eq!(harness.target.activations()?.len(), 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_apply_keeps_row_and_deployment(
    harness: Harness,
    pipeline_id: PipelineId,
    connector_id: ConnectorId,
) -> Result<(), BoxError> {
    deployed_at_three(&harness, connector_id).await?;
    let staged = harness
        .restores
        .stage_restore(request(pipeline_id, connector_id, VersionNumber::FIRST))
        .await?;
    harness
        .target
        .set_failure(Some(DeploymentTargetError::Rejected {
            connector_name: "C1".to_owned(),
            message: "invalid host".to_owned(),
        }))?;

    let result = harness.restores.apply_staged_restore(staged.id()).await;

    assert!(matches!(
        result,
        Err(RestoreServiceError::DeploymentError { ref connector_name, .. })
            if connector_name == "C1"
    ));
    assert_eq!(deployed_version(&harness, connector_id).await?, Some(version(3)?));
    assert_eq!(
        harness.restores.list_staged_by_pipeline(pipeline_id).await?,
        vec![staged]
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn offline_staging_store_degrades_to_read_only(
    harness: Harness,
    pipeline_id: PipelineId,
    connector_id: ConnectorId,
) -> Result<(), BoxError> {
    deployed_at_three(&harness, connector_id).await?;
    harness.staging.set_available(false);

    let staged = harness
        .restores
        .stage_restore(request(pipeline_id, connector_id, VersionNumber::FIRST))
        .await;
    assert!(matches!(
        staged,
        Err(RestoreServiceError::StagingUnavailable(_))
    ));

    let candidates = harness
        .restores
        .restore_candidates(pipeline_id, connector_id)
        .await?;
    assert!(!candidates.staging_available);
    assert_eq!(candidates.versions.len(), 3);

    harness.staging.set_available(true);
    let restored = harness
        .restores
        .restore_candidates(pipeline_id, connector_id)
        .await?;
    assert!(restored.staging_available);
    Ok(())
}
