//! Then steps for restore lifecycle BDD scenarios.

use super::world::{RestoreWorld, run_async};
use connector_versions::registry::domain::VersionNumber;
use connector_versions::restore::services::RestoreServiceError;
use eyre::WrapErr;
use rstest_bdd_macros::then;

#[then(r#"the staged diff summary is "{summary}""#)]
fn staged_diff_summary_is(world: &RestoreWorld, summary: String) -> Result<(), eyre::Report> {
    let staged = world
        .last_staged
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing staged restore"))?;
    let diff = staged.diff();
    eyre::ensure!(
        diff.summary() == summary,
        "expected summary {summary:?}, found {:?}",
        diff.summary()
    );
    Ok(())
}

#[then("the connector is deployed at version {version:u32}")]
fn connector_is_deployed_at(world: &RestoreWorld, version: u32) -> Result<(), eyre::Report> {
    let expected = VersionNumber::new(version).wrap_err("expected version in scenario")?;
    let report = run_async(world.drift.drift_report(world.connector_id))
        .wrap_err("read scenario drift report")?;
    let deployed = report.state.last_deployed_version();
    eyre::ensure!(
        deployed == Some(expected),
        "expected deployed version {expected}, found {deployed:?}"
    );
    Ok(())
}

#[then("no restore is staged for the pipeline")]
fn no_restore_is_staged(world: &RestoreWorld) -> Result<(), eyre::Report> {
    let rows = run_async(world.restores.list_staged_by_pipeline(world.pipeline_id))
        .wrap_err("list staged restores")?;
    eyre::ensure!(rows.is_empty(), "expected no staged restores, found {}", rows.len());
    Ok(())
}

#[then("one restore to version {version:u32} is staged for the pipeline")]
fn one_restore_is_staged(world: &RestoreWorld, version: u32) -> Result<(), eyre::Report> {
    let rows = run_async(world.restores.list_staged_by_pipeline(world.pipeline_id))
        .wrap_err("list staged restores")?;
    eyre::ensure!(rows.len() == 1, "expected one staged restore, found {}", rows.len());
    let row = rows
        .first()
        .ok_or_else(|| eyre::eyre!("expected a staged restore"))?;
    eyre::ensure!(
        row.target_version().value() == version,
        "expected target version {version}, found {}",
        row.target_version()
    );
    Ok(())
}

#[then("the apply fails with a deployment error")]
fn apply_fails_with_deployment_error(world: &RestoreWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_apply_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing apply result"))?;

    if !matches!(result, Err(RestoreServiceError::DeploymentError { .. })) {
        return Err(eyre::eyre!("expected DeploymentError, got {result:?}"));
    }
    Ok(())
}

#[then(r#"the connector has a pending update on "{path}""#)]
fn connector_has_pending_update(world: &RestoreWorld, path: String) -> Result<(), eyre::Report> {
    let report = run_async(world.drift.drift_report(world.connector_id))
        .wrap_err("read scenario drift report")?;
    eyre::ensure!(report.pending_update, "expected a pending update");
    let diff = report
        .diff
        .ok_or_else(|| eyre::eyre!("pending update without a diff"))?;
    eyre::ensure!(
        diff.summary() == path,
        "expected drift on {path:?}, found {:?}",
        diff.summary()
    );
    Ok(())
}
