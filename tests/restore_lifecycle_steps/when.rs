//! When steps for restore lifecycle BDD scenarios.

use super::world::{RestoreWorld, run_async};
use connector_versions::registry::domain::{RegistryName, VersionNumber};
use connector_versions::restore::{domain::ConnectorType, services::StageRestoreRequest};
use eyre::WrapErr;
use rstest_bdd_macros::when;
use serde_json::json;

#[when("a restore to version {version:u32} is staged")]
fn restore_is_staged(world: &mut RestoreWorld, version: u32) -> Result<(), eyre::Report> {
    let target = VersionNumber::new(version).wrap_err("target version in scenario")?;
    let request = StageRestoreRequest::new(
        world.pipeline_id,
        world.connector_id,
        ConnectorType::Source,
        target,
    );
    let staged =
        run_async(world.restores.stage_restore(request)).wrap_err("stage scenario restore")?;
    world.last_staged = Some(staged);
    Ok(())
}

#[when("the staged restore is applied")]
fn staged_restore_is_applied(world: &mut RestoreWorld) -> Result<(), eyre::Report> {
    let staged = world
        .last_staged
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing staged restore in scenario world"))?;
    let result = run_async(world.restores.apply_staged_restore(staged.id()));
    world.last_apply_result = Some(result);
    Ok(())
}

#[when("the staged restore is dismissed")]
fn staged_restore_is_dismissed(world: &mut RestoreWorld) -> Result<(), eyre::Report> {
    let staged = world
        .last_staged
        .take()
        .ok_or_else(|| eyre::eyre!("missing staged restore in scenario world"))?;
    let removed = run_async(world.restores.dismiss_staged_restore(staged.id()))
        .wrap_err("dismiss scenario restore")?;
    eyre::ensure!(removed, "expected the staged restore to be removed");
    Ok(())
}

#[when(r#"a new configuration is appended to "{name}""#)]
fn new_configuration_appended(world: &mut RestoreWorld, name: String) -> Result<(), eyre::Report> {
    let registry_name = RegistryName::new(name).wrap_err("registry name in scenario")?;
    run_async(
        world
            .registry
            .append(&registry_name, &json!({"host": "h-next", "port": 5432})),
    )
    .wrap_err("append new scenario version")?;
    Ok(())
}
