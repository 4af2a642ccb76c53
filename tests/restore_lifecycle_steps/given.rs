//! Given steps for restore lifecycle BDD scenarios.

use super::world::{RestoreWorld, run_async};
use connector_versions::registry::domain::{RegistryName, VersionNumber};
use connector_versions::restore::ports::DeploymentTargetError;
use eyre::WrapErr;
use rstest_bdd_macros::given;
use serde_json::json;

#[given(r#"the registry "{name}" holds {count:u32} versions"#)]
fn registry_holds_versions(
    world: &mut RestoreWorld,
    name: String,
    count: u32,
) -> Result<(), eyre::Report> {
    let registry_name = RegistryName::new(name).wrap_err("registry name in scenario")?;
    for index in 1..=count {
        run_async(
            world
                .registry
                .append(&registry_name, &json!({"host": format!("h{index}"), "port": 5432})),
        )
        .wrap_err("append scenario version")?;
    }
    Ok(())
}

#[given(r#"a connector tracking "{name}" deployed at version {version:u32}"#)]
fn connector_deployed_at(
    world: &mut RestoreWorld,
    name: String,
    version: u32,
) -> Result<(), eyre::Report> {
    let registry_name = RegistryName::new(name).wrap_err("registry name in scenario")?;
    let deployed = VersionNumber::new(version).wrap_err("deployed version in scenario")?;
    run_async(
        world
            .drift
            .track_connector(world.connector_id, registry_name, None),
    )
    .wrap_err("track scenario connector")?;
    run_async(world.drift.record_deployment(world.connector_id, deployed))
        .wrap_err("record scenario deployment")?;
    Ok(())
}

#[given("the deployment target rejects activations")]
fn target_rejects_activations(world: &mut RestoreWorld) -> Result<(), eyre::Report> {
    world
        .target
        .set_failure(Some(DeploymentTargetError::Rejected {
            connector_name: "C1".to_owned(),
            message: "connector configuration is invalid".to_owned(),
        }))
        .wrap_err("inject deployment failure")?;
    Ok(())
}
