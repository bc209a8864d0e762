//! BDD step definitions for persistent disk behaviour.

use pvedisk::test_support::{CommandInvocation, pvesm_listing};
use pvedisk::{DiskState, VolumeIdentity};
use rstest_bdd_macros::{given, then, when};

use super::test_helpers::{DiskContext, DiskOutcome, Operation, build_spec};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given(
    "a \"{size}\" disk named \"{name}\" owned by guest {owner:u32} in pool \"{pool}\" on node \"{node}\""
)]
fn configured_disk(
    mut disk_context: DiskContext,
    size: String,
    name: String,
    owner: u32,
    pool: String,
    node: String,
) -> DiskContext {
    let spec = build_spec(&size, &name, owner, &pool, &node);
    disk_context.state = Some(DiskState::new(spec));
    disk_context
}

#[given("the disk was created earlier")]
fn created_earlier(mut disk_context: DiskContext) -> DiskContext {
    let state = disk_context.state().clone();
    let identity = VolumeIdentity::compose(&state.spec);
    disk_context.state = Some(state.with_identity(identity));
    disk_context
}

#[given("pvesm succeeds")]
fn pvesm_succeeds(disk_context: DiskContext) -> DiskContext {
    disk_context.runner.push_success();
    disk_context
}

#[given("pvesm rejects the request with \"{message}\"")]
fn pvesm_rejects(disk_context: DiskContext, message: String) -> DiskContext {
    disk_context
        .runner
        .push_failure(255, format!("{message}\n"));
    disk_context
}

#[given("pvesm lists the volume at {bytes:u64} bytes in format \"{format}\"")]
fn pvesm_lists_volume(disk_context: DiskContext, bytes: u64, format: String) -> DiskContext {
    let spec = disk_context.state().spec.clone();
    let volume = spec.volume_name();
    disk_context.runner.push_stdout(pvesm_listing(
        spec.owner_id,
        &[(spec.storage_pool.as_str(), volume.as_str(), format.as_str(), bytes)],
    ));
    disk_context
}

#[given("pvesm lists no volumes")]
fn pvesm_lists_nothing(disk_context: DiskContext) -> DiskContext {
    let owner_id = disk_context.state().spec.owner_id;
    disk_context.runner.push_stdout(pvesm_listing(owner_id, &[]));
    disk_context
}

#[given("the node is unreachable")]
fn node_unreachable(disk_context: DiskContext) -> DiskContext {
    disk_context
        .runner
        .push_unreachable("ssh: connect to host pve1.pve.test port 22: Connection refused\n");
    disk_context
}

#[when("I create the disk")]
fn create_disk(disk_context: DiskContext) -> DiskContext {
    disk_context.run(Operation::Create)
}

#[when("I read the disk")]
fn read_disk(disk_context: DiskContext) -> DiskContext {
    disk_context.run(Operation::Read)
}

#[when("I delete the disk")]
fn delete_disk(disk_context: DiskContext) -> DiskContext {
    disk_context.run(Operation::Delete)
}

#[then("the operation succeeds")]
fn operation_succeeds(disk_context: &DiskContext) -> Result<(), StepError> {
    match disk_context.outcome {
        Some(DiskOutcome::Success) => Ok(()),
        ref other => Err(StepError::Assertion(format!(
            "expected success, got: {other:?}"
        ))),
    }
}

#[then("the operation fails mentioning \"{needle}\"")]
fn operation_fails(disk_context: &DiskContext, needle: String) -> Result<(), StepError> {
    let Some(DiskOutcome::Failure(ref message)) = disk_context.outcome else {
        return Err(StepError::Assertion(format!(
            "expected failure, got: {:?}",
            disk_context.outcome
        )));
    };
    if message.contains(&needle) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected failure mentioning '{needle}', got: {message}"
        )))
    }
}

#[then("the disk identity is \"{expected}\"")]
fn identity_is(disk_context: &DiskContext, expected: String) -> Result<(), StepError> {
    let actual = disk_context
        .state()
        .identity
        .as_ref()
        .map(VolumeIdentity::as_str);
    if actual == Some(expected.as_str()) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected identity {expected}, got {actual:?}"
        )))
    }
}

#[then("the disk has no identity")]
fn no_identity(disk_context: &DiskContext) -> Result<(), StepError> {
    match disk_context.state().identity {
        None => Ok(()),
        Some(ref identity) => Err(StepError::Assertion(format!(
            "expected no identity, got {identity}"
        ))),
    }
}

#[then("the disk reports {gigabytes:u64} gigabytes in format \"{format}\"")]
fn reports_size(
    disk_context: &DiskContext,
    gigabytes: u64,
    format: String,
) -> Result<(), StepError> {
    let spec = &disk_context.state().spec;
    if spec.size.gigabytes() == gigabytes && spec.format == format {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {gigabytes} GiB {format}, got {} GiB {}",
            spec.size.gigabytes(),
            spec.format
        )))
    }
}

#[then("the node ran \"{command}\"")]
fn node_ran(disk_context: &DiskContext, command: String) -> Result<(), StepError> {
    let invocations = disk_context.runner.invocations();
    let ran = invocations
        .iter()
        .filter_map(CommandInvocation::remote_command)
        .any(|remote| remote.contains(&command));
    if ran {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected a remote script running '{command}', got {invocations:?}"
        )))
    }
}
