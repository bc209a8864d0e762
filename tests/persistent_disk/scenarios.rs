//! BDD scenarios for the persistent disk lifecycle.

use rstest_bdd_macros::scenario;

use super::test_helpers::{DiskContext, disk_context};

#[scenario(
    path = "tests/features/persistent_disk.feature",
    name = "Allocate a volume and record its identity"
)]
fn scenario_allocate(disk_context: DiskContext) {
    let _ = disk_context;
}

#[scenario(
    path = "tests/features/persistent_disk.feature",
    name = "Surface allocation failures verbatim"
)]
fn scenario_allocation_failure(disk_context: DiskContext) {
    let _ = disk_context;
}

#[scenario(
    path = "tests/features/persistent_disk.feature",
    name = "Read reports whole gigabytes and the observed format"
)]
fn scenario_read_floors_size(disk_context: DiskContext) {
    let _ = disk_context;
}

#[scenario(
    path = "tests/features/persistent_disk.feature",
    name = "Read clears the identity of a vanished volume"
)]
fn scenario_read_missing(disk_context: DiskContext) {
    let _ = disk_context;
}

#[scenario(
    path = "tests/features/persistent_disk.feature",
    name = "Delete frees the volume"
)]
fn scenario_delete(disk_context: DiskContext) {
    let _ = disk_context;
}

#[scenario(
    path = "tests/features/persistent_disk.feature",
    name = "Unreachable nodes are connection failures"
)]
fn scenario_unreachable(disk_context: DiskContext) {
    let _ = disk_context;
}
