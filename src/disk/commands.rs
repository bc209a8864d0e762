//! `pvesm` scripts for allocating, listing, and freeing volumes.

use std::borrow::Cow;

use shell_escape::unix::escape;

use super::spec::VolumeSpec;
use crate::script::{CommandScript, var};

/// Builds `pvesm alloc <storage> <owner> vm-<owner>-<name> <size> --format <format>`.
#[must_use]
pub fn allocate(tool: &str, spec: &VolumeSpec) -> CommandScript {
    CommandScript::builder()
        .assign("storage", &spec.storage_pool)
        .assign("vm_id", spec.owner_id)
        .assign("disk_name", &spec.name)
        .assign("disk_size", spec.size.to_pvesm_arg())
        .assign("disk_format", &spec.format)
        .invoke(format!(
            "{} alloc {} {} \"vm-${{vm_id}}-${{disk_name}}\" {} --format {}",
            escape(Cow::Borrowed(tool)),
            var("storage"),
            var("vm_id"),
            var("disk_size"),
            var("disk_format"),
        ))
}

/// Builds `pvesm list <storage> --vmid <owner> --content images`.
#[must_use]
pub fn list(tool: &str, spec: &VolumeSpec) -> CommandScript {
    CommandScript::builder()
        .assign("storage", &spec.storage_pool)
        .assign("vm_id", spec.owner_id)
        .invoke(format!(
            "{} list {} --vmid {} --content images",
            escape(Cow::Borrowed(tool)),
            var("storage"),
            var("vm_id"),
        ))
}

/// Builds `pvesm free vm-<owner>-<name> --storage <storage>`.
#[must_use]
pub fn free(tool: &str, spec: &VolumeSpec) -> CommandScript {
    CommandScript::builder()
        .assign("storage", &spec.storage_pool)
        .assign("vm_id", spec.owner_id)
        .assign("disk_name", &spec.name)
        .invoke(format!(
            "{} free \"vm-${{vm_id}}-${{disk_name}}\" --storage {}",
            escape(Cow::Borrowed(tool)),
            var("storage"),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::spec::DiskSize;
    use rstest::{fixture, rstest};

    #[fixture]
    fn spec() -> VolumeSpec {
        VolumeSpec::builder()
            .node("pve1")
            .storage_pool("local-lvm")
            .owner_id(9000)
            .name("data")
            .size("20G".parse::<DiskSize>().expect("size"))
            .format("qcow2")
            .build()
            .expect("spec should build")
    }

    #[rstest]
    fn allocate_assigns_parameters_then_invokes(spec: VolumeSpec) {
        let script = allocate("pvesm", &spec);
        assert_eq!(
            script.statements(),
            [
                "set -e",
                "storage=local-lvm",
                "vm_id=9000",
                "disk_name=data",
                "disk_size=20G",
                "disk_format=qcow2",
                "pvesm alloc \"${storage}\" \"${vm_id}\" \"vm-${vm_id}-${disk_name}\" \"${disk_size}\" --format \"${disk_format}\"",
            ]
        );
    }

    #[rstest]
    fn list_scopes_to_owner_images(spec: VolumeSpec) {
        let script = list("pvesm", &spec);
        assert_eq!(
            script.statements(),
            [
                "set -e",
                "storage=local-lvm",
                "vm_id=9000",
                "pvesm list \"${storage}\" --vmid \"${vm_id}\" --content images",
            ]
        );
    }

    #[rstest]
    fn free_targets_volume_path(spec: VolumeSpec) {
        let script = free("pvesm", &spec);
        assert_eq!(
            script.statements().last().map(String::as_str),
            Some("pvesm free \"vm-${vm_id}-${disk_name}\" --storage \"${storage}\"")
        );
        assert!(script.statements().contains(&String::from("disk_name=data")));
    }

    #[rstest]
    fn tool_path_is_escaped(spec: VolumeSpec) {
        let script = list("/opt/pve tools/pvesm", &spec);
        let invocation = script.statements().last().expect("invocation");
        assert!(
            invocation.starts_with("'/opt/pve tools/pvesm' list"),
            "unexpected invocation: {invocation}"
        );
    }
}
