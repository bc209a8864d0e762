//! Command-line interface definitions for the `pvedisk` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::{Args, Parser};

/// Top-level CLI for the `pvedisk` binary.
#[derive(Debug, Parser)]
#[command(
    name = "pvedisk",
    about = "Manage persistent Proxmox VE storage volumes over SSH",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Allocate a volume and print its identifier.
    #[command(name = "create", about = "Allocate a volume and print its identifier")]
    Create(DiskArgs),
    /// Report the observed state of a volume as JSON.
    #[command(name = "read", about = "Report the observed state of a volume as JSON")]
    Read(ReadCommand),
    /// Free a volume.
    #[command(name = "delete", about = "Free a volume")]
    Delete(DiskArgs),
}

/// Volume parameters shared by every subcommand.
#[derive(Debug, Args)]
pub(crate) struct DiskArgs {
    /// Cluster node that hosts the storage pool.
    #[arg(long, value_name = "NODE")]
    pub(crate) node: String,
    /// Storage pool the volume is allocated in.
    #[arg(long, value_name = "POOL")]
    pub(crate) storage: String,
    /// Guest identifier that owns the volume. Pick one no guest will use.
    #[arg(long, value_name = "ID")]
    pub(crate) vm_id: u32,
    /// Volume name; the stored volume is `vm-<ID>-<NAME>`.
    #[arg(long, value_name = "NAME", default_value = "persistent-1")]
    pub(crate) name: String,
    /// Volume size as gigabytes (`10`) or with a K, M, G or T suffix.
    #[arg(long, value_name = "SIZE", default_value = "10")]
    pub(crate) size: String,
    /// Volume format: raw, qcow2, subvol or vmdk.
    #[arg(long, value_name = "FORMAT", default_value = "raw")]
    pub(crate) format: String,
}

/// Arguments for the `pvedisk read` subcommand.
#[derive(Debug, Args)]
pub(crate) struct ReadCommand {
    /// Volume parameters.
    #[command(flatten)]
    pub(crate) disk: DiskArgs,
    /// Identifier printed by an earlier `create`. Defaults to the identifier
    /// derived from the volume parameters.
    #[arg(long, value_name = "IDENTITY")]
    pub(crate) id: Option<String>,
}
