//! Core library for the `pvedisk` persistent volume provisioner.
//!
//! The crate manages storage volumes on Proxmox VE nodes by running `pvesm`
//! over SSH. Volumes are owned by a reserved guest identifier so they outlive
//! the guests that use them. Each lifecycle operation builds a shell script,
//! runs it through a remote session, and reconciles the caller's state from
//! the command output.

pub mod config;
pub mod disk;
pub mod executor;
pub mod logging;
pub mod resource;
pub mod script;
pub mod session;
#[cfg(test)]
mod test_helpers;
pub mod test_support;

pub use config::{ConfigError, ProviderConfig};
pub use disk::{
    DiskError, DiskSize, DiskState, PersistentDisk, SpecError, VolumeIdentity, VolumeSpec,
    VolumeSpecBuilder,
};
pub use executor::ExecutionError;
pub use resource::Resource;
pub use script::CommandScript;
pub use session::{
    CommandOutput, CommandRunner, GatewayError, ProcessCommandRunner, Session, SessionGateway,
    SshGateway,
};
