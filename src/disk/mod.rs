//! Persistent volumes allocated on a node's storage pool with `pvesm`.
//!
//! The volume is owned by a guest identifier that must never belong to a real
//! guest, which keeps Proxmox VE from deleting it alongside a guest. State is
//! discovered by listing the owner's images and matching the volume name;
//! there is no update path and no server-side identity.

use tracing::{info, warn};

use crate::config::{DEFAULT_STORAGE_TOOL, ProviderConfig};
use crate::executor;
use crate::resource::Resource;
use crate::session::SessionGateway;

pub mod commands;
mod error;
pub mod identity;
pub mod listing;
pub mod reconcile;
pub mod spec;

pub use error::DiskError;
pub use identity::VolumeIdentity;
pub use listing::{ListingError, VolumeListing, VolumeRecord, parse_listing};
pub use reconcile::{ObservedVolume, Reconciliation, reconcile};
pub use spec::{DiskSize, SpecError, VolumeSpec, VolumeSpecBuilder};

/// Configured parameters of a volume plus its recorded identity.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DiskState {
    /// Volume parameters. Reads overwrite `size` and `format` with the
    /// observed values.
    pub spec: VolumeSpec,
    /// Identity recorded at creation; `None` while the volume is absent.
    pub identity: Option<VolumeIdentity>,
}

impl DiskState {
    /// State for a volume that has not been created yet.
    #[must_use]
    pub const fn new(spec: VolumeSpec) -> Self {
        Self {
            spec,
            identity: None,
        }
    }

    /// Attaches an identity recorded earlier.
    #[must_use]
    pub fn with_identity(mut self, identity: VolumeIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Returns `true` while an identity is recorded.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.identity.is_some()
    }
}

/// Persistent volume resource driving `pvesm` over a remote session.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PersistentDisk {
    storage_tool: String,
}

impl Default for PersistentDisk {
    fn default() -> Self {
        Self::new(DEFAULT_STORAGE_TOOL)
    }
}

impl PersistentDisk {
    /// Creates the resource using `storage_tool` as the `pvesm` binary.
    #[must_use]
    pub fn new(storage_tool: impl Into<String>) -> Self {
        Self {
            storage_tool: storage_tool.into(),
        }
    }

    /// Creates the resource with the tool named in `config`.
    #[must_use]
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(config.storage_tool.clone())
    }
}

impl<G: SessionGateway> Resource<G> for PersistentDisk {
    type State = DiskState;
    type Error = DiskError;

    fn create(&self, gateway: &G, state: &mut DiskState) -> Result<(), DiskError> {
        state.spec.validate()?;
        let script = commands::allocate(&self.storage_tool, &state.spec);
        {
            let session = gateway
                .open_session(&state.spec.node)
                .map_err(DiskError::gateway("create"))?;
            executor::execute(&session, &script).map_err(DiskError::execution("create"))?;
        }

        let identity = VolumeIdentity::compose(&state.spec);
        info!(
            node = %state.spec.node,
            storage = %state.spec.storage_pool,
            volume = %state.spec.volume_name(),
            identity = %identity,
            "allocated volume"
        );
        state.identity = Some(identity);
        Ok(())
    }

    fn read(&self, gateway: &G, state: &mut DiskState) -> Result<(), DiskError> {
        state.spec.validate_target()?;
        let script = commands::list(&self.storage_tool, &state.spec);
        let output = {
            let session = gateway
                .open_session(&state.spec.node)
                .map_err(DiskError::gateway("read"))?;
            executor::execute(&session, &script).map_err(DiskError::execution("read"))?
        };

        let volume_name = state.spec.volume_name();
        match reconcile(parse_listing(&output), &volume_name)? {
            Reconciliation::Present(observed) => {
                state.spec.size = DiskSize::whole_gigabytes_of(observed.size_bytes);
                state.spec.format = observed.format;
            }
            Reconciliation::Absent => {
                warn!(
                    node = %state.spec.node,
                    storage = %state.spec.storage_pool,
                    volume = %volume_name,
                    "volume not found; clearing identity"
                );
                state.identity = None;
            }
        }
        Ok(())
    }

    fn delete(&self, gateway: &G, state: &mut DiskState) -> Result<(), DiskError> {
        state.spec.validate_target()?;
        let script = commands::free(&self.storage_tool, &state.spec);
        {
            let session = gateway
                .open_session(&state.spec.node)
                .map_err(DiskError::gateway("delete"))?;
            executor::execute(&session, &script).map_err(DiskError::execution("delete"))?;
        }

        info!(
            node = %state.spec.node,
            storage = %state.spec.storage_pool,
            volume = %state.spec.volume_name(),
            "freed volume"
        );
        state.identity = None;
        Ok(())
    }
}
