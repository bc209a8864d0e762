//! External identifier assigned to a created volume.
//!
//! The identifier follows `<node>_<storagePool>_<ownerID>-<name>`. It is only
//! ever composed, never parsed: reads and deletes derive their target from the
//! volume parameters.

use std::fmt;

use super::spec::VolumeSpec;

/// Opaque identifier recorded once a volume has been created.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct VolumeIdentity(String);

impl VolumeIdentity {
    /// Composes the identifier for `spec`.
    ///
    /// `_` separates the node, storage pool, and owner, so `_` (and the escape
    /// character `%`) inside the node or storage pool are percent-escaped.
    /// Names made of ordinary characters render exactly as the plain scheme.
    #[must_use]
    pub fn compose(spec: &VolumeSpec) -> Self {
        Self(format!(
            "{}_{}_{}-{}",
            escape_component(&spec.node),
            escape_component(&spec.storage_pool),
            spec.owner_id,
            spec.name
        ))
    }

    /// Wraps an identifier recorded by an earlier run.
    #[must_use]
    pub fn from_recorded(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VolumeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn escape_component(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '%' => escaped.push_str("%25"),
            '_' => escaped.push_str("%5F"),
            other => escaped.push(other),
        }
    }
    escaped
}
