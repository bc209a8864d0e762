//! Typed volume parameters and the disk size representation.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Volume name used when none is configured.
pub const DEFAULT_NAME: &str = "persistent-1";

/// Volume format used when none is configured.
pub const DEFAULT_FORMAT: &str = "raw";

/// Volume size in gigabytes used when none is configured.
pub const DEFAULT_SIZE_GB: u64 = 10;

/// Formats accepted by `pvesm alloc`.
pub const SUPPORTED_FORMATS: [&str; 4] = ["raw", "qcow2", "subvol", "vmdk"];

/// Smallest guest identifier Proxmox VE hands out.
pub const MIN_OWNER_ID: u32 = 100;

/// Largest guest identifier Proxmox VE accepts.
pub const MAX_OWNER_ID: u32 = 999_999_999;

const BYTES_PER_KIB: u64 = 1024;
const BYTES_PER_MIB: u64 = 1024 * BYTES_PER_KIB;
/// Byte count for a single gibibyte.
pub const BYTES_PER_GIB: u64 = 1024 * BYTES_PER_MIB;
const BYTES_PER_TIB: u64 = 1024 * BYTES_PER_GIB;

/// Errors raised while validating volume parameters.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SpecError {
    /// Raised when a required field is empty or missing.
    #[error("missing or empty field: {field}")]
    Missing {
        /// Field that failed validation.
        field: String,
    },
    /// Raised when a field holds an unusable value.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Field that failed validation.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl SpecError {
    fn missing(field: &str) -> Self {
        Self::Missing {
            field: field.to_owned(),
        }
    }

    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.to_owned(),
            reason: reason.into(),
        }
    }
}

/// Volume size held canonically in bytes.
///
/// Sizes parsed from text are always whole kibibytes, which is the finest
/// granularity `pvesm alloc` accepts.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct DiskSize {
    bytes: u64,
}

impl DiskSize {
    /// Builds a size from whole gigabytes, returning `None` on overflow.
    #[must_use]
    pub const fn from_gigabytes(gigabytes: u64) -> Option<Self> {
        match gigabytes.checked_mul(BYTES_PER_GIB) {
            Some(bytes) => Some(Self { bytes }),
            None => None,
        }
    }

    /// Builds the largest whole-gigabyte size not exceeding `bytes`.
    #[must_use]
    pub const fn whole_gigabytes_of(bytes: u64) -> Self {
        Self {
            bytes: bytes.saturating_sub(bytes.rem_euclid(BYTES_PER_GIB)),
        }
    }

    /// Size in bytes.
    #[must_use]
    pub const fn bytes(self) -> u64 {
        self.bytes
    }

    /// Size in whole gigabytes, rounded down.
    #[must_use]
    pub const fn gigabytes(self) -> u64 {
        self.bytes.div_euclid(BYTES_PER_GIB)
    }

    /// Renders the size argument expected by `pvesm alloc`: the largest exact
    /// unit among `G` and `M`, or a bare kibibyte count.
    #[must_use]
    pub fn to_pvesm_arg(self) -> String {
        if self.bytes.rem_euclid(BYTES_PER_GIB) == 0 {
            format!("{}G", self.bytes.div_euclid(BYTES_PER_GIB))
        } else if self.bytes.rem_euclid(BYTES_PER_MIB) == 0 {
            format!("{}M", self.bytes.div_euclid(BYTES_PER_MIB))
        } else {
            self.bytes.div_euclid(BYTES_PER_KIB).to_string()
        }
    }
}

impl Default for DiskSize {
    fn default() -> Self {
        Self {
            bytes: DEFAULT_SIZE_GB * BYTES_PER_GIB,
        }
    }
}

impl fmt::Display for DiskSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_pvesm_arg())
    }
}

impl FromStr for DiskSize {
    type Err = SpecError;

    /// Parses integer gigabytes (`10`) or a unit-suffixed size (`512M`,
    /// `10G`, `1T`, `2048K`). Suffixes are case-insensitive.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let split = trimmed
            .find(|ch: char| !ch.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (digits, unit) = trimmed.split_at(split);
        if digits.is_empty() {
            return Err(SpecError::invalid(
                "size",
                format!("'{value}' does not start with a number"),
            ));
        }

        let multiplier = match unit.to_ascii_uppercase().as_str() {
            "" | "G" => BYTES_PER_GIB,
            "K" => BYTES_PER_KIB,
            "M" => BYTES_PER_MIB,
            "T" => BYTES_PER_TIB,
            other => {
                return Err(SpecError::invalid(
                    "size",
                    format!("unknown unit '{other}', expected K, M, G or T"),
                ));
            }
        };

        let amount: u64 = digits
            .parse()
            .map_err(|err| SpecError::invalid("size", format!("'{value}': {err}")))?;
        if amount == 0 {
            return Err(SpecError::invalid("size", "must be greater than zero"));
        }
        let bytes = amount
            .checked_mul(multiplier)
            .ok_or_else(|| SpecError::invalid("size", format!("'{value}' is too large")))?;
        Ok(Self { bytes })
    }
}

/// Parameters of one persistent volume. Every field is fixed once the volume
/// exists; a change means deleting and recreating it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VolumeSpec {
    /// Cluster node hosting the storage pool.
    pub node: String,
    /// Storage pool identifier on the node.
    pub storage_pool: String,
    /// Identifier of the guest that owns the volume. It must never belong to
    /// a real guest: removing that guest would delete the volume with it.
    pub owner_id: u32,
    /// Short volume name; the remote name is `vm-<owner_id>-<name>`.
    pub name: String,
    /// Requested size.
    pub size: DiskSize,
    /// Volume format (`raw`, `qcow2`, `subvol` or `vmdk`).
    pub format: String,
}

impl VolumeSpec {
    /// Starts a builder for a [`VolumeSpec`].
    #[must_use]
    pub fn builder() -> VolumeSpecBuilder {
        VolumeSpecBuilder::new()
    }

    /// Fully-qualified volume name on the storage pool.
    #[must_use]
    pub fn volume_name(&self) -> String {
        format!("vm-{}-{}", self.owner_id, self.name)
    }

    /// Validates every field.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError`] naming the first offending field.
    pub fn validate(&self) -> Result<(), SpecError> {
        self.validate_target()?;

        require(&self.format, "format")?;
        if !SUPPORTED_FORMATS.contains(&self.format.as_str()) {
            return Err(SpecError::invalid(
                "format",
                format!(
                    "'{}' is not one of {}",
                    self.format,
                    SUPPORTED_FORMATS.join(", ")
                ),
            ));
        }
        Ok(())
    }

    /// Validates the fields that address an existing volume: node, storage
    /// pool, owner, and name. Size and format only matter when allocating.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError`] naming the first offending field.
    pub fn validate_target(&self) -> Result<(), SpecError> {
        require(&self.node, "node")?;
        if self.node.chars().any(|ch| ch.is_whitespace() || ch.is_control()) {
            return Err(SpecError::invalid(
                "node",
                "must not contain whitespace or control characters",
            ));
        }

        require(&self.storage_pool, "storage_pool")?;
        require_identifier(&self.storage_pool, "storage_pool")?;

        if !(MIN_OWNER_ID..=MAX_OWNER_ID).contains(&self.owner_id) {
            return Err(SpecError::invalid(
                "owner_id",
                format!("must be between {MIN_OWNER_ID} and {MAX_OWNER_ID}"),
            ));
        }

        require(&self.name, "name")?;
        require_identifier(&self.name, "name")
    }
}

fn require(value: &str, field: &str) -> Result<(), SpecError> {
    if value.trim().is_empty() {
        return Err(SpecError::missing(field));
    }
    Ok(())
}

fn require_identifier(value: &str, field: &str) -> Result<(), SpecError> {
    let starts_alphanumeric = value
        .chars()
        .next()
        .is_some_and(|ch| ch.is_ascii_alphanumeric());
    let valid_chars = value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-'));
    if starts_alphanumeric && valid_chars {
        return Ok(());
    }
    Err(SpecError::invalid(
        field,
        format!("'{value}' must start with a letter or digit and contain only letters, digits, '.', '_' or '-'"),
    ))
}

/// Builder for [`VolumeSpec`] that applies defaults and validates on build.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VolumeSpecBuilder {
    node: String,
    storage_pool: String,
    owner_id: u32,
    name: Option<String>,
    size: Option<DiskSize>,
    format: Option<String>,
}

impl VolumeSpecBuilder {
    /// Creates an empty builder; node, storage pool, and owner must be set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the node name.
    #[must_use]
    pub fn node(mut self, value: impl Into<String>) -> Self {
        self.node = value.into();
        self
    }

    /// Sets the storage pool.
    #[must_use]
    pub fn storage_pool(mut self, value: impl Into<String>) -> Self {
        self.storage_pool = value.into();
        self
    }

    /// Sets the owning guest identifier.
    #[must_use]
    pub const fn owner_id(mut self, value: u32) -> Self {
        self.owner_id = value;
        self
    }

    /// Overrides the default volume name.
    #[must_use]
    pub fn name(mut self, value: impl Into<String>) -> Self {
        self.name = Some(value.into());
        self
    }

    /// Overrides the default size.
    #[must_use]
    pub const fn size(mut self, value: DiskSize) -> Self {
        self.size = Some(value);
        self
    }

    /// Overrides the default format.
    #[must_use]
    pub fn format(mut self, value: impl Into<String>) -> Self {
        self.format = Some(value.into());
        self
    }

    /// Builds and validates the [`VolumeSpec`], trimming string inputs.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError`] when any field is missing or invalid.
    pub fn build(self) -> Result<VolumeSpec, SpecError> {
        let spec = VolumeSpec {
            node: self.node.trim().to_owned(),
            storage_pool: self.storage_pool.trim().to_owned(),
            owner_id: self.owner_id,
            name: self
                .name
                .map_or_else(|| DEFAULT_NAME.to_owned(), |name| name.trim().to_owned()),
            size: self.size.unwrap_or_default(),
            format: self
                .format
                .map_or_else(|| DEFAULT_FORMAT.to_owned(), |format| format.trim().to_owned()),
        };
        spec.validate()?;
        Ok(spec)
    }
}
