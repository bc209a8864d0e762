//! Matches listing records against the expected volume.

use super::listing::{ListingError, VolumeRecord};
use super::spec::BYTES_PER_GIB;

/// Attributes observed for a volume present on the storage pool.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ObservedVolume {
    /// Format reported by the listing.
    pub format: String,
    /// Size reported by the listing, in bytes.
    pub size_bytes: u64,
}

impl ObservedVolume {
    /// Size in whole gigabytes, rounded down: 10 GiB plus one byte reports
    /// as 10.
    #[must_use]
    pub const fn size_gigabytes(&self) -> u64 {
        self.size_bytes.div_euclid(BYTES_PER_GIB)
    }
}

/// Outcome of comparing a listing with the expected volume.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Reconciliation {
    /// The volume exists with the observed attributes.
    Present(ObservedVolume),
    /// No record carries the expected name.
    Absent,
}

/// Finds the first record named exactly `expected`.
///
/// Only the matching record's size is converted, so malformed rows belonging
/// to other volumes never fail the lookup.
///
/// # Errors
///
/// Returns [`ListingError::InvalidSize`] when the matching record's size is
/// not a decimal integer.
pub fn reconcile<'a>(
    records: impl IntoIterator<Item = VolumeRecord<'a>>,
    expected: &str,
) -> Result<Reconciliation, ListingError> {
    let Some(record) = records.into_iter().find(|record| record.name == expected) else {
        return Ok(Reconciliation::Absent);
    };
    Ok(Reconciliation::Present(ObservedVolume {
        format: record.format.to_owned(),
        size_bytes: record.size_bytes()?,
    }))
}
