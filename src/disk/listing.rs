//! Parser for the tabular output of `pvesm list`.
//!
//! The listing is the only channel for discovering volume state, so the
//! parser is coupled to the tool's column layout:
//!
//! ```text
//! Volid                 Format  Type     Size         VMID
//! local:vm-100-disk0    raw     images   10737418240  100
//! ```
//!
//! A change in column order or count upstream does not raise an error here; it
//! shows up as records that no longer match, which callers treat as "volume
//! absent". That coupling is a compatibility constraint on the supported tool
//! versions.

use std::iter::Skip;
use std::str::Lines;

use thiserror::Error;

/// Errors raised while converting listing fields.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ListingError {
    /// Raised when the size column of a record is not a decimal integer.
    #[error("invalid size '{value}' for volume {volume}: {message}")]
    InvalidSize {
        /// Volume whose size failed to parse.
        volume: String,
        /// Raw size column.
        value: String,
        /// Parser error message.
        message: String,
    },
}

/// One volume row borrowed from a listing.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct VolumeRecord<'a> {
    /// Volume name with the storage prefix removed.
    pub name: &'a str,
    /// Format column.
    pub format: &'a str,
    size: &'a str,
}

impl VolumeRecord<'_> {
    /// Raw size column as printed by the tool.
    #[must_use]
    pub const fn size_text(&self) -> &str {
        self.size
    }

    /// Size column converted to bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::InvalidSize`] when the column is not a decimal
    /// integer.
    pub fn size_bytes(&self) -> Result<u64, ListingError> {
        self.size
            .parse()
            .map_err(|err: std::num::ParseIntError| ListingError::InvalidSize {
                volume: self.name.to_owned(),
                value: self.size.to_owned(),
                message: err.to_string(),
            })
    }
}

/// Iterator over the records of a single listing.
#[derive(Clone, Debug)]
pub struct VolumeListing<'a> {
    lines: Skip<Lines<'a>>,
}

impl<'a> Iterator for VolumeListing<'a> {
    type Item = VolumeRecord<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.lines.by_ref().find_map(parse_line)
    }
}

/// Parses `pvesm list` output into volume records.
///
/// The first line is the table header and is always discarded. Lines with
/// fewer than four columns, or whose first column lacks a `storage:` prefix,
/// are skipped.
#[must_use]
pub fn parse_listing(output: &str) -> VolumeListing<'_> {
    VolumeListing {
        lines: output.lines().skip(1),
    }
}

fn parse_line(line: &str) -> Option<VolumeRecord<'_>> {
    let mut fields = line.split_whitespace();
    let volid = fields.next()?;
    let format = fields.next()?;
    let _content = fields.next()?;
    let size = fields.next()?;
    let (_storage, name) = volid.split_once(':')?;
    Some(VolumeRecord { name, format, size })
}
