//! Error types for the persistent disk resource.

use thiserror::Error;

use super::listing::ListingError;
use super::spec::SpecError;
use crate::executor::ExecutionError;
use crate::session::GatewayError;

/// Errors raised by persistent disk operations.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum DiskError {
    /// Raised when the volume parameters are invalid.
    #[error("invalid volume parameters: {0}")]
    Spec(#[from] SpecError),
    /// Raised when a session cannot be opened or the remote script fails.
    #[error("{operation} failed: {source}")]
    Execution {
        /// Operation that was running (`create`, `read`, `delete`).
        operation: &'static str,
        /// Underlying execution failure.
        source: ExecutionError,
    },
    /// Raised when the listing reports an unreadable size for the volume.
    #[error("failed to read volume state: {0}")]
    Listing(#[from] ListingError),
}

impl DiskError {
    pub(super) fn execution(operation: &'static str) -> impl FnOnce(ExecutionError) -> Self {
        move |source| Self::Execution { operation, source }
    }

    pub(super) fn gateway(operation: &'static str) -> impl FnOnce(GatewayError) -> Self {
        move |source| Self::Execution {
            operation,
            source: ExecutionError::Gateway(source),
        }
    }

    /// Returns the raw remote output when a script ran and failed.
    #[must_use]
    pub fn remote_output(&self) -> Option<&str> {
        match self {
            Self::Execution {
                source: ExecutionError::CommandFailure { output, .. },
                ..
            } => Some(output),
            _ => None,
        }
    }
}
