//! Lifecycle capability shared by managed resource kinds.
//!
//! Resources expose create, read, and delete only; a change to any parameter
//! is applied by the caller as delete followed by create. Every operation
//! receives the session gateway explicitly, so nothing is looked up from
//! ambient state while it runs.

use crate::session::SessionGateway;

/// Create/read/delete operations for one kind of remote resource.
pub trait Resource<G: SessionGateway> {
    /// Per-instance state: configured parameters plus the recorded identity.
    type State;
    /// Error type returned by the operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Creates the remote resource and records its identity in `state`.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] when the remote side rejects the request.
    fn create(&self, gateway: &G, state: &mut Self::State) -> Result<(), Self::Error>;

    /// Refreshes `state` from the remote side. A resource that no longer
    /// exists clears its identity instead of failing.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] when the remote state cannot be read.
    fn read(&self, gateway: &G, state: &mut Self::State) -> Result<(), Self::Error>;

    /// Removes the remote resource and clears its identity.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] when the remote side rejects the request.
    fn delete(&self, gateway: &G, state: &mut Self::State) -> Result<(), Self::Error>;
}
