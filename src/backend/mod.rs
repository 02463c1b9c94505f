//! Identity backend contract.
//!
//! The session core never talks to the hosted chat service directly; every
//! call goes through an [`IdentityBackend`]. Failures are plain values
//! ([`ErrorDescriptor`]) rather than errors so the session manager can turn
//! them into state.
//!
//! ## Implementations
//!
//! - [`InMemoryBackend`]: process-local account directory, used by the
//!   console binary and the tests
//! - [`TimeoutBackend`]: decorator that bounds the latency of any backend

mod memory;
mod timeout;

use async_trait::async_trait;

use crate::identity::{ErrorDescriptor, Identity, NewIdentity};

pub use memory::{BackendCall, InMemoryBackend};
pub use timeout::{TimeoutBackend, DEFAULT_TIMEOUT};

/// Result of asking the backend for an existing session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// A valid session exists for this identity.
    Found(Identity),
    /// No session exists.
    NotFound,
    /// The backend could not answer.
    Failure(ErrorDescriptor),
}

/// Operations the session core consumes from the identity backend.
#[async_trait]
pub trait IdentityBackend: Send + Sync {
    /// Look up an existing session without user-supplied credentials.
    async fn restore(&self) -> RestoreOutcome;

    /// Log in with an identifier and secret.
    async fn authenticate(&self, identifier: &str, secret: &str)
        -> Result<Identity, ErrorDescriptor>;

    /// Register a new account.
    async fn create_identity(&self, record: &NewIdentity) -> Result<Identity, ErrorDescriptor>;

    /// Invalidate the current session server-side.
    async fn invalidate(&self) -> Result<(), ErrorDescriptor>;
}
