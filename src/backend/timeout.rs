//! Latency-bounding backend decorator.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::warn;

use super::{IdentityBackend, RestoreOutcome};
use crate::identity::{ErrorDescriptor, Identity, NewIdentity};

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Wraps a backend so that no call can stay pending longer than `limit`.
///
/// An elapsed call resolves as a failure with code
/// [`ErrorDescriptor::TIMEOUT`], which the session manager treats like any
/// other backend failure.
pub struct TimeoutBackend<B> {
    inner: B,
    limit: Duration,
}

impl<B> TimeoutBackend<B> {
    pub fn new(inner: B, limit: Duration) -> Self {
        Self { inner, limit }
    }

    /// Get the configured per-call limit.
    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Access the wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    fn elapsed(&self, call: &'static str) -> ErrorDescriptor {
        warn!(call, limit_ms = self.limit.as_millis() as u64, "identity backend call timed out");
        ErrorDescriptor::with_code(
            ErrorDescriptor::TIMEOUT,
            format!("{call} did not complete within {:?}", self.limit),
        )
    }
}

#[async_trait]
impl<B: IdentityBackend> IdentityBackend for TimeoutBackend<B> {
    async fn restore(&self) -> RestoreOutcome {
        match timeout(self.limit, self.inner.restore()).await {
            Ok(outcome) => outcome,
            Err(_) => RestoreOutcome::Failure(self.elapsed("restore")),
        }
    }

    async fn authenticate(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<Identity, ErrorDescriptor> {
        timeout(self.limit, self.inner.authenticate(identifier, secret))
            .await
            .unwrap_or_else(|_| Err(self.elapsed("authenticate")))
    }

    async fn create_identity(&self, record: &NewIdentity) -> Result<Identity, ErrorDescriptor> {
        timeout(self.limit, self.inner.create_identity(record))
            .await
            .unwrap_or_else(|_| Err(self.elapsed("create_identity")))
    }

    async fn invalidate(&self) -> Result<(), ErrorDescriptor> {
        timeout(self.limit, self.inner.invalidate())
            .await
            .unwrap_or_else(|_| Err(self.elapsed("invalidate")))
    }
}
