//! Error types for messenger-session.

use thiserror::Error;

use crate::identity::{ErrorDescriptor, Identity};
use crate::validation::ValidationError;

/// Main error type for session operations.
///
/// Misuse errors (`InvalidInput`, `OperationInProgress`, `AlreadyAuthenticated`)
/// are returned to the caller of an operation. Backend failures are never
/// returned; they are recorded as the session's last error instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A required field is missing or malformed.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// Another session operation has not resolved yet.
    #[error("another session operation is in progress")]
    OperationInProgress,

    /// The operation requires an unauthenticated session.
    #[error("already authenticated")]
    AlreadyAuthenticated,

    /// The identity backend rejected or failed the call.
    #[error("backend failure: {0}")]
    BackendFailure(ErrorDescriptor),

    /// The account was created but the follow-up login failed.
    ///
    /// The account now exists server-side; recovery is signing in, not
    /// registering again.
    #[error("account {} was created but sign-in failed: {cause}", .registered.id)]
    PartialSignUpFailure {
        registered: Identity,
        cause: ErrorDescriptor,
    },

    /// Internal lock was poisoned.
    #[error("internal lock poisoned")]
    LockPoisoned,
}

impl SessionError {
    /// Stable lowercase tag for logs and display.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::OperationInProgress => "operation_in_progress",
            Self::AlreadyAuthenticated => "already_authenticated",
            Self::BackendFailure(_) => "backend_failure",
            Self::PartialSignUpFailure { .. } => "partial_sign_up_failure",
            Self::LockPoisoned => "lock_poisoned",
        }
    }

    /// True for errors reported synchronously to the caller.
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::OperationInProgress | Self::AlreadyAuthenticated
        )
    }

    /// The backend descriptor behind this error, if any.
    pub fn descriptor(&self) -> Option<&ErrorDescriptor> {
        match self {
            Self::BackendFailure(cause) | Self::PartialSignUpFailure { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

/// Convenience Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_failure_display() {
        let err = SessionError::BackendFailure(ErrorDescriptor::new("network unreachable"));
        assert!(err.to_string().contains("backend failure"));
        assert!(err.to_string().contains("network unreachable"));
        assert!(!err.is_misuse());
    }

    #[test]
    fn test_partial_sign_up_display() {
        let err = SessionError::PartialSignUpFailure {
            registered: Identity::new("u1", "Name"),
            cause: ErrorDescriptor::with_code("ERR_AUTH_KEY", "bad key"),
        };
        let text = err.to_string();
        assert!(text.contains("u1"));
        assert!(text.contains("bad key"));
        assert_eq!(err.kind(), "partial_sign_up_failure");
        assert_eq!(err.descriptor().unwrap().message, "bad key");
    }

    #[test]
    fn test_validation_error_conversion() {
        let err: SessionError = ValidationError::EmptyField("identifier").into();
        assert!(matches!(err, SessionError::InvalidInput(_)));
        assert!(err.is_misuse());
        assert!(err.descriptor().is_none());
    }

    #[test]
    fn test_misuse_kinds() {
        assert!(SessionError::OperationInProgress.is_misuse());
        assert!(SessionError::AlreadyAuthenticated.is_misuse());
        assert!(!SessionError::LockPoisoned.is_misuse());
    }
}
