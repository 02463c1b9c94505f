//! Pure session transition table.
//!
//! ```text
//! INIT(busy)      --restore found-------> AUTHENTICATED
//! INIT(busy)      --restore none--------> UNAUTHENTICATED
//! INIT(busy)      --restore failure-----> UNAUTHENTICATED(error)
//! UNAUTHENTICATED --sign-in success-----> AUTHENTICATED
//! UNAUTHENTICATED --sign-in failure-----> UNAUTHENTICATED(error)
//! UNAUTHENTICATED --sign-up success-----> AUTHENTICATED
//! UNAUTHENTICATED --sign-up partial-----> UNAUTHENTICATED(error)
//! AUTHENTICATED   --sign-out------------> UNAUTHENTICATED
//! ```
//!
//! [`admit`] decides whether an operation may start; [`apply_transition`]
//! computes the next state for an event. Neither touches the backend.

use super::state::{Operation, SessionState};
use crate::backend::RestoreOutcome;
use crate::error::{Result, SessionError};
use crate::identity::{ErrorDescriptor, Identity};

/// How a sign-up resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// Account created and logged in.
    Authenticated(Identity),
    /// Account creation failed; nothing exists server-side.
    CreateFailed(ErrorDescriptor),
    /// Account created but the login step failed.
    LoginFailed {
        registered: Identity,
        cause: ErrorDescriptor,
    },
}

/// Events that move the session from one state to the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// An admitted operation is about to await the backend.
    OperationStarted(Operation),
    RestoreResolved(RestoreOutcome),
    SignInResolved(std::result::Result<Identity, ErrorDescriptor>),
    SignUpResolved(SignUpOutcome),
    /// Local sign-out; the backend outcome does not matter.
    SignOutRequested,
}

/// Check whether `op` may start from `state`.
pub fn admit(state: &SessionState, op: Operation) -> Result<()> {
    if state.in_flight.is_some() {
        return Err(SessionError::OperationInProgress);
    }

    match op {
        Operation::Restore if state.is_authenticated => Err(SessionError::AlreadyAuthenticated),
        Operation::Restore => Ok(()),
        // Everything but restore waits for startup to settle.
        _ if !state.restored => Err(SessionError::OperationInProgress),
        Operation::SignIn | Operation::SignUp if state.is_authenticated => {
            Err(SessionError::AlreadyAuthenticated)
        }
        Operation::SignIn | Operation::SignUp | Operation::SignOut => Ok(()),
    }
}

/// Compute the state that follows `event`.
pub fn apply_transition(state: &SessionState, event: SessionEvent) -> SessionState {
    match event {
        SessionEvent::OperationStarted(op) => SessionState {
            is_busy: true,
            in_flight: Some(op),
            ..state.clone()
        },
        SessionEvent::RestoreResolved(RestoreOutcome::Found(identity)) => authenticated(identity),
        SessionEvent::RestoreResolved(RestoreOutcome::NotFound) => SessionState {
            last_error: None,
            ..unauthenticated(state)
        },
        SessionEvent::RestoreResolved(RestoreOutcome::Failure(cause)) => SessionState {
            last_error: Some(SessionError::BackendFailure(cause)),
            ..unauthenticated(state)
        },
        SessionEvent::SignInResolved(Ok(identity)) => authenticated(identity),
        SessionEvent::SignInResolved(Err(cause)) => SessionState {
            last_error: Some(SessionError::BackendFailure(cause)),
            ..unauthenticated(state)
        },
        SessionEvent::SignUpResolved(SignUpOutcome::Authenticated(identity)) => {
            authenticated(identity)
        }
        SessionEvent::SignUpResolved(SignUpOutcome::CreateFailed(cause)) => SessionState {
            last_error: Some(SessionError::BackendFailure(cause)),
            ..unauthenticated(state)
        },
        SessionEvent::SignUpResolved(SignUpOutcome::LoginFailed { registered, cause }) => {
            SessionState {
                last_error: Some(SessionError::PartialSignUpFailure {
                    registered: registered.clone(),
                    cause,
                }),
                registered: Some(registered),
                ..unauthenticated(state)
            }
        }
        SessionEvent::SignOutRequested if state.is_authenticated => SessionState {
            last_error: None,
            registered: None,
            ..unauthenticated(state)
        },
        // Signed out already: drop the error, keep a pending registration.
        SessionEvent::SignOutRequested => SessionState {
            last_error: None,
            ..unauthenticated(state)
        },
    }
}

fn authenticated(identity: Identity) -> SessionState {
    SessionState {
        identity: Some(identity),
        is_authenticated: true,
        last_error: None,
        is_busy: false,
        in_flight: None,
        restored: true,
        registered: None,
    }
}

/// Settled, unauthenticated; keeps the previous error and registration.
fn unauthenticated(state: &SessionState) -> SessionState {
    SessionState {
        identity: None,
        is_authenticated: false,
        last_error: state.last_error.clone(),
        is_busy: false,
        in_flight: None,
        restored: true,
        registered: state.registered.clone(),
    }
}
