//! Session state record.

use std::fmt;

use crate::error::SessionError;
use crate::identity::Identity;

/// The asynchronous operations a session manager performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Restore,
    SignIn,
    SignUp,
    SignOut,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Restore => "restore",
            Self::SignIn => "sign_in",
            Self::SignUp => "sign_up",
            Self::SignOut => "sign_out",
        })
    }
}

/// Coarse lifecycle phase derived from a [`SessionState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Startup restore has not resolved yet.
    Init,
    Unauthenticated,
    Authenticated,
}

/// Snapshot of "who is logged in".
///
/// Only the session manager's transition logic produces new values; every
/// other holder sees a read-only copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub(crate) identity: Option<Identity>,
    pub(crate) is_authenticated: bool,
    pub(crate) last_error: Option<SessionError>,
    pub(crate) is_busy: bool,
    pub(crate) in_flight: Option<Operation>,
    pub(crate) restored: bool,
    pub(crate) registered: Option<Identity>,
}

impl SessionState {
    /// The process-start state: restore pending.
    pub fn initial() -> Self {
        Self {
            identity: None,
            is_authenticated: false,
            last_error: None,
            is_busy: true,
            in_flight: None,
            restored: false,
            registered: None,
        }
    }

    /// The logged-in identity, present iff authenticated.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    /// Last backend failure, shown on the sign-in and sign-up screens.
    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    /// True while restore is pending or an operation is in flight.
    pub fn is_busy(&self) -> bool {
        self.is_busy
    }

    /// The operation currently awaiting the backend, if any.
    pub fn in_flight(&self) -> Option<Operation> {
        self.in_flight
    }

    /// True once a restore has resolved at least once.
    pub fn is_restored(&self) -> bool {
        self.restored
    }

    /// Account created by a sign-up whose login step failed.
    pub fn registered_identity(&self) -> Option<&Identity> {
        self.registered.as_ref()
    }

    pub fn phase(&self) -> Phase {
        if !self.restored {
            Phase::Init
        } else if self.is_authenticated {
            Phase::Authenticated
        } else {
            Phase::Unauthenticated
        }
    }

    /// Check the structural invariants of the record.
    ///
    /// - identity is present iff authenticated
    /// - no error is kept while authenticated
    /// - an in-flight operation implies busy
    /// - once restored, busy implies an in-flight operation
    /// - a pending registration is dropped once authenticated
    pub fn invariants_hold(&self) -> bool {
        self.identity.is_some() == self.is_authenticated
            && !(self.is_authenticated && self.last_error.is_some())
            && !(self.in_flight.is_some() && !self.is_busy)
            && !(self.restored && self.is_busy && self.in_flight.is_none())
            && !(self.is_authenticated && self.registered.is_some())
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = SessionState::initial();
        assert!(!state.is_authenticated());
        assert!(state.is_busy());
        assert!(state.identity().is_none());
        assert!(state.last_error().is_none());
        assert!(state.in_flight().is_none());
        assert_eq!(state.phase(), Phase::Init);
        assert!(state.invariants_hold());
    }

    #[test]
    fn test_default_is_initial() {
        assert_eq!(SessionState::default(), SessionState::initial());
    }

    #[test]
    fn test_invariant_identity_without_auth() {
        let mut state = SessionState::initial();
        state.restored = true;
        state.is_busy = false;
        state.identity = Some(Identity::new("alice", "Alice"));
        assert!(!state.invariants_hold());

        state.is_authenticated = true;
        assert!(state.invariants_hold());
        assert_eq!(state.phase(), Phase::Authenticated);
    }

    #[test]
    fn test_invariant_error_while_authenticated() {
        let mut state = SessionState::initial();
        state.restored = true;
        state.is_busy = false;
        state.is_authenticated = true;
        state.identity = Some(Identity::new("alice", "Alice"));
        state.last_error = Some(SessionError::OperationInProgress);
        assert!(!state.invariants_hold());
    }

    #[test]
    fn test_invariant_busy_without_operation_after_restore() {
        let mut state = SessionState::initial();
        state.restored = true;
        assert!(!state.invariants_hold());

        state.in_flight = Some(Operation::SignIn);
        assert!(state.invariants_hold());
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::Restore.to_string(), "restore");
        assert_eq!(Operation::SignOut.to_string(), "sign_out");
    }
}
