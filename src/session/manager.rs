//! Session state manager.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::observer::{ObserverId, ObserverRegistry};
use super::state::{Operation, SessionState};
use super::transition::{admit, apply_transition, SessionEvent, SignUpOutcome};
use crate::avatar::AvatarConfig;
use crate::backend::{IdentityBackend, RestoreOutcome};
use crate::identity::{ErrorDescriptor, SignUpProfile};
use crate::validation::CredentialValidator;
use crate::Result;

/// Owner of the session state and the only writer to it.
///
/// The four operations are mutually exclusive: an operation is admitted and
/// marked busy synchronously, before its first backend call, and resolved
/// exactly once afterwards. Backend failures never surface as `Err`; they
/// become the state's last error. `Err` is reserved for misuse
/// (invalid input, overlapping operations, re-authentication).
///
/// Dropping an operation's future before it finishes still resolves it: the
/// operation fails with an `ERR_CANCELLED` error (sign-out completes locally)
/// and the manager accepts new operations straight away.
pub struct SessionManager {
    backend: Arc<dyn IdentityBackend>,
    state: watch::Sender<SessionState>,
    observers: ObserverRegistry,
    validator: CredentialValidator,
    avatar: AvatarConfig,
}

impl SessionManager {
    /// Create a manager in the restore-pending state.
    pub fn new(backend: Arc<dyn IdentityBackend>) -> Self {
        Self::with_options(backend, CredentialValidator::default(), AvatarConfig::default())
    }

    /// Create a manager with explicit validation and avatar settings.
    pub fn with_options(
        backend: Arc<dyn IdentityBackend>,
        validator: CredentialValidator,
        avatar: AvatarConfig,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::initial());
        Self {
            backend,
            state,
            observers: ObserverRegistry::default(),
            validator,
            avatar,
        }
    }

    /// Read-only copy of the current state.
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every committed state.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Register a callback fired synchronously after every state change.
    pub fn add_observer<F>(&self, callback: F) -> Result<ObserverId>
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        self.observers.add(callback)
    }

    /// Remove a callback. Returns false if it was not registered.
    pub fn remove_observer(&self, id: ObserverId) -> Result<bool> {
        self.observers.remove(id)
    }

    /// Recover an existing session without user credentials.
    ///
    /// A backend failure leaves the session unauthenticated with the error
    /// recorded; startup never fails because of it.
    pub async fn restore_session(&self) -> Result<()> {
        let pending = self.begin(Operation::Restore)?;

        let outcome = self.backend.restore().await;
        match &outcome {
            RestoreOutcome::Found(identity) => info!(user = %identity.id, "session restored"),
            RestoreOutcome::NotFound => info!("no session to restore"),
            RestoreOutcome::Failure(cause) => warn!(error = %cause, "session restore failed"),
        }

        pending.resolve(SessionEvent::RestoreResolved(outcome));
        Ok(())
    }

    /// Log in with an identifier and secret.
    pub async fn sign_in(&self, identifier: &str, secret: &str) -> Result<()> {
        let identifier = self.validator.validate_identifier(identifier)?;
        let pending = self.begin(Operation::SignIn)?;

        let result = self.backend.authenticate(identifier, secret).await;
        match &result {
            Ok(identity) => info!(user = %identity.id, "signed in"),
            Err(cause) => warn!(user = identifier, error = %cause, "sign-in failed"),
        }

        pending.resolve(SessionEvent::SignInResolved(result));
        Ok(())
    }

    /// Register an account and log into it.
    ///
    /// If account creation succeeds but the login does not, the session stays
    /// unauthenticated with a partial sign-up error. A later sign-up with the
    /// same identifier skips creation and only retries the login.
    pub async fn sign_up(&self, profile: &SignUpProfile, secret: &str) -> Result<()> {
        let record = self.validator.validate_profile(profile, &self.avatar)?;
        let mut pending = self.begin(Operation::SignUp)?;

        let already_registered = self
            .state
            .borrow()
            .registered
            .clone()
            .filter(|identity| identity.id == record.id);

        let registered = match already_registered {
            Some(identity) => {
                info!(user = %identity.id, "account already registered, retrying login only");
                identity
            }
            None => match self.backend.create_identity(&record).await {
                Ok(identity) => {
                    info!(user = %identity.id, "account created");
                    identity
                }
                Err(cause) => {
                    warn!(user = %record.id, error = %cause, "account creation failed");
                    pending.resolve(SessionEvent::SignUpResolved(SignUpOutcome::CreateFailed(cause)));
                    return Ok(());
                }
            },
        };

        // From here on the account exists, so an abandoned login is a partial sign-up.
        pending.on_cancel(SessionEvent::SignUpResolved(SignUpOutcome::LoginFailed {
            registered: registered.clone(),
            cause: cancelled(Operation::SignUp),
        }));

        let outcome = match self.backend.authenticate(&registered.id, secret).await {
            Ok(identity) => {
                info!(user = %identity.id, "signed in after sign-up");
                SignUpOutcome::Authenticated(identity)
            }
            Err(cause) => {
                warn!(user = %registered.id, error = %cause, "login after sign-up failed");
                SignUpOutcome::LoginFailed { registered, cause }
            }
        };

        pending.resolve(SessionEvent::SignUpResolved(outcome));
        Ok(())
    }

    /// Sign out locally, invalidating the backend session on a best-effort basis.
    ///
    /// Always ends signed out with no error. Signing out while signed out
    /// does not call the backend.
    pub async fn sign_out(&self) -> Result<()> {
        let pending = self.begin(Operation::SignOut)?;

        let was_authenticated = self.state.borrow().is_authenticated;
        if was_authenticated {
            if let Err(cause) = self.backend.invalidate().await {
                warn!(error = %cause, "backend session invalidation failed, signing out locally");
            }
            info!("signed out");
        } else {
            debug!("sign-out requested while signed out");
        }

        pending.resolve(SessionEvent::SignOutRequested);
        Ok(())
    }

    /// Admit `op` and mark the session busy, atomically.
    fn begin(&self, op: Operation) -> Result<Pending<'_>> {
        let mut verdict = Ok(());
        self.state.send_if_modified(|state| match admit(state, op) {
            Ok(()) => {
                *state = apply_transition(state, SessionEvent::OperationStarted(op));
                true
            }
            Err(e) => {
                verdict = Err(e);
                false
            }
        });

        if let Err(e) = verdict {
            debug!(operation = %op, error = %e, "session operation rejected");
            return Err(e);
        }

        debug!(operation = %op, "session operation started");
        self.observers.notify(&self.snapshot());
        Ok(Pending {
            manager: self,
            op,
            on_cancel: Some(cancelled_event(op)),
        })
    }

    fn commit(&self, event: SessionEvent) {
        self.state
            .send_modify(|state| *state = apply_transition(state, event));

        let state = self.snapshot();
        debug_assert!(state.invariants_hold(), "invariants broken: {state:?}");
        debug!(
            phase = ?state.phase(),
            authenticated = state.is_authenticated(),
            error = state.last_error().map(|e| e.kind()),
            "session state committed"
        );
        self.observers.notify(&state);
    }
}

/// An admitted operation that has not resolved yet.
///
/// Dropped unresolved, it commits its cancellation event instead.
struct Pending<'a> {
    manager: &'a SessionManager,
    op: Operation,
    on_cancel: Option<SessionEvent>,
}

impl Pending<'_> {
    /// Replace the event committed if the operation is abandoned.
    fn on_cancel(&mut self, event: SessionEvent) {
        self.on_cancel = Some(event);
    }

    fn resolve(mut self, event: SessionEvent) {
        self.on_cancel = None;
        self.manager.commit(event);
    }
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        if let Some(event) = self.on_cancel.take() {
            warn!(operation = %self.op, "session operation dropped before resolving");
            self.manager.commit(event);
        }
    }
}

fn cancelled(op: Operation) -> ErrorDescriptor {
    ErrorDescriptor::with_code(ErrorDescriptor::CANCELLED, format!("{op} was cancelled"))
}

fn cancelled_event(op: Operation) -> SessionEvent {
    match op {
        Operation::Restore => SessionEvent::RestoreResolved(RestoreOutcome::Failure(cancelled(op))),
        Operation::SignIn => SessionEvent::SignInResolved(Err(cancelled(op))),
        Operation::SignUp => SessionEvent::SignUpResolved(SignUpOutcome::CreateFailed(cancelled(op))),
        Operation::SignOut => SessionEvent::SignOutRequested,
    }
}
