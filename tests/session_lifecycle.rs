//! Session lifecycle integration tests.
//!
//! These tests drive the session manager through the public API against
//! in-memory and scripted backends, and check the routing decision after
//! every step.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use messenger_session::backend::BackendCall;
use messenger_session::{
    select_screen, ErrorDescriptor, Identity, IdentityBackend, InMemoryBackend, NewIdentity,
    RestoreOutcome, Screen, SessionError, SessionManager, SessionState, SignUpProfile, ViewRouter,
};
use tokio::sync::Notify;

const KEY: &str = "app-key";

fn alice() -> Identity {
    Identity::new("alice", "Alice")
}

fn manager_for(backend: &Arc<InMemoryBackend>) -> SessionManager {
    SessionManager::new(Arc::clone(backend) as Arc<dyn IdentityBackend>)
}

/// Records every state the manager commits and checks the invariants.
fn track(manager: &SessionManager) -> Arc<std::sync::Mutex<Vec<SessionState>>> {
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    manager
        .add_observer(move |state| {
            assert!(state.invariants_hold(), "invariants broken: {state:?}");
            assert_eq!(
                state.identity().is_some(),
                state.is_authenticated(),
                "identity must be present iff authenticated"
            );
            sink.lock().unwrap().push(state.clone());
        })
        .unwrap();
    seen
}

/// Backend whose calls wait until released, for overlap tests.
struct GatedBackend {
    gate: Notify,
    entered: Notify,
    calls: AtomicUsize,
}

impl GatedBackend {
    fn new() -> Self {
        Self {
            gate: Notify::new(),
            entered: Notify::new(),
            calls: AtomicUsize::new(0),
        }
    }

    async fn wait(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.gate.notified().await;
    }
}

#[async_trait]
impl IdentityBackend for GatedBackend {
    async fn restore(&self) -> RestoreOutcome {
        self.wait().await;
        RestoreOutcome::NotFound
    }

    async fn authenticate(&self, identifier: &str, _: &str) -> Result<Identity, ErrorDescriptor> {
        self.wait().await;
        Ok(Identity::new(identifier, identifier))
    }

    async fn create_identity(&self, record: &NewIdentity) -> Result<Identity, ErrorDescriptor> {
        self.wait().await;
        Ok(record.clone().into())
    }

    async fn invalidate(&self) -> Result<(), ErrorDescriptor> {
        self.wait().await;
        Ok(())
    }
}

// ============================================================================
// End-to-end Scenario
// ============================================================================

#[tokio::test]
async fn test_restore_sign_in_sign_out_routes() {
    let backend = Arc::new(InMemoryBackend::new(KEY).with_user(alice()));
    let manager = manager_for(&backend);
    let seen = track(&manager);
    let router = ViewRouter::new(&manager);

    assert_eq!(router.current(), Screen::Pending);

    manager.restore_session().await.unwrap();
    assert_eq!(router.current(), Screen::Unauthenticated);
    assert!(manager.snapshot().last_error().is_none());

    manager.sign_in("alice", KEY).await.unwrap();
    assert_eq!(router.current(), Screen::Authenticated);
    assert_eq!(manager.snapshot().identity(), Some(&alice()));

    manager.sign_out().await.unwrap();
    assert_eq!(router.current(), Screen::Unauthenticated);
    let state = manager.snapshot();
    assert!(state.identity().is_none());
    assert!(state.last_error().is_none());
    assert!(backend.current_session().is_none());

    // Every operation is one busy notification plus one resolution.
    assert_eq!(seen.lock().unwrap().len(), 6);
}

#[tokio::test]
async fn test_router_change_stream() {
    let backend = Arc::new(InMemoryBackend::new(KEY).with_user(alice()));
    let manager = Arc::new(manager_for(&backend));
    let mut router = ViewRouter::new(&manager);

    let driver = Arc::clone(&manager);
    let task = tokio::spawn(async move {
        driver.restore_session().await.unwrap();
        driver.sign_in("alice", KEY).await.unwrap();
    });
    task.await.unwrap();

    // Values coalesce; the latest decision is never stale.
    assert_eq!(router.changed().await, Some(Screen::Authenticated));
}

// ============================================================================
// Restore
// ============================================================================

#[tokio::test]
async fn test_restore_failure_does_not_block_startup() {
    let backend = Arc::new(InMemoryBackend::new(KEY).with_user(alice()));
    backend.fail_next(BackendCall::Restore, ErrorDescriptor::new("dns failure"));
    let manager = manager_for(&backend);

    manager.restore_session().await.unwrap();
    let state = manager.snapshot();
    assert_eq!(select_screen(&state), Screen::Unauthenticated);
    assert!(!state.is_busy());
    assert!(matches!(
        state.last_error(),
        Some(SessionError::BackendFailure(d)) if d.message == "dns failure"
    ));

    // Sign-out always leaves a clean slate, even from a failed restore.
    manager.sign_out().await.unwrap();
    let state = manager.snapshot();
    assert!(state.last_error().is_none());
    assert_eq!(select_screen(&state), Screen::Unauthenticated);
    assert_eq!(backend.call_count(BackendCall::Invalidate), 0);

    manager.sign_in("alice", KEY).await.unwrap();
    assert!(manager.snapshot().is_authenticated());
}

// ============================================================================
// Overlap Guard
// ============================================================================

#[tokio::test]
async fn test_sign_in_while_busy_is_rejected() {
    let backend = Arc::new(GatedBackend::new());
    let manager = Arc::new(SessionManager::new(
        Arc::clone(&backend) as Arc<dyn IdentityBackend>
    ));

    let restoring = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.restore_session().await })
    };
    backend.entered.notified().await;

    let before = manager.snapshot();
    assert!(before.is_busy());
    assert_eq!(
        manager.sign_in("alice", KEY).await,
        Err(SessionError::OperationInProgress)
    );
    assert_eq!(
        manager.restore_session().await,
        Err(SessionError::OperationInProgress)
    );
    assert_eq!(manager.snapshot(), before);

    backend.gate.notify_one();
    restoring.await.unwrap().unwrap();
    assert!(!manager.snapshot().is_busy());

    let signing_in = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.sign_in("alice", KEY).await })
    };
    backend.entered.notified().await;

    let before = manager.snapshot();
    assert_eq!(
        manager
            .sign_up(&SignUpProfile::new("bob", "Bob"), KEY)
            .await,
        Err(SessionError::OperationInProgress)
    );
    assert_eq!(manager.sign_out().await, Err(SessionError::OperationInProgress));
    assert_eq!(manager.snapshot(), before);

    backend.gate.notify_one();
    signing_in.await.unwrap().unwrap();
    assert!(manager.snapshot().is_authenticated());
    // Rejected calls never reached the backend.
    assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_aborted_operation_releases_manager() {
    let backend = Arc::new(GatedBackend::new());
    let manager = Arc::new(SessionManager::new(
        Arc::clone(&backend) as Arc<dyn IdentityBackend>
    ));
    let seen = track(&manager);

    let restoring = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.restore_session().await })
    };
    backend.entered.notified().await;
    assert!(manager.snapshot().is_busy());

    restoring.abort();
    assert!(restoring.await.unwrap_err().is_cancelled());

    let state = manager.snapshot();
    assert!(!state.is_busy());
    assert_eq!(select_screen(&state), Screen::Unauthenticated);
    assert!(matches!(
        state.last_error(),
        Some(SessionError::BackendFailure(d)) if d.has_code(ErrorDescriptor::CANCELLED)
    ));

    // The next operation is admitted and reaches the backend.
    backend.gate.notify_one();
    manager.sign_in("alice", KEY).await.unwrap();
    assert!(manager.snapshot().is_authenticated());
    assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    assert_eq!(seen.lock().unwrap().len(), 4);
}

// ============================================================================
// Sign-up
// ============================================================================

#[tokio::test]
async fn test_partial_sign_up_failure() {
    let backend = Arc::new(InMemoryBackend::new(KEY));
    let manager = manager_for(&backend);
    manager.restore_session().await.unwrap();

    backend.fail_next(
        BackendCall::Authenticate,
        ErrorDescriptor::with_code("ERR_NETWORK", "connection reset"),
    );
    let profile = SignUpProfile::new("u1", "Name").with_email("a@b.com");
    manager.sign_up(&profile, KEY).await.unwrap();

    let state = manager.snapshot();
    assert!(!state.is_authenticated());
    assert!(state.identity().is_none());
    match state.last_error() {
        Some(SessionError::PartialSignUpFailure { registered, cause }) => {
            assert_eq!(registered.id, "u1");
            assert!(registered.avatar_url.is_some());
            assert_eq!(cause.message, "connection reset");
        }
        other => panic!("expected partial sign-up failure, got {other:?}"),
    }
    assert!(backend.has_user("u1"));

    // Recovery by signing in works as well as retrying sign-up.
    manager.sign_in("u1", KEY).await.unwrap();
    assert!(manager.snapshot().is_authenticated());
    assert_eq!(backend.call_count(BackendCall::CreateIdentity), 1);
}

#[tokio::test]
async fn test_sign_up_invalid_input_skips_backend() {
    let backend = Arc::new(InMemoryBackend::new(KEY));
    let manager = manager_for(&backend);
    manager.restore_session().await.unwrap();
    let before = manager.snapshot();

    for profile in [
        SignUpProfile::new("", "Name"),
        SignUpProfile::new("u1", "  "),
        SignUpProfile::new("u1", "Name").with_email("not-an-email"),
    ] {
        let err = manager.sign_up(&profile, KEY).await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidInput(_)), "{err:?}");
    }

    assert_eq!(manager.snapshot(), before);
    assert_eq!(backend.call_count(BackendCall::CreateIdentity), 0);
}

#[tokio::test]
async fn test_sign_up_while_authenticated() {
    let backend = Arc::new(InMemoryBackend::new(KEY).with_user(alice()).with_session("alice"));
    let manager = manager_for(&backend);
    manager.restore_session().await.unwrap();

    let err = manager
        .sign_up(&SignUpProfile::new("u2", "Other"), KEY)
        .await
        .unwrap_err();
    assert_eq!(err, SessionError::AlreadyAuthenticated);
    assert!(!backend.has_user("u2"));
}

// ============================================================================
// Sign-out
// ============================================================================

#[tokio::test]
async fn test_sign_out_survives_invalidate_failure() {
    let backend = Arc::new(InMemoryBackend::new(KEY).with_user(alice()).with_session("alice"));
    backend.fail_next(BackendCall::Invalidate, ErrorDescriptor::new("server error"));
    let manager = manager_for(&backend);
    let router = ViewRouter::new(&manager);

    manager.restore_session().await.unwrap();
    assert_eq!(router.current(), Screen::Authenticated);

    manager.sign_out().await.unwrap();
    let state = manager.snapshot();
    assert!(!state.is_authenticated());
    assert!(state.identity().is_none());
    assert!(state.last_error().is_none());
    assert_eq!(router.current(), Screen::Unauthenticated);
}

#[tokio::test]
async fn test_sign_out_is_idempotent() {
    let backend = Arc::new(InMemoryBackend::new(KEY));
    let manager = manager_for(&backend);
    manager.restore_session().await.unwrap();
    let seen = track(&manager);

    let before = manager.snapshot();
    manager.sign_out().await.unwrap();
    manager.sign_out().await.unwrap();
    assert_eq!(manager.snapshot(), before);

    // Busy cycles are still observable.
    let busy: Vec<bool> = seen.lock().unwrap().iter().map(|s| s.is_busy()).collect();
    assert_eq!(busy, vec![true, false, true, false]);
}
