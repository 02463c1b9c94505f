//! In-memory identity backend.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;

use super::{IdentityBackend, RestoreOutcome};
use crate::identity::{ErrorDescriptor, Identity, NewIdentity};

/// Backend call kinds, used for fault injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendCall {
    Restore,
    Authenticate,
    CreateIdentity,
    Invalidate,
}

/// Thread-safe, process-local identity backend.
///
/// Accounts are keyed by id and every login must present the shared auth
/// key the backend was created with. At most one session is live at a time.
pub struct InMemoryBackend {
    auth_key: String,
    users: RwLock<HashMap<String, Identity>>,
    session: RwLock<Option<String>>,
    faults: Mutex<HashMap<BackendCall, ErrorDescriptor>>,
    calls: Mutex<HashMap<BackendCall, usize>>,
}

impl InMemoryBackend {
    /// Create an empty backend accepting the given auth key.
    pub fn new(auth_key: impl Into<String>) -> Self {
        Self {
            auth_key: auth_key.into(),
            users: RwLock::new(HashMap::new()),
            session: RwLock::new(None),
            faults: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Add an account to the directory, replacing any account with the same id.
    pub fn with_user(self, identity: Identity) -> Self {
        self.insert_user(identity);
        self
    }

    /// Mark an existing account as having a live session.
    ///
    /// Unknown ids are ignored so that `restore` reports `NotFound`.
    pub fn with_session(self, id: impl Into<String>) -> Self {
        let id = id.into();
        let known = self
            .users
            .read()
            .map(|users| users.contains_key(&id))
            .unwrap_or(false);
        if known {
            if let Ok(mut session) = self.session.write() {
                *session = Some(id);
            }
        }
        self
    }

    /// Add an account to the directory.
    pub fn insert_user(&self, identity: Identity) {
        if let Ok(mut users) = self.users.write() {
            users.insert(identity.id.clone(), identity);
        }
    }

    /// Check whether an account exists.
    pub fn has_user(&self, id: &str) -> bool {
        self.users
            .read()
            .map(|users| users.contains_key(id))
            .unwrap_or(false)
    }

    /// Id of the account with a live session, if any.
    pub fn current_session(&self) -> Option<String> {
        self.session.read().ok().and_then(|s| s.clone())
    }

    /// Make the next call of the given kind fail with `error`.
    pub fn fail_next(&self, call: BackendCall, error: ErrorDescriptor) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.insert(call, error);
        }
    }

    /// Number of calls of the given kind received so far.
    pub fn call_count(&self, call: BackendCall) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.get(&call).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    fn record(&self, call: BackendCall) -> Result<(), ErrorDescriptor> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(call).or_insert(0) += 1;
        }
        let fault = self
            .faults
            .lock()
            .map_err(|_| poisoned())?
            .remove(&call);
        match fault {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn poisoned() -> ErrorDescriptor {
    ErrorDescriptor::with_code(ErrorDescriptor::INTERNAL, "internal lock poisoned")
}

#[async_trait]
impl IdentityBackend for InMemoryBackend {
    async fn restore(&self) -> RestoreOutcome {
        if let Err(error) = self.record(BackendCall::Restore) {
            return RestoreOutcome::Failure(error);
        }

        let Ok(session) = self.session.read() else {
            return RestoreOutcome::Failure(poisoned());
        };
        let Ok(users) = self.users.read() else {
            return RestoreOutcome::Failure(poisoned());
        };

        match session.as_ref().and_then(|id| users.get(id)) {
            Some(identity) => RestoreOutcome::Found(identity.clone()),
            None => RestoreOutcome::NotFound,
        }
    }

    async fn authenticate(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<Identity, ErrorDescriptor> {
        self.record(BackendCall::Authenticate)?;

        if secret != self.auth_key {
            return Err(ErrorDescriptor::with_code(
                ErrorDescriptor::AUTH_KEY,
                "the auth key provided is invalid",
            ));
        }

        let identity = self
            .users
            .read()
            .map_err(|_| poisoned())?
            .get(identifier)
            .cloned()
            .ok_or_else(|| {
                ErrorDescriptor::with_code(
                    ErrorDescriptor::UID_NOT_FOUND,
                    format!("the user with uid {identifier} does not exist"),
                )
            })?;

        *self.session.write().map_err(|_| poisoned())? = Some(identity.id.clone());
        Ok(identity)
    }

    async fn create_identity(&self, record: &NewIdentity) -> Result<Identity, ErrorDescriptor> {
        self.record(BackendCall::CreateIdentity)?;

        let mut users = self.users.write().map_err(|_| poisoned())?;
        if users.contains_key(&record.id) {
            return Err(ErrorDescriptor::with_code(
                ErrorDescriptor::UID_ALREADY_EXISTS,
                format!("the uid {} already exists", record.id),
            ));
        }

        let identity = Identity::from(record.clone());
        users.insert(identity.id.clone(), identity.clone());
        Ok(identity)
    }

    async fn invalidate(&self) -> Result<(), ErrorDescriptor> {
        self.record(BackendCall::Invalidate)?;
        *self.session.write().map_err(|_| poisoned())? = None;
        Ok(())
    }
}
