//! Change observers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use tracing::warn;

use super::SessionState;
use crate::error::SessionError;
use crate::Result;

/// Global counter for observer ID generation.
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Handle returned when registering an observer, used to remove it again.
///
/// IDs come from an atomic counter and are unique within the process. The
/// ID is displayed as `obs-XXXXXXXX` where X is a hexadecimal digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

impl ObserverId {
    fn next() -> Self {
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obs-{:08x}", self.0)
    }
}

type Callback = Box<dyn Fn(&SessionState) + Send + Sync>;

/// Synchronous callbacks fired after every committed state change.
#[derive(Default)]
pub(crate) struct ObserverRegistry {
    observers: RwLock<Vec<(ObserverId, Callback)>>,
}

impl ObserverRegistry {
    pub(crate) fn add<F>(&self, callback: F) -> Result<ObserverId>
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        let id = ObserverId::next();
        self.observers
            .write()
            .map_err(|_| SessionError::LockPoisoned)?
            .push((id, Box::new(callback)));
        Ok(id)
    }

    pub(crate) fn remove(&self, id: ObserverId) -> Result<bool> {
        let mut observers = self
            .observers
            .write()
            .map_err(|_| SessionError::LockPoisoned)?;
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        Ok(observers.len() != before)
    }

    /// Call every observer with the new state.
    ///
    /// Observers must not register or remove observers from inside the
    /// callback.
    pub(crate) fn notify(&self, state: &SessionState) {
        let Ok(observers) = self.observers.read() else {
            warn!("observer registry lock poisoned, skipping notification");
            return;
        };
        for (_, callback) in observers.iter() {
            callback(state);
        }
    }
}
