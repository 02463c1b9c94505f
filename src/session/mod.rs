//! Session management module.
//!
//! This module owns the single source of truth for "who is logged in":
//! the state record, the pure transition table that changes it, and the
//! manager that drives transitions from identity backend calls.

mod manager;
mod observer;
mod state;
mod transition;

pub use manager::SessionManager;
pub use observer::ObserverId;
pub use state::{Operation, Phase, SessionState};
pub use transition::{admit, apply_transition, SessionEvent, SignUpOutcome};
