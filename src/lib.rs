//! # messenger-session
//!
//! Session lifecycle and view routing core for a messaging client whose chat
//! features live in a hosted backend.
//!
//! The crate decides, at any moment, whether the client shows the sign-in
//! screens or the main application, and mediates every state change caused
//! by sign-in, sign-up, sign-out and startup session restore.
//!
//! ## Features
//!
//! - **Single source of truth**: one [`SessionManager`] owns the session state
//! - **Pure transitions**: [`apply_transition`] is a plain function over events
//! - **Overlap guard**: operations are admitted one at a time
//! - **Routing**: [`select_screen`] maps state to a screen group
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use messenger_session::{Identity, InMemoryBackend, Screen, SessionManager, ViewRouter};
//!
//! #[tokio::main]
//! async fn main() -> messenger_session::Result<()> {
//!     messenger_session::logging::try_init().ok();
//!
//!     let backend = InMemoryBackend::new("app-key").with_user(Identity::new("alice", "Alice"));
//!     let manager = SessionManager::new(Arc::new(backend));
//!     let router = ViewRouter::new(&manager);
//!     assert_eq!(router.current(), Screen::Pending);
//!
//!     manager.restore_session().await?;
//!     manager.sign_in("alice", "app-key").await?;
//!     assert_eq!(router.current(), Screen::Authenticated);
//!
//!     Ok(())
//! }
//! ```

pub mod avatar;
pub mod backend;
pub mod cli;
pub mod config;
pub mod console;
pub mod error;
pub mod identity;
pub mod logging;
pub mod router;
pub mod session;
pub mod validation;

// Re-export commonly used types
pub use avatar::AvatarConfig;
pub use backend::{IdentityBackend, InMemoryBackend, RestoreOutcome, TimeoutBackend};
pub use error::{Result, SessionError};
pub use identity::{ErrorDescriptor, Identity, NewIdentity, SignUpProfile};
pub use router::{select_screen, Route, Screen, ViewRouter};
pub use session::{
    apply_transition, ObserverId, Operation, Phase, SessionEvent, SessionManager, SessionState,
    SignUpOutcome,
};
pub use validation::{CredentialValidator, ValidationConfig, ValidationError};
