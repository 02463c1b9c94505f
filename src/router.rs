//! View routing.
//!
//! The router is a pure function of the session state: it has no state of
//! its own and never talks to the backend.

use std::fmt;

use tokio::sync::watch;

use crate::session::{Phase, SessionManager, SessionState};

/// Screen group rendered by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Startup restore has not resolved yet.
    Pending,
    /// Sign-in and sign-up screens.
    Unauthenticated,
    /// The main chat application.
    Authenticated,
}

/// Individual screens inside a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    SignIn,
    SignUp,
    Chat,
}

impl Screen {
    /// Screens reachable within this group, initial route first.
    pub fn routes(self) -> &'static [Route] {
        match self {
            Screen::Pending => &[],
            Screen::Unauthenticated => &[Route::SignIn, Route::SignUp],
            Screen::Authenticated => &[Route::Chat],
        }
    }

    /// Route shown when the group is entered.
    pub fn initial_route(self) -> Option<Route> {
        self.routes().first().copied()
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Screen::Pending => "pending",
            Screen::Unauthenticated => "unauthenticated",
            Screen::Authenticated => "authenticated",
        })
    }
}

/// Select the screen group for a session state.
pub fn select_screen(state: &SessionState) -> Screen {
    match state.phase() {
        Phase::Init => Screen::Pending,
        Phase::Unauthenticated => Screen::Unauthenticated,
        Phase::Authenticated => Screen::Authenticated,
    }
}

/// Follows a session manager and reports the screen group to render.
pub struct ViewRouter {
    rx: watch::Receiver<SessionState>,
}

impl ViewRouter {
    pub fn new(manager: &SessionManager) -> Self {
        Self {
            rx: manager.subscribe(),
        }
    }

    /// Screen group for the latest state.
    pub fn current(&self) -> Screen {
        select_screen(&self.rx.borrow())
    }

    /// Wait for the next state change and return the screen group.
    ///
    /// Returns `None` once the session manager has been dropped.
    pub async fn changed(&mut self) -> Option<Screen> {
        self.rx.changed().await.ok()?;
        Some(select_screen(&self.rx.borrow_and_update()))
    }
}
