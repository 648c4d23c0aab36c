use crate::auth::{Session, SessionStore};

use super::Route;

/// Result of evaluating a guard before entering a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    Allow,
    Redirect(Route),
}

impl GuardOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardOutcome::Allow)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGuard {
    /// Views for signed-in users; others are sent to the login view.
    Authenticated,
    /// Views for anonymous users (login, register); signed-in users go to the dashboard.
    Guest,
}

impl RouteGuard {
    pub fn evaluate(self, session: &Session) -> GuardOutcome {
        match (self, session.is_authenticated()) {
            (RouteGuard::Authenticated, true) | (RouteGuard::Guest, false) => GuardOutcome::Allow,
            (RouteGuard::Authenticated, false) => GuardOutcome::Redirect(Route::Login),
            (RouteGuard::Guest, true) => GuardOutcome::Redirect(Route::Dashboard),
        }
    }

    /// Evaluate against the store's current snapshot.
    pub fn check(self, store: &SessionStore) -> GuardOutcome {
        self.evaluate(&store.snapshot())
    }
}
