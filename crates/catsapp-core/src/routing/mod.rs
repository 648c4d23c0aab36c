//! Navigation targets and route guards.
//!
//! The core never depends on a concrete router. It asks a `Navigator`
//! to move to one of two logical views, and exposes guards that front
//! ends consult before entering a view.

pub mod guards;

pub use guards::{GuardOutcome, RouteGuard};

/// Logical views the core can send the user to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Dashboard,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Dashboard => "/dashboard",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Performs navigation on behalf of the core.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}
