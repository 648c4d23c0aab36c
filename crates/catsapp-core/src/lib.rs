//! Core library for catsapp.
//!
//! Provides the client-side session store, the request pipeline every
//! backend call goes through, route guards, and the catalog API client.
//! Front ends supply a `Navigator` and a `KeyValueStore` and consume the
//! rest through `ApiClient` and `SessionStore`.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod routing;

pub use api::{ApiClient, ApiError, LoadingTracker, RetryPolicy};
pub use auth::{AuthError, FileStore, KeyValueStore, MemoryStore, Session, SessionStore};
pub use config::Config;
pub use routing::{GuardOutcome, Navigator, Route, RouteGuard};
