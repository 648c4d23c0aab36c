//! Authentication state for the catalog client.
//!
//! This module provides:
//! - `SessionStore`: Single source of truth for the signed-in user, with
//!   change notification and write-through persistence
//! - `KeyValueStore`: Durable string storage (`FileStore`, `MemoryStore`)
//! - `token`: Expiry inspection of bearer tokens
//!
//! The store holds the token and user profile under the `auth_token` and
//! `user_profile` keys. Expired or undecodable tokens are treated as
//! expired, never as valid.

pub mod session;
pub mod storage;
pub mod token;

pub use session::{AuthApi, AuthError, Session, SessionStore};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError, TOKEN_KEY, USER_KEY};
