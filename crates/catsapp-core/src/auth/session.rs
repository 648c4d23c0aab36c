use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::ApiError;
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, User, UserProfile};
use crate::routing::{Navigator, Route};

use super::storage::{KeyValueStore, StorageError, TOKEN_KEY, USER_KEY};
use super::token;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Failed to save session: {0}")]
    Storage(#[from] StorageError),
}

/// Authentication state. Authenticated iff both token and profile are present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    profile: Option<UserProfile>,
}

impl Session {
    pub fn authenticated(token: String, profile: UserProfile) -> Self {
        Self {
            token: Some(token),
            profile: Some(profile),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.profile.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }
}

/// Backend calls the store needs to establish and refresh a session.
pub trait AuthApi {
    fn authenticate(
        &self,
        request: &LoginRequest,
    ) -> impl Future<Output = Result<AuthResponse, ApiError>> + Send;

    fn create_account(
        &self,
        request: &RegisterRequest,
    ) -> impl Future<Output = Result<AuthResponse, ApiError>> + Send;

    fn current_user(&self) -> impl Future<Output = Result<User, ApiError>> + Send;
}

pub struct SessionStore {
    storage: Box<dyn KeyValueStore>,
    navigator: Arc<dyn Navigator>,
    state: watch::Sender<Session>,
}

impl SessionStore {
    /// Create a store that starts signed out. Call `restore_from_storage`
    /// once at startup to pick up a persisted session.
    pub fn new(storage: impl KeyValueStore + 'static, navigator: Arc<dyn Navigator>) -> Self {
        let (state, _) = watch::channel(Session::default());
        Self {
            storage: Box::new(storage),
            navigator,
            state,
        }
    }

    /// Adopt the persisted token and profile without contacting the server.
    /// Expiry is not checked here.
    pub fn restore_from_storage(&self) -> Session {
        match (self.token(), self.profile()) {
            (Some(token), Some(profile)) => {
                debug!(user_id = %profile.user_id, "Restored stored session");
                self.state.send_replace(Session::authenticated(token, profile));
            }
            (token, _) => {
                debug!(has_token = token.is_some(), "No complete stored session");
            }
        }
        self.snapshot()
    }

    pub async fn login<A: AuthApi>(
        &self,
        api: &A,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = match api.authenticate(&request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "Login failed");
                return Err(err.into());
            }
        };

        let session = self.set_auth_data(&response)?;
        info!(user_id = %response.user.id, "Logged in");
        Ok(session)
    }

    pub async fn register<A: AuthApi>(
        &self,
        api: &A,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let request = RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = match api.create_account(&request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "Registration failed");
                return Err(err.into());
            }
        };

        let session = self.set_auth_data(&response)?;
        info!(user_id = %response.user.id, "Registered and logged in");
        Ok(session)
    }

    /// Clear the persisted and in-memory session and go to the login view.
    /// Safe to call when already signed out.
    pub fn logout(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(err) = self.storage.remove(key) {
                warn!(key, error = %err, "Failed to clear stored session key");
            }
        }

        let previous = self.state.send_replace(Session::default());
        if previous.is_authenticated() {
            info!("Logged out");
        } else {
            debug!("Logout requested without an active session");
        }
        self.navigator.navigate(Route::Login);
    }

    /// Replace the profile with the server's view of the current user.
    ///
    /// Any failure ends the session. A 401 has already done so inside the
    /// request pipeline, so it is not repeated here.
    pub async fn fetch_profile<A: AuthApi>(&self, api: &A) -> Result<UserProfile, AuthError> {
        let user = match api.current_user().await {
            Ok(user) => user,
            Err(err) => {
                warn!(error = %err, "Failed to fetch profile");
                if !matches!(err, ApiError::Unauthorized) {
                    self.logout();
                }
                return Err(err.into());
            }
        };

        let profile = user.profile();
        let current = self.snapshot();
        if let Some(token) = current.token().filter(|_| current.is_authenticated()) {
            self.storage
                .set(USER_KEY, &serde_json::to_string(&user).map_err(StorageError::from)?)?;
            self.state
                .send_replace(Session::authenticated(token.to_string(), profile.clone()));
        }
        Ok(profile)
    }

    /// Return the token if it is still valid, otherwise log out.
    pub fn refresh_token_if_needed(&self) -> Option<String> {
        if self.is_token_expired() {
            info!("Stored token expired, ending session");
            self.logout();
            return None;
        }
        self.token()
    }

    pub fn is_token_expired(&self) -> bool {
        token::is_expired(self.token().as_deref())
    }

    pub fn token_expiry(&self) -> Option<DateTime<Utc>> {
        self.token().as_deref().and_then(token::expiry)
    }

    pub fn token(&self) -> Option<String> {
        self.storage.get(TOKEN_KEY)
    }

    /// Stored profile. A value that is not a valid user reads as absent.
    pub fn profile(&self) -> Option<UserProfile> {
        let raw = self.storage.get(USER_KEY)?;
        match serde_json::from_str::<User>(&raw) {
            Ok(user) => Some(user.profile()),
            Err(err) => {
                warn!(error = %err, "Ignoring malformed stored user profile");
                None
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Current state, read synchronously.
    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Listen for state changes. The receiver sees the current value first.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Persist both keys, then publish. Nothing is published, and the
    /// previous token is put back, if either write fails.
    fn set_auth_data(&self, response: &AuthResponse) -> Result<Session, AuthError> {
        let user_json = serde_json::to_string(&response.user).map_err(StorageError::from)?;

        let previous_token = self.storage.get(TOKEN_KEY);
        self.storage.set(TOKEN_KEY, &response.access_token)?;
        if let Err(err) = self.storage.set(USER_KEY, &user_json) {
            self.restore_key(TOKEN_KEY, previous_token);
            return Err(err.into());
        }

        let session = Session::authenticated(response.access_token.clone(), response.user.profile());
        self.state.send_replace(session.clone());
        Ok(session)
    }

    fn restore_key(&self, key: &str, value: Option<String>) {
        let result = match value {
            Some(ref value) => self.storage.set(key, value),
            None => self.storage.remove(key),
        };
        if let Err(err) = result {
            warn!(key, error = %err, "Failed to roll back stored session key");
        }
    }
}
