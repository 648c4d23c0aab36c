//! Request pipeline shared by every backend call.
//!
//! Each request passes through, in order:
//! 1. Credential attachment: `Authorization: Bearer <token>` for everything
//!    except the endpoints that issue credentials
//! 2. Error normalization: failed responses become an `ApiError`, and a
//!    401 ends the session
//! 3. Loading tracking, which wraps the whole chain so the global loading
//!    signal covers error handling, retries and body decoding

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, Request, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::auth::SessionStore;

use super::loading::LoadingTracker;
use super::ApiError;

/// Endpoints that establish credentials and must never receive one.
const CREDENTIAL_ENDPOINTS: [&str; 2] = ["/auth/login", "/auth/register"];

/// Longest wait between two retries.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Retry behaviour for idempotent requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub attempts: u32,
    /// Delay before the first retry, doubled after each one.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            attempts: 0,
            delay: Duration::ZERO,
        }
    }
}

/// Double `delay`, never past `MAX_BACKOFF`.
fn next_backoff(delay: Duration) -> Duration {
    delay.saturating_mul(2).min(MAX_BACKOFF)
}

pub fn is_credential_endpoint(url: &Url) -> bool {
    let url = url.as_str();
    CREDENTIAL_ENDPOINTS.iter().any(|endpoint| url.contains(endpoint))
}

/// Clone is cheap: the HTTP client, session and counter are all shared.
#[derive(Clone)]
pub struct Pipeline {
    client: Client,
    session: Arc<SessionStore>,
    loading: LoadingTracker,
    retry: RetryPolicy,
}

impl Pipeline {
    pub fn new(client: Client, session: Arc<SessionStore>, retry: RetryPolicy) -> Self {
        Self {
            client,
            session,
            loading: LoadingTracker::new(),
            retry,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn loading(&self) -> &LoadingTracker {
        &self.loading
    }

    /// Run `request` through the pipeline and decode a JSON body.
    pub async fn send<T: DeserializeOwned>(&self, request: Request) -> Result<T, ApiError> {
        let _loading = self.loading.begin();

        let url = request.url().clone();
        let request = self.attach_credentials(request);
        let response = self.dispatch(request).await?;

        response.json::<T>().await.map_err(|err| {
            warn!(url = %url, error = %err, "Failed to parse JSON response");
            ApiError::InvalidResponse(format!("unexpected body from {}", url.path()))
        })
    }

    fn attach_credentials(&self, mut request: Request) -> Request {
        if is_credential_endpoint(request.url()) {
            return request;
        }
        let Some(token) = self.session.token() else {
            return request;
        };
        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers_mut().insert(AUTHORIZATION, value);
            }
            Err(_) => warn!("Stored token is not a valid header value, sending without it"),
        }
        request
    }

    async fn dispatch(&self, mut request: Request) -> Result<Response, ApiError> {
        let method = request.method().clone();
        let url = request.url().clone();
        let max_retries = if method == Method::GET { self.retry.attempts } else { 0 };
        let mut retries = 0;
        let mut backoff = self.retry.delay.min(MAX_BACKOFF);

        loop {
            let next_attempt = if retries < max_retries { request.try_clone() } else { None };
            debug!(%method, url = %url, attempt = retries + 1, "Sending request");

            let error = match self.client.execute(request).await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => Self::normalize_response(&method, &url, response).await,
                Err(err) => {
                    warn!(%method, url = %url, error = %err, "Request failed before a response arrived");
                    ApiError::Network
                }
            };

            match next_attempt {
                Some(next) if error.is_transient() => {
                    retries += 1;
                    warn!(url = %url, retry = retries, backoff_ms = backoff.as_millis() as u64, "Transient failure, backing off");
                    tokio::time::sleep(backoff).await;
                    backoff = next_backoff(backoff);
                    request = next;
                }
                _ => {
                    if error == ApiError::Unauthorized && !is_credential_endpoint(&url) {
                        warn!(url = %url, "Unauthorized response, ending session");
                        self.session.logout();
                    }
                    return Err(error);
                }
            }
        }
    }

    async fn normalize_response(method: &Method, url: &Url, response: Response) -> ApiError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let error = ApiError::from_status(status);
        warn!(
            %method,
            url = %url,
            status = status.as_u16(),
            message = %error,
            body = %ApiError::truncate_body(&body),
            "HTTP request failed"
        );
        error
    }
}
