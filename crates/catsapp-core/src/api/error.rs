use reqwest::StatusCode;
use thiserror::Error;

/// Normalized request failure. The `Display` text is fit to show to users.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Invalid request. Check the data you sent.")]
    BadRequest,

    #[error("Unauthorized. Please log in again.")]
    Unauthorized,

    #[error("Access denied. You do not have permission to perform this action.")]
    Forbidden,

    #[error("Resource not found.")]
    NotFound,

    #[error("Conflict. The resource already exists or is in use.")]
    Conflict,

    #[error("Invalid input data.")]
    UnprocessableEntity,

    #[error("Internal server error. Please try again later.")]
    ServerError,

    #[error("Service temporarily unavailable.")]
    ServiceUnavailable,

    #[error("Error {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("Network error. Check your connection and try again.")]
    Network,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Maximum length for error response bodies in log output
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            400 => ApiError::BadRequest,
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden,
            404 => ApiError::NotFound,
            409 => ApiError::Conflict,
            422 => ApiError::UnprocessableEntity,
            500 => ApiError::ServerError,
            503 => ApiError::ServiceUnavailable,
            code => ApiError::Status {
                status: code,
                reason: status.canonical_reason().unwrap_or("Request failed").to_string(),
            },
        }
    }

    /// HTTP status behind this error, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::BadRequest => Some(400),
            ApiError::Unauthorized => Some(401),
            ApiError::Forbidden => Some(403),
            ApiError::NotFound => Some(404),
            ApiError::Conflict => Some(409),
            ApiError::UnprocessableEntity => Some(422),
            ApiError::ServerError => Some(500),
            ApiError::ServiceUnavailable => Some(503),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Network | ApiError::InvalidResponse(_) | ApiError::InvalidRequest(_) => None,
        }
    }

    /// Failures worth another attempt for idempotent requests.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::ServiceUnavailable | ApiError::Network)
    }
}
