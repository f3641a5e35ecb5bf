//! Error types for the API client crate.

use thiserror::Error;

/// Result type alias for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Retry policy class for API failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiRetryClass {
    Retryable,
    Permanent,
    ReauthRequired,
}

impl ApiRetryClass {
    /// Stable code persisted alongside failed outbox changes.
    pub fn code(self) -> &'static str {
        match self {
            Self::Retryable => "retryable",
            Self::Permanent => "permanent",
            Self::ReauthRequired => "reauth_required",
        }
    }
}

/// Errors that can occur while talking to the Crisis Cleanup API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API error response from the server
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid request (missing required data, etc.)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication error (missing or invalid token)
    #[error("Authentication error: {0}")]
    Auth(String),
}

impl ApiError {
    /// Create an API error from status and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// HTTP status if this is an API error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classify error for retry policy.
    pub fn retry_class(&self) -> ApiRetryClass {
        match self {
            Self::Api { status, .. } => match *status {
                401 | 403 => ApiRetryClass::ReauthRequired,
                408 | 409 | 423 | 425 | 429 => ApiRetryClass::Retryable,
                500..=599 => ApiRetryClass::Retryable,
                _ => ApiRetryClass::Permanent,
            },
            Self::Http(_) => ApiRetryClass::Retryable,
            Self::Json(_) => ApiRetryClass::Permanent,
            Self::InvalidRequest(_) => ApiRetryClass::Permanent,
            Self::Auth(_) => ApiRetryClass::ReauthRequired,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_class_for_auth_statuses_is_reauth() {
        assert_eq!(
            ApiError::api(401, "unauthorized").retry_class(),
            ApiRetryClass::ReauthRequired
        );
        assert_eq!(
            ApiError::api(403, "forbidden").retry_class(),
            ApiRetryClass::ReauthRequired
        );
    }

    #[test]
    fn retry_class_for_transient_statuses_is_retryable() {
        for status in [408, 409, 429, 500, 503] {
            assert_eq!(
                ApiError::api(status, "try again").retry_class(),
                ApiRetryClass::Retryable,
                "status {status}"
            );
        }
    }

    #[test]
    fn retry_class_for_client_errors_is_permanent() {
        assert_eq!(
            ApiError::api(400, "bad request").retry_class(),
            ApiRetryClass::Permanent
        );
        assert_eq!(
            ApiError::api(404, "missing").retry_class(),
            ApiRetryClass::Permanent
        );
    }

    #[test]
    fn retry_class_codes_are_stable() {
        assert_eq!(ApiRetryClass::Retryable.code(), "retryable");
        assert_eq!(ApiRetryClass::Permanent.code(), "permanent");
        assert_eq!(ApiRetryClass::ReauthRequired.code(), "reauth_required");
    }
}
