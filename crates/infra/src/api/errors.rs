//! API-specific error types
//!
//! Classifies schedule API failures and converts them into the domain error
//! at the port boundary.

use planora_domain::PlanoraError;
use thiserror::Error;

/// Categories of API errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Missing or rejected credentials (401, 403, no token)
    Authentication,
    /// Rate limiting (429)
    RateLimit,
    /// Server errors (5xx) and unreadable responses
    Server,
    /// Client errors (4xx except auth)
    Client,
    /// Network/connection errors
    Network,
    /// Configuration errors
    Config,
}

/// API operation errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("No session token available")]
    MissingCredential,

    #[error("Remote service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Auth(_) | Self::MissingCredential => ApiErrorCategory::Authentication,
            Self::Status { status: 429, .. } => ApiErrorCategory::RateLimit,
            Self::Status { status, .. } if *status >= 500 => ApiErrorCategory::Server,
            Self::Status { .. } => ApiErrorCategory::Client,
            Self::Decode(_) => ApiErrorCategory::Server,
            Self::Network(_) => ApiErrorCategory::Network,
            Self::Config(_) => ApiErrorCategory::Config,
        }
    }
}

impl From<ApiError> for PlanoraError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Auth(message) => PlanoraError::Auth(message),
            ApiError::MissingCredential => {
                PlanoraError::MissingCredential("no session token available".into())
            }
            ApiError::Status { status, body } => PlanoraError::Status { status, body },
            ApiError::Network(message) => PlanoraError::Network(message),
            ApiError::Decode(message) => PlanoraError::MalformedPayload(message),
            ApiError::Config(message) => PlanoraError::Config(message),
        }
    }
}

/// Transport errors surface from the HTTP client as domain errors.
impl From<PlanoraError> for ApiError {
    fn from(err: PlanoraError) -> Self {
        match err {
            PlanoraError::Network(message) => Self::Network(message),
            PlanoraError::Status { status, body } => Self::Status { status, body },
            PlanoraError::MalformedPayload(message) => Self::Decode(message),
            PlanoraError::MissingCredential(_) => Self::MissingCredential,
            PlanoraError::Auth(message) => Self::Auth(message),
            PlanoraError::Config(message)
            | PlanoraError::InvalidInput(message)
            | PlanoraError::Internal(message) => Self::Config(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(ApiError::Auth("test".to_string()).category(), ApiErrorCategory::Authentication);
        assert_eq!(ApiError::MissingCredential.category(), ApiErrorCategory::Authentication);
        assert_eq!(
            ApiError::Status { status: 429, body: String::new() }.category(),
            ApiErrorCategory::RateLimit
        );
        assert_eq!(
            ApiError::Status { status: 503, body: String::new() }.category(),
            ApiErrorCategory::Server
        );
        assert_eq!(
            ApiError::Status { status: 422, body: String::new() }.category(),
            ApiErrorCategory::Client
        );
        assert_eq!(ApiError::Network("test".to_string()).category(), ApiErrorCategory::Network);
    }

    #[test]
    fn test_status_body_survives_conversion() {
        let err = ApiError::Status { status: 409, body: "{\"error\":\"overlap\"}".into() };
        let domain: PlanoraError = err.into();
        assert_eq!(
            domain,
            PlanoraError::Status { status: 409, body: "{\"error\":\"overlap\"}".into() }
        );
    }

    #[test]
    fn test_missing_credential_is_transport_class() {
        let domain: PlanoraError = ApiError::MissingCredential.into();
        assert!(matches!(domain, PlanoraError::MissingCredential(_)));
        assert!(domain.is_transport_class());
    }
}
