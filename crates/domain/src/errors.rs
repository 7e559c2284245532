//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Planora
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum PlanoraError {
    /// Transport failure: unreachable host, timeout, broken connection.
    #[error("Network error: {0}")]
    Network(String),

    /// The schedule service answered with a non-2xx status. `body` is the
    /// response body verbatim.
    #[error("Remote service returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response was not JSON with the expected top-level shape.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// No bearer token is available for the current session.
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlanoraError {
    /// Whether the UI should treat this error as a failed fetch/submission.
    ///
    /// Transport, status, malformed-payload and missing-credential failures
    /// all surface identically to the user.
    pub fn is_transport_class(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Status { .. } | Self::MalformedPayload(_) | Self::MissingCredential(_)
        )
    }

    /// Stable label suitable for structured logging.
    pub fn error_label(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Status { .. } => "status",
            Self::MalformedPayload(_) => "malformed_payload",
            Self::MissingCredential(_) => "missing_credential",
            Self::Auth(_) => "auth",
            Self::Config(_) => "config",
            Self::InvalidInput(_) => "invalid_input",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for Planora operations
pub type Result<T> = std::result::Result<T, PlanoraError>;
