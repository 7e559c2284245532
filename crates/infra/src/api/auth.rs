//! Bearer-token providers for the schedule API

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use tracing::{debug, info};

use super::errors::ApiError;

/// Trait for providing access tokens
///
/// This trait allows dependency injection and testing with mock providers.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Get the bearer token for the next request.
    ///
    /// # Errors
    /// `ApiError::MissingCredential` when no user is signed in.
    async fn access_token(&self) -> Result<String, ApiError>;
}

/// Holds the signed-in user's token for the lifetime of a session.
///
/// Sign-in stores the token, logout clears it; requests made while signed
/// out fail with `MissingCredential` without touching the network.
#[derive(Debug, Default)]
pub struct SessionTokenProvider {
    token: RwLock<Option<String>>,
}

impl SessionTokenProvider {
    /// Signed-out provider; every token request fails until [`Self::set_token`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that starts signed in.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self { token: RwLock::new(Some(token.into())) }
    }

    /// Replace the current token (sign in or refresh).
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.into());
        info!("session token stored");
    }

    /// Forget the token (sign out).
    pub fn clear(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        info!("session token cleared");
    }

    /// Whether a non-blank token is held.
    pub fn is_authenticated(&self) -> bool {
        self.token.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }
}

#[async_trait]
impl AccessTokenProvider for SessionTokenProvider {
    async fn access_token(&self) -> Result<String, ApiError> {
        let token = self.token.read().unwrap_or_else(PoisonError::into_inner).clone();
        match token {
            Some(token) if !token.trim().is_empty() => Ok(token),
            _ => {
                debug!("no session token, short-circuiting request");
                Err(ApiError::MissingCredential)
            }
        }
    }
}

/// Fixed token, for scripts and tests.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    /// Provider that always returns `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, ApiError> {
        Ok(self.token.clone())
    }
}
