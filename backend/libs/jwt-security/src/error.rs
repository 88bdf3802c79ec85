//! Error taxonomy shared by every service that issues or checks tokens.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing token")]
    MissingToken,

    /// Bad signature, malformed structure, foreign algorithm or missing
    /// identity claims.
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    ExpiredToken,

    #[error("Token revoked")]
    RevokedToken,

    #[error("Too many login attempts")]
    TooManyAttempts,

    /// Unknown identity and wrong secret are deliberately indistinguishable.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Startup only: the process must refuse to run with this secret.
    #[error("Weak signing secret: {0}")]
    WeakSigningSecret(String),

    /// Startup only.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Shared store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Category string that is safe to put on the wire.
    ///
    /// The display text of some variants carries internal detail; only this
    /// value may cross a network boundary.
    pub fn category(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::InvalidToken => "invalid_token",
            AuthError::ExpiredToken => "expired_token",
            AuthError::RevokedToken => "revoked_token",
            AuthError::TooManyAttempts => "too_many_attempts",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::StoreUnavailable(_) => "service_unavailable",
            AuthError::WeakSigningSecret(_)
            | AuthError::Configuration(_)
            | AuthError::Internal(_) => "internal_error",
        }
    }

    /// True for the token-related failures a caller reports as "unauthenticated".
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            AuthError::MissingToken
                | AuthError::InvalidToken
                | AuthError::ExpiredToken
                | AuthError::RevokedToken
                | AuthError::InvalidCredentials
        )
    }
}

impl From<crate::store::StoreError> for AuthError {
    fn from(err: crate::store::StoreError) -> Self {
        AuthError::StoreUnavailable(err.to_string())
    }
}
