//! Auth errors

use thiserror::Error;

/// Authentication and request bootstrap errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Invalid token (malformed, bad signature, etc.)
    #[error("invalid token")]
    InvalidToken,

    /// Token has expired
    #[error("token expired")]
    TokenExpired,

    /// Token was issued to a different network address
    #[error("token was issued for another address")]
    AddressMismatch,

    /// CSRF token missing or wrong
    #[error("invalid CSRF token")]
    InvalidCsrfToken,

    /// Session was stopped by an administrator
    #[error("session stopped: {0}")]
    SessionStopped(String),

    /// Session is not known to the session store
    #[error("session expired or unknown")]
    SessionExpired,

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidToken
            | Self::TokenExpired
            | Self::AddressMismatch
            | Self::SessionExpired => 401,
            Self::InvalidCsrfToken => 400,
            Self::SessionStopped(_) => 503,
            Self::Database(_) | Self::Configuration(_) | Self::Internal(_) => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::AddressMismatch => "ADDRESS_MISMATCH",
            Self::InvalidCsrfToken => "INVALID_CSRF_TOKEN",
            Self::SessionStopped(_) => "SESSION_STOPPED",
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether this error means the caller failed to authenticate
    pub fn is_authentication_failure(&self) -> bool {
        self.status_code() == 401
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        tracing::debug!("Token validation failed: {}", err);
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::TokenExpired,
            _ => Self::InvalidToken,
        }
    }
}
