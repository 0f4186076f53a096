//! Error responses for the middleware and extractors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use renovation_auth_core::AuthError;
use serde::Serialize;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// Site auth failures as seen by handlers.
#[derive(Debug, thiserror::Error)]
pub enum SiteAuthError {
    /// Bootstrap step failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The handler requires token authentication.
    #[error("bearer token required")]
    TokenRequired,

    /// Extractor used on a route without the layer.
    #[error("site auth layer not installed")]
    MissingLayer,

    /// Form body could not be buffered (too large or broken stream).
    #[error("request body could not be read")]
    UnreadableBody,
}

impl SiteAuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Auth(err) => {
                StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Self::TokenRequired => StatusCode::UNAUTHORIZED,
            Self::MissingLayer => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UnreadableBody => StatusCode::BAD_REQUEST,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Auth(err) => err.error_code(),
            Self::TokenRequired => "TOKEN_REQUIRED",
            Self::MissingLayer => "INTERNAL_ERROR",
            Self::UnreadableBody => "INVALID_REQUEST_BODY",
        }
    }
}

impl IntoResponse for SiteAuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status.is_server_error() {
            tracing::error!(error = ?self, "Site auth error");
            "internal error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}
