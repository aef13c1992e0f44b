//! Error types for the song library API
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;
use crate::songs::SongError;

// == API Error Enum ==
/// Error type returned by every HTTP handler.
///
/// Only validation messages reach the client verbatim; everything else is
/// replaced by a generic message and logged server-side.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Invalid request data, safe to expose
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Song directory (or other resource) not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Filesystem, subprocess or other internal failure
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "Resource not found".to_string()),
            ApiError::Internal(detail) => {
                error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An error occurred".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// == Conversions ==
impl From<SongError> for ApiError {
    fn from(err: SongError) -> Self {
        match err {
            SongError::NotFound => ApiError::NotFound(err.to_string()),
            SongError::Validation(msg) => ApiError::InvalidRequest(msg),
            // Search and download report fetch failures as bad requests.
            SongError::Upstream(upstream) => ApiError::InvalidRequest(upstream.to_string()),
            SongError::Songify(_) | SongError::Io(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<axum::extract::rejection::JsonRejection> for ApiError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

// == Result Type Alias ==
/// Convenience Result type for HTTP handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
