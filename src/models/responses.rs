//! Response DTOs for the song API
//!
//! Defines the structure of outgoing HTTP response bodies that are not song
//! library types.

use serde::Serialize;

/// Response body for the health endpoint (GET /api/health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status, always "ok"
    pub status: String,
    /// Crate version
    pub version: String,
    /// Friendly banner
    pub message: String,
}

impl HealthResponse {
    /// Creates the healthy response for this build
    pub fn healthy() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            message: "Resonance Lab API is rockin'!".to_string(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
