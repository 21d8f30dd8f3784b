//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service.

use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;
use tutor_core::ports::PortError;
use utoipa::ToSchema;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An uploaded audio payload that cannot be processed.
    #[error("Audio processing error: {0}")]
    Audio(String),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        ApiError::Port(PortError::Validation(message.into()))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::Port(PortError::NotFound(message.into()))
    }

    /// The HTTP status and machine-readable code reported for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Port(PortError::Validation(_)) => (StatusCode::BAD_REQUEST, "invalid_request"),
            ApiError::Audio(_) => (StatusCode::BAD_REQUEST, "audio_processing_error"),
            ApiError::Port(PortError::NotFound(_)) => (StatusCode::NOT_FOUND, "resource_not_found"),
            ApiError::Port(PortError::Provider(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "ai_service_error")
            }
            ApiError::Port(PortError::Storage(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_error")
            }
            ApiError::Port(PortError::Unexpected(_))
            | ApiError::Config(_)
            | ApiError::Io(_)
            | ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

/// The JSON body returned for every failed request.
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `"error"`.
    pub status: String,
    pub status_code: u16,
    pub message: String,
    pub error_code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();
        if status.is_server_error() {
            error!(error_code, "Request failed: {}", self);
        }

        let body = ErrorResponse {
            status: "error".to_string(),
            status_code: status.as_u16(),
            message: self.to_string(),
            error_code: error_code.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_errors_map_to_distinct_statuses() {
        let cases = [
            (ApiError::invalid_request("bad"), 400, "invalid_request"),
            (ApiError::Audio("empty".into()), 400, "audio_processing_error"),
            (ApiError::not_found("nope"), 404, "resource_not_found"),
            (ApiError::Port(PortError::Provider("down".into())), 503, "ai_service_error"),
            (ApiError::Port(PortError::Storage("disk".into())), 500, "storage_error"),
            (ApiError::Internal("boom".into()), 500, "internal_error"),
        ];
        for (error, status, code) in cases {
            let (actual_status, actual_code) = error.status_and_code();
            assert_eq!(actual_status.as_u16(), status);
            assert_eq!(actual_code, code);
        }
    }
}
