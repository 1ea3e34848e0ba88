//! HTTP error type for civic-server
//!
//! Validation and not-found errors carry their message to the caller;
//! internal failures are logged and answered with a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// One failing field of a request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: String,
    pub code: String,
    pub message: String,
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body failed schema validation (400)
    #[error("Invalid input data")]
    Validation(Vec<FieldIssue>),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Upload exceeds the configured ceiling (413)
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    /// civic-common error (storage, configuration)
    #[error("Common error: {0}")]
    Common(#[from] civic_common::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) | ApiError::Other(_) | ApiError::Common(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            ApiError::Validation(details) => json!({
                "error": {
                    "code": "VALIDATION_ERROR",
                    "message": "Invalid input data",
                    "details": details,
                }
            }),
            ApiError::BadRequest(msg) => json!({
                "error": { "code": "BAD_REQUEST", "message": msg }
            }),
            ApiError::NotFound(msg) => json!({
                "error": { "code": "NOT_FOUND", "message": msg }
            }),
            ApiError::PayloadTooLarge(msg) => json!({
                "error": { "code": "PAYLOAD_TOO_LARGE", "message": msg }
            }),
            ApiError::Internal(ref msg) => {
                tracing::error!(error = %msg, "Request failed with internal error");
                internal_body()
            }
            ApiError::Other(ref err) => {
                tracing::error!(error = %err, "Request failed with unexpected error");
                internal_body()
            }
            ApiError::Common(ref err) => {
                tracing::error!(error = %err, "Request failed in storage or configuration layer");
                internal_body()
            }
        };

        (status, Json(body)).into_response()
    }
}

fn internal_body() -> serde_json::Value {
    json!({
        "error": {
            "code": "INTERNAL_ERROR",
            "message": "An unexpected error occurred",
        }
    })
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
