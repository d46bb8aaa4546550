//! Application Error Types
//!
//! Centralized error handling with Axum integration.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

/// Field-level validation error
#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl AppError {
    /// HTTP status and numeric error code for this error.
    pub fn status_and_code(&self) -> (StatusCode, u16) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, 10001),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, 10002),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, 10003),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, 10004),
            AppError::Conflict(_) => (StatusCode::CONFLICT, 10005),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, 10007),
            AppError::Internal(_) | AppError::Database(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, 10000)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match self {
            AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::Conflict(msg)
            | AppError::Validation(msg) => msg,
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".into()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                "Internal server error".into()
            }
        };

        let body = ErrorResponse {
            code,
            message,
            errors: None,
        };

        (status, Json(body)).into_response()
    }
}
