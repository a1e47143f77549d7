//! Error handling module for the CSR backend.
//!
//! Provides centralized error types with mapping to HTTP status codes and the JSON error payload.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const UPSTREAM_ERROR: &str = "UPSTREAM_ERROR";
    pub const GENERATION_FAILED: &str = "GENERATION_FAILED";
    pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// Authentication required
    Unauthorized(String),
    /// Referenced entity is absent
    NotFound(String),
    /// A write broke a record invariant
    Validation(String),
    /// Malformed request payload
    BadRequest(String),
    /// Data-access failure (managed backend or local store)
    Upstream(String),
    /// Completion API failure or timeout
    Generation(String),
    /// Invalid configuration
    Config(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Generation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => codes::UNAUTHORIZED,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
            AppError::Upstream(_) => codes::UPSTREAM_ERROR,
            AppError::Generation(_) => codes::GENERATION_FAILED,
            AppError::Config(_) => codes::CONFIG_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> &str {
        match self {
            AppError::Unauthorized(msg)
            | AppError::NotFound(msg)
            | AppError::Validation(msg)
            | AppError::BadRequest(msg)
            | AppError::Upstream(msg)
            | AppError::Generation(msg)
            | AppError::Config(msg) => msg,
        }
    }

    /// Keep not-found and validation errors as they are, collapse everything else into
    /// the given generic failure.
    pub fn or_generic(self, generic: impl FnOnce() -> AppError) -> AppError {
        match self {
            AppError::NotFound(_) | AppError::Validation(_) | AppError::BadRequest(_) => self,
            other => {
                tracing::error!("Request failed: {}", other);
                generic()
            }
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AppError::Upstream(format!("Database error: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        tracing::error!("HTTP client error: {:?}", err);
        AppError::Upstream(format!("HTTP client error: {}", err))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected JSON body: {}", rejection.body_text());
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!("Rejected query string: {}", rejection.body_text());
        AppError::BadRequest(rejection.body_text())
    }
}

/// Error response payload: `{ "error": ..., "code": ... }`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        Self {
            error: error.message().to_string(),
            code: error.error_code().to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(ErrorResponse::new(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Generation("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_bad_request_is_kept_by_or_generic() {
        let err = AppError::BadRequest("Expected request with `Content-Type: application/json`".into())
            .or_generic(|| AppError::Generation("Error generating summary".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), codes::BAD_REQUEST);
    }

    #[test]
    fn test_or_generic_keeps_not_found() {
        let err = AppError::NotFound("Event not found".into())
            .or_generic(|| AppError::Generation("Error generating summary".into()));
        assert_eq!(err.error_code(), codes::NOT_FOUND);
        assert_eq!(err.message(), "Event not found");
    }

    #[test]
    fn test_or_generic_hides_upstream_detail() {
        let err = AppError::Upstream("connection refused to 10.0.0.3".into())
            .or_generic(|| AppError::Upstream("Error matching volunteers".into()));
        assert_eq!(err.message(), "Error matching volunteers");
    }

    #[test]
    fn test_error_payload_shape() {
        let body = serde_json::to_value(ErrorResponse::new(&AppError::Generation(
            "Error generating content".into(),
        )))
        .unwrap();
        assert_eq!(body["error"], "Error generating content");
        assert_eq!(body["code"], "GENERATION_FAILED");
    }
}
