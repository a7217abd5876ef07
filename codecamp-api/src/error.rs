//! Error types for codecamp-api
//!
//! Every handler returns [`ApiResult`]; this module alone decides which status
//! code each outcome gets.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::repository::RepositoryError;

/// Generic message for server-side failures; details stay in the log
const UNEXPECTED_FAILURE_MESSAGE: &str = "Database Failure";

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Requested moniker/id has no entity (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller-supplied state violates a precondition (400)
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Commit reached the store but had no effect (400)
    #[error("Persistence rejected: {0}")]
    PersistenceRejected(String),

    /// Anything else that went wrong while talking to storage (500)
    #[error("Unexpected failure: {0}")]
    Unexpected(#[from] RepositoryError),
}

impl ApiError {
    /// Single-message validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(vec![message.into()])
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, Vec::new()),
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_FAILED",
                errors.join(" "),
                errors,
            ),
            ApiError::PersistenceRejected(msg) => (
                StatusCode::BAD_REQUEST,
                "PERSISTENCE_REJECTED",
                msg,
                Vec::new(),
            ),
            ApiError::Unexpected(err) => {
                error!("Request failed: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    UNEXPECTED_FAILURE_MESSAGE.to_string(),
                    Vec::new(),
                )
            }
        };

        let mut error = json!({
            "code": error_code,
            "message": message,
        });
        if !details.is_empty() {
            error["details"] = json!(details);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
