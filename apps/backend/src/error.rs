//! Error handling for the backend API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use flashcard_core::SessionError;

use crate::services::retry::GenerationError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl ApiError {
    fn status_and_type(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ApiError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            ApiError::Migration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "migration_error"),
            ApiError::Generation(e) => match e {
                GenerationError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
                GenerationError::ServiceUnavailable => {
                    (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable")
                }
                GenerationError::InvalidCredentials => {
                    (StatusCode::BAD_GATEWAY, "invalid_credentials")
                }
                GenerationError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
                GenerationError::Upstream(_) => (StatusCode::BAD_GATEWAY, "upstream_error"),
            },
            ApiError::Session(e) => match e {
                SessionError::SessionMismatch { .. } => (StatusCode::FORBIDDEN, "session_mismatch"),
                SessionError::NoActiveSession => (StatusCode::NOT_FOUND, "no_active_session"),
                SessionError::NotCurrentCard { .. } => (StatusCode::CONFLICT, "not_current_card"),
                SessionError::AlreadyComplete => (StatusCode::CONFLICT, "session_complete"),
                SessionError::NotComplete { .. } => (StatusCode::CONFLICT, "session_incomplete"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_type();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

/// Result type alias for API operations
pub type Result<T> = std::result::Result<T, ApiError>;
