// src/errors.rs
// DOCUMENTATION: Custom error types and HTTP responses
// PURPOSE: Centralized error handling for every gallery service

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

/// Application-specific error types
/// DOCUMENTATION: Each variant maps to an HTTP status code and a JSON body
/// carrying a human readable `message`
#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Upstream error: {0}")]
    UpstreamError(String),

    #[error("Upstream timed out: {0}")]
    GatewayTimeout(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Queue error: {0}")]
    QueueError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl GalleryError {
    fn code(&self) -> &'static str {
        match self {
            GalleryError::NotFound(_) => "NOT_FOUND",
            GalleryError::AlreadyExists(_) => "ALREADY_EXISTS",
            GalleryError::DatabaseError(_) => "DATABASE_ERROR",
            GalleryError::InvalidInput(_) => "INVALID_INPUT",
            GalleryError::ValidationError(_) => "VALIDATION_ERROR",
            GalleryError::Unauthorized(_) => "UNAUTHORIZED",
            GalleryError::Forbidden(_) => "FORBIDDEN",
            GalleryError::Conflict(_) => "CONFLICT",
            GalleryError::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            GalleryError::UpstreamError(_) => "UPSTREAM_ERROR",
            GalleryError::GatewayTimeout(_) => "GATEWAY_TIMEOUT",
            GalleryError::StorageError(_) => "STORAGE_ERROR",
            GalleryError::QueueError(_) => "QUEUE_ERROR",
            GalleryError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Map a sqlx error, turning unique violations into `AlreadyExists`
    pub fn from_db(err: sqlx::Error, context: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.code().as_deref() == Some("23505") {
                return GalleryError::AlreadyExists(format!("{} already exists", context));
            }
        }
        GalleryError::DatabaseError(format!("{} failed: {}", context, err))
    }
}

/// Convert GalleryError to HTTP response
impl ResponseError for GalleryError {
    fn error_response(&self) -> HttpResponse {
        let body = json!({
            "message": self.to_string(),
            "error": {
                "code": self.code(),
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        });

        HttpResponse::build(self.status_code()).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            GalleryError::NotFound(_) => StatusCode::NOT_FOUND,
            // Duplicate registrations answer 400, same as other bad input
            GalleryError::AlreadyExists(_) => StatusCode::BAD_REQUEST,
            GalleryError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GalleryError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            GalleryError::ValidationError(_) => StatusCode::BAD_REQUEST,
            GalleryError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            GalleryError::Forbidden(_) => StatusCode::FORBIDDEN,
            GalleryError::Conflict(_) => StatusCode::CONFLICT,
            GalleryError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            GalleryError::UpstreamError(_) => StatusCode::BAD_GATEWAY,
            GalleryError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            GalleryError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GalleryError::QueueError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GalleryError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
