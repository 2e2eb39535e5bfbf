use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use super::response::{ApiError, ApiResponse};

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No customers waiting in the queue")]
    EmptyQueue,

    #[error("Barber unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// Error codes for API responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotFound,
    EmptyQueue,
    ResourceUnavailable,
    ValidationError,
    DatabaseError,
    StorageError,
    ConfigError,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::EmptyQueue => "EMPTY_QUEUE",
            ErrorCode::ResourceUnavailable => "RESOURCE_UNAVAILABLE",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::StorageError => "STORAGE_ERROR",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl AppError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::EmptyQueue => ErrorCode::EmptyQueue,
            AppError::ResourceUnavailable(_) => ErrorCode::ResourceUnavailable,
            AppError::ValidationError(_) => ErrorCode::ValidationError,
            AppError::DatabaseError(_) => ErrorCode::DatabaseError,
            AppError::StorageError(_) => ErrorCode::StorageError,
            AppError::ConfigError(_) => ErrorCode::ConfigError,
            AppError::InternalError(_) => ErrorCode::InternalError,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::EmptyQueue => StatusCode::CONFLICT,
            AppError::ResourceUnavailable(_) => StatusCode::CONFLICT,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_api_error(&self) -> ApiError {
        let error_code = self.error_code().as_str();
        let message = self.to_string();

        match self {
            AppError::ValidationError(msg) => {
                ApiError::with_details(
                    message,
                    error_code,
                    json!({ "validation_errors": msg }),
                )
            }
            _ => ApiError::new(message, error_code),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Application error: {:?}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }

        let response = ApiResponse::<()>::Error(self.to_api_error());
        (status, Json(response)).into_response()
    }
}

// Result type alias
pub type AppResult<T> = Result<T, AppError>;
