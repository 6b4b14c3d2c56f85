use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Insufficient points: requested {requested}, available {available}")]
    InsufficientPoints { requested: i64, available: i64 },

    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: i64, available: i64 },

    #[error("Loyalty program unavailable")]
    LoyaltyUnavailable,

    #[error("Storage error: {0}")]
    StorageError(#[from] std::io::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::InsufficientPoints { .. } => "INSUFFICIENT_POINTS",
            AppError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            AppError::LoyaltyUnavailable => "LOYALTY_UNAVAILABLE",
            AppError::StorageError(_) => "STORAGE_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        use actix_web::http::StatusCode;

        let (status_code, message) = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => {
                log::warn!("Conflict: {msg}");
                (StatusCode::CONFLICT, msg.clone())
            }
            AppError::InsufficientPoints { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "Insufficient points".to_string())
            }
            AppError::InsufficientBalance { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Insufficient wallet balance".to_string(),
            ),
            AppError::LoyaltyUnavailable => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Loyalty program unavailable".to_string(),
            ),
            AppError::StorageError(err) => {
                log::error!("Storage error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Storage error".to_string(),
                )
            }
            _ => {
                log::error!("Internal error: {self}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        HttpResponse::build(status_code).json(json!({
            "success": false,
            "error": {
                "code": self.error_code(),
                "message": message
            }
        }))
    }
}
