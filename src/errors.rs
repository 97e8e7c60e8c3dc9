use actix_web::HttpResponse;
use serde_json::json;
use thiserror::Error;

use crate::domain::errors::DomainError;
use crate::domain::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    ProductNotFound(String),

    #[error("{0}")]
    OrderNotFound(String),

    #[error("Invalid input: {0}")]
    Validation(ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::ProductNotFound(_) | DomainError::UnknownProduct(_) => {
                AppError::ProductNotFound(e.to_string())
            }
            DomainError::OrderNotFound(_) => AppError::OrderNotFound(e.to_string()),
            DomainError::Validation(errors) => AppError::Validation(errors),
            DomainError::OrderDetailMismatch { .. } => AppError::BadRequest(e.to_string()),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            AppError::OrderNotFound(_) => "ORDER_NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::ProductNotFound(msg) | AppError::OrderNotFound(msg) => {
                HttpResponse::NotFound().json(json!({
                    "error": self.code(),
                    "message": msg
                }))
            }
            AppError::Validation(errors) => HttpResponse::BadRequest().json(json!({
                "error": self.code(),
                "message": errors.to_string(),
                "errors": errors.to_json()
            })),
            AppError::BadRequest(msg) => HttpResponse::BadRequest().json(json!({
                "error": self.code(),
                "message": msg
            })),
            AppError::Internal(msg) => {
                log::error!(target: "gateway", "Unhandled failure: {}", msg);
                HttpResponse::InternalServerError().json(json!({
                    "error": self.code(),
                    "message": "Internal server error"
                }))
            }
        }
    }
}
