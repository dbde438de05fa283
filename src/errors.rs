use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("Cart validation failed")]
    Validation(Vec<String>),

    #[error("{0}")]
    Payment(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("A checkout is already in progress")]
    Conflict,

    #[error("Sign in to continue")]
    Unauthorized,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound(what) => AppError::NotFound(format!("{what} not found")),
            DomainError::Validation(errors) => AppError::Validation(errors),
            DomainError::Payment(msg) => AppError::Payment(msg),
            e @ (DomainError::InvalidInput(_) | DomainError::InvalidTransition { .. }) => {
                AppError::BadRequest(e.to_string())
            }
            DomainError::CheckoutInProgress => AppError::Conflict,
            DomainError::Unauthenticated => AppError::Unauthorized,
            DomainError::Storage(msg) | DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Payment(_) => StatusCode::PAYMENT_REQUIRED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict => StatusCode::CONFLICT,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Validation(errors) => serde_json::json!({
                "error": self.to_string(),
                "details": errors
            }),
            AppError::Internal(msg) => {
                log::error!("Internal error: {msg}");
                serde_json::json!({ "error": "Internal server error" })
            }
            _ => serde_json::json!({ "error": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
