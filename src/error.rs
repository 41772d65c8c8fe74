use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    payments::{PaymentError, signature::SignatureError},
    response::{ApiResponse, Meta},
};

pub const NOT_AUTHORIZED: &str = "You are not Authorized to access this URL.";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Storefront routes reached without a session.
    #[error("You must login first!")]
    LoginRequired,

    /// Admin routes reached by anyone but an admin.
    #[error("You are not Authorized to access this URL.")]
    Forbidden,

    #[error("{0}")]
    Payment(#[from] PaymentError),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::LoginRequired => (StatusCode::UNAUTHORIZED, self.to_string()),
            // Plain-text bodies: a denial, and the provider's own words.
            AppError::Forbidden => return (StatusCode::FORBIDDEN, NOT_AUTHORIZED).into_response(),
            AppError::Payment(err) => {
                tracing::warn!(error = %err, "checkout session rejected");
                return (StatusCode::BAD_GATEWAY, err.to_string()).into_response();
            }
            AppError::OrmError(err) => {
                tracing::error!(error = %err, "database error");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = ApiResponse {
            message,
            data: Some(ErrorData {
                error: self.to_string(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Failures of the payment provider webhook. Every client-side failure is
/// answered with `400 {}` and leaves the datastore untouched.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("payload exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error("missing signature header")]
    MissingSignature,

    #[error("invalid signature: {0}")]
    Signature(#[from] SignatureError),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        match self {
            // Provider retries on 5xx; the fulfillment transaction was rolled back.
            WebhookError::Db(err) => {
                tracing::error!(error = %err, "webhook fulfillment failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            other => {
                tracing::warn!(error = %other, "webhook rejected");
                (StatusCode::BAD_REQUEST, axum::Json(serde_json::json!({}))).into_response()
            }
        }
    }
}
