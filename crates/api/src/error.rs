//! API error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use leadline_billing::BillingError;

/// Errors surfaced by API handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("database error: {0}")]
    Database(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Billing(#[from] BillingError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            // The lock state is structured data: callers branch on it, they
            // never string-match the message.
            ApiError::Billing(BillingError::UsageLocked {
                lock_reason,
                membership_state,
            }) => {
                let body = json!({
                    "error": "usage_locked",
                    "lock_reason": lock_reason,
                    "membership_state": membership_state,
                });
                (StatusCode::PAYMENT_REQUIRED, Json(body)).into_response()
            }
            ApiError::Billing(BillingError::InvalidRequest(message))
            | ApiError::InvalidRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": message })),
            )
                .into_response(),
            ApiError::Billing(BillingError::NotFound(message)) | ApiError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": message })),
            )
                .into_response(),
            ApiError::Database(message) => {
                tracing::error!(error = %message, "database error");
                internal_error()
            }
            ApiError::Billing(err) => {
                tracing::error!(error = %err, "billing error");
                internal_error()
            }
        }
    }
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "internal server error" })),
    )
        .into_response()
}
