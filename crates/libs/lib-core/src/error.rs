//! # Centralized Error Handling
//!
//! Application-wide error type [`AppError`] used across all backend modules,
//! following the `thiserror` pattern.
//!
//! Every error is local to the triggering request; none is fatal to the
//! process. Each variant maps to an HTTP status code, and the
//! `InsufficientBalance` response carries a purchase-flow redirect hint so
//! clients can send the user to the coin store.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Convenience type alias for `Result<T, AppError>`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Path clients should redirect to when a paid action is refused for lack of coins.
pub const PURCHASE_REDIRECT: &str = "/coins/purchase";

/// Application-wide error type covering all error scenarios.
#[derive(Debug, Error)]
pub enum AppError {
    /// No valid session for a request that requires one.
    ///
    /// **HTTP Status**: 401 Unauthorized
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Cached balance does not cover the tool price. No debit was attempted.
    ///
    /// **HTTP Status**: 402 Payment Required (response carries a redirect hint)
    #[error("Insufficient balance: need {needed} coins, have {available}")]
    InsufficientBalance { needed: i64, available: i64 },

    /// The debit (reserve/commit/release) step itself failed.
    ///
    /// **HTTP Status**: 502 Bad Gateway
    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    /// A tool pipeline run failed after a successful reserve.
    ///
    /// **HTTP Status**: 422 Unprocessable Entity
    #[error("Processing error: {0}")]
    Processing(String),

    /// Writing a promoted asset (object file or metadata record) failed.
    ///
    /// **HTTP Status**: 500 Internal Server Error
    #[error("Upload error: {0}")]
    Upload(String),

    /// An external data source (market, news) could not be reached.
    ///
    /// **HTTP Status**: 502 Bad Gateway
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// An external reply could not be parsed (malformed payload, no JSON object).
    ///
    /// **HTTP Status**: 502 Bad Gateway
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid user input validation error.
    ///
    /// **HTTP Status**: 400 Bad Request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Requested resource not found.
    ///
    /// **HTTP Status**: 404 Not Found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration error during startup or environment loading.
    ///
    /// **HTTP Status**: 500 Internal Server Error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (unexpected failures).
    ///
    /// **HTTP Status**: 500 Internal Server Error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::InsufficientBalance { .. } => StatusCode::PAYMENT_REQUIRED,
            AppError::PaymentFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::Processing(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Fetch(_) | AppError::Parse(_) => StatusCode::BAD_GATEWAY,
            AppError::Upload(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a user-friendly error message.
    ///
    /// Internal errors return a generic message to avoid exposing
    /// implementation details.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Unauthenticated(_) => "Please sign in to use this tool".to_string(),
            AppError::InsufficientBalance { needed, available } => {
                format!("This tool costs {} coins, you have {}", needed, available)
            }
            AppError::PaymentFailed(_) => "Payment could not be completed".to_string(),
            AppError::Processing(msg) => msg.clone(),
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Fetch(_) | AppError::Parse(_) => {
                "Data source temporarily unavailable".to_string()
            }
            AppError::Upload(_) | AppError::Config(_) | AppError::Internal(_) => {
                "An internal error occurred".to_string()
            }
        }
    }

    /// Stable error code string used in response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthenticated(_) => "Unauthenticated",
            AppError::InsufficientBalance { .. } => "InsufficientBalance",
            AppError::PaymentFailed(_) => "PaymentFailed",
            AppError::Processing(_) => "ProcessingError",
            AppError::Upload(_) => "UploadError",
            AppError::Fetch(_) => "FetchError",
            AppError::Parse(_) => "ParseError",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::NotFound(_) => "NotFound",
            AppError::Config(_) => "Config",
            AppError::Internal(_) => "Internal",
        }
    }
}

/// Implement Axum's `IntoResponse` for automatic error handling.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.user_message();

        // Full error detail goes to server logs, not the client
        match status {
            StatusCode::BAD_REQUEST
            | StatusCode::UNAUTHORIZED
            | StatusCode::PAYMENT_REQUIRED
            | StatusCode::NOT_FOUND
            | StatusCode::UNPROCESSABLE_ENTITY => {
                tracing::debug!("Client error: {}", self);
            }
            _ => {
                tracing::error!("Server error: {}", self);
            }
        }

        let mut body = json!({
            "error": message,
            "code": self.code(),
        });

        if let AppError::InsufficientBalance { .. } = self {
            body["redirect"] = json!(PURCHASE_REDIRECT);
        }

        (status, Json(body)).into_response()
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Convert `sqlx::Error` to `AppError`.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => {
                AppError::NotFound("Database record not found".to_string())
            }
            sqlx::Error::Database(db_err) => {
                AppError::Internal(format!("Database error: {}", db_err.message()))
            }
            _ => AppError::Internal(format!("Database error: {}", err)),
        }
    }
}

/// Convert `serde_json::Error` to `AppError`.
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(format!("JSON error: {}", err))
    }
}
