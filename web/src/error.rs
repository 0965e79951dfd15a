//! Error types for web handlers.
//!
//! [`AppError`] bridges [`LedgerError`] and validation failures to HTTP
//! responses by implementing Axum's `IntoResponse`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;
use stockcart_core::LedgerError;

/// Message returned for every 5xx response; the detail is only logged.
pub const INTERNAL_MESSAGE: &str = "Something went wrong in server!";

/// Application error type for web handlers.
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: &'static str,
    /// Ledger error behind this response (logged, not exposed)
    source: Option<LedgerError>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: &'static str) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message.into(), "BAD_REQUEST")
    }

    /// HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Client-facing error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let (status, code) = match &err {
            LedgerError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            LedgerError::InvalidSku => (StatusCode::BAD_REQUEST, "INVALID_SKU"),
            LedgerError::InvalidCount => (StatusCode::BAD_REQUEST, "INVALID_COUNT"),
            LedgerError::InvalidUserId => (StatusCode::BAD_REQUEST, "INVALID_USER_ID"),
            LedgerError::InsufficientStock => {
                (StatusCode::PRECONDITION_FAILED, "INSUFFICIENT_STOCK")
            },
            LedgerError::AlreadyClaimed => (StatusCode::CONFLICT, "ALREADY_CLAIMED"),
            LedgerError::Timeout => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
            LedgerError::UnknownEventType(_) | LedgerError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR")
            },
        };
        let message = if status.is_server_error() {
            INTERNAL_MESSAGE.to_string()
        } else {
            err.to_string()
        };

        Self {
            status,
            message,
            code,
            source: Some(err),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: &'static str,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    error = %source,
                    "Internal server error"
                ),
                None => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    "Internal server error"
                ),
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}
