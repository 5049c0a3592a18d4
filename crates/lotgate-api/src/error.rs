//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps lifecycle rejections to HTTP status codes and returns JSON bodies
//! with a stable error code. Audit failures surface as 500 without detail.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lotgate_core::{Rejection, ValidationError};
use lotgate_engine::LifecycleError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "ROLE_DENIED", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional structured context, when there is any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid principal identity (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The lifecycle refused the request.
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Rejected(r) => (rejection_status(r), r.code()),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Rejected(Rejection::IntervalNotReached {
                elapsed_secs,
                required_secs,
                ..
            }) => Some(serde_json::json!({
                "elapsed_secs": elapsed_secs,
                "required_secs": required_secs,
            })),
            Self::Rejected(Rejection::InsufficientTier { tier, required, .. }) => {
                Some(serde_json::json!({ "tier": tier, "required": required }))
            }
            _ => None,
        }
    }
}

fn rejection_status(rejection: &Rejection) -> StatusCode {
    match rejection {
        Rejection::InsufficientTier { .. }
        | Rejection::RoleDenied { .. }
        | Rejection::NotSupervisor { .. } => StatusCode::FORBIDDEN,
        Rejection::SystemHalted => StatusCode::SERVICE_UNAVAILABLE,
        Rejection::IntervalNotReached { .. } => StatusCode::TOO_MANY_REQUESTS,
        Rejection::InvalidStateTransition { .. } | Rejection::DuplicateBatch { .. } => {
            StatusCode::CONFLICT
        }
        Rejection::UnknownBatch { .. } => StatusCode::NOT_FOUND,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Rejected(r) => Self::Rejected(r),
            LifecycleError::Audit(e) => Self::Internal(e.to_string()),
        }
    }
}
