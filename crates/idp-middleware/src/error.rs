//! # Gate Error Types
//!
//! Rejections produced by the request gates, rendered as the JSON error
//! envelope used across the service:
//!
//! ```text
//! {"error": {"code": "UNAUTHORIZED", "message": "No auth token provided"}}
//! ```
//!
//! The message is whatever reason the gate settled on. Gates decide how much
//! detail to put there; this type never adds internal error text on its own.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (`UNAUTHORIZED`, `FORBIDDEN`, ...).
    pub code: String,
    /// Human-readable reason.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorBody {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.to_string(),
                message: message.into(),
                details: None,
            },
        }
    }
}

/// A gate decided the request may not proceed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// Authentication failure (401).
    #[error("{0}")]
    Unauthorized(String),

    /// Authorization failure: authenticated but lacking scopes (403).
    #[error("{0}")]
    Forbidden(String),
}

impl GateError {
    /// HTTP status code and machine-readable error code.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        }
    }

    /// The rejection reason sent to the caller.
    pub fn reason(&self) -> &str {
        match self {
            Self::Unauthorized(reason) | Self::Forbidden(reason) => reason,
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        (status, Json(ErrorBody::new(code, self.reason()))).into_response()
    }
}
