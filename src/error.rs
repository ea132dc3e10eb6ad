// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// App id, API key or host for the remote account service is not set.
    #[error("Remote account service is not configured")]
    RemoteServiceUnconfigured,

    /// The remote account service answered with a non-2xx status.
    #[error("Remote request failed with status {status}: {body}")]
    RemoteRequestFailed { status: u16, body: String },

    /// The remote could not be reached, or its answer could not be decoded.
    #[error("Remote account service unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// Not a hard failure: the user must finish out-of-band verification and retry.
    #[error("Remote account verification is still pending")]
    PendingVerification,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True when the remote rejected the bearer token and the user has to reconnect.
    pub fn is_reconnect_required(&self) -> bool {
        matches!(self, AppError::RemoteRequestFailed { status: 401, .. })
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::RemoteServiceUnconfigured => {
                tracing::error!("Remote account service credentials not configured");
                (StatusCode::SERVICE_UNAVAILABLE, "remote_unconfigured", None)
            }
            AppError::RemoteRequestFailed { status: 401, .. } => (
                StatusCode::UNAUTHORIZED,
                "reconnect_required",
                Some("Remote account token rejected, reconnect needed".to_string()),
            ),
            AppError::RemoteRequestFailed { status, body } => {
                tracing::warn!(status, body = %body, "Remote account request failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "remote_error",
                    Some(format!("HTTP {}: {}", status, body)),
                )
            }
            AppError::RemoteUnavailable(msg) => (
                StatusCode::BAD_GATEWAY,
                "remote_unavailable",
                Some(msg.clone()),
            ),
            AppError::PreconditionFailed(msg) => (
                StatusCode::CONFLICT,
                "precondition_failed",
                Some(msg.clone()),
            ),
            AppError::PendingVerification => (
                StatusCode::ACCEPTED,
                "pending_verification",
                Some("Complete the verification sent by the remote service, then retry".to_string()),
            ),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
