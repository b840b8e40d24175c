//! Agent Host error types.
//!
//! All errors map to HTTP status codes via the `IntoResponse` impl. Messages
//! returned to clients are intentionally generic; actual causes are logged
//! server-side.

use crate::auth::keyset::KeySetError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Agent Host error type.
///
/// Maps to HTTP status codes:
/// - Unauthenticated: 401 Unauthorized (no usable credentials)
/// - Forbidden: 403 Forbidden (credentials present but rejected)
/// - BadRequest: 400 Bad Request
/// - ServiceUnavailable: 503 Service Unavailable (e.g. key set unreachable)
/// - Internal: 500 Internal Server Error
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Authentication required: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error")]
    Internal,
}

impl HostError {
    /// Returns the HTTP status code for this error (for metrics recording).
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            HostError::Unauthenticated(_) => 401,
            HostError::Forbidden(_) => 403,
            HostError::BadRequest(_) => 400,
            HostError::ServiceUnavailable(_) => 503,
            HostError::Internal => 500,
        }
    }
}

/// A failed key set fetch is an operational problem, not a bad token.
impl From<KeySetError> for HostError {
    fn from(err: KeySetError) -> Self {
        HostError::ServiceUnavailable(err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for HostError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            HostError::Unauthenticated(reason) => {
                tracing::debug!(target: "agent.errors", reason = %reason, "Request unauthenticated");
                (
                    StatusCode::UNAUTHORIZED,
                    "AUTHENTICATION_REQUIRED",
                    "Authentication required".to_string(),
                )
            }
            HostError::Forbidden(reason) => {
                tracing::debug!(target: "agent.errors", reason = %reason, "Request forbidden");
                (
                    StatusCode::FORBIDDEN,
                    "INVALID_TOKEN",
                    "Invalid token".to_string(),
                )
            }
            HostError::BadRequest(reason) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", reason.clone())
            }
            HostError::ServiceUnavailable(reason) => {
                // Log actual reason server-side, return generic message
                tracing::warn!(target: "agent.availability", reason = %reason, "Service unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Service temporarily unavailable".to_string(),
                )
            }
            HostError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        let mut response = (status, Json(error_response)).into_response();

        // Add WWW-Authenticate header for 401 responses
        if status == StatusCode::UNAUTHORIZED {
            if let Ok(header_value) =
                "Bearer realm=\"agent-host-api\", error=\"invalid_token\"".parse()
            {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        response
    }
}
