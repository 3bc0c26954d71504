//! Error types for the safety core.
//!
//! Three kinds cover the whole surface: the caller sent a bad
//! coordinate, the upstream point-of-interest source failed, or the SOS
//! publish channel refused an alert. Each maps to a distinct HTTP status
//! so clients can tell "fix your request" from "retry later".

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Errors produced by the locator, scorer, and SOS broadcaster.
#[derive(Debug, Error)]
pub enum SafetyError {
    /// Missing or malformed coordinate. The caller's fault; not
    /// retryable without changing the request.
    #[error("{0}")]
    InvalidArgument(String),

    /// The external resource query failed, timed out, or returned
    /// malformed data. May be retried by the caller with backoff.
    #[error("upstream resource query failed: {0}")]
    UpstreamUnavailable(String),

    /// The SOS publish channel could not accept the alert. Surfaced to
    /// the triggering caller so the client can fall back to another
    /// notification path; an SOS must never disappear unnoticed.
    #[error("failed to broadcast SOS alert: {0}")]
    BroadcastFailure(String),
}

impl SafetyError {
    /// HTTP status this error maps to at the API boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            SafetyError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            SafetyError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            SafetyError::BroadcastFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for SafetyError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "success": false,
            "message": self.to_string(),
        }));
        (self.status_code(), body).into_response()
    }
}
