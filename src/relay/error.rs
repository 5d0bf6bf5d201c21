//! Relay error taxonomy.
//!
//! Client input errors answer with a `4xx`. Anything that stops the round
//! trip to the upstream from completing answers `500 Proxy failed`.
//! Upstream `4xx`/`5xx` responses are not errors here; they are relayed.

use axum::{
    extract::rejection::{BytesRejection, FailedToBufferBody},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    /// No `url` parameter, no path suffix, and the policy is `reject`.
    #[error("Missing url parameter")]
    MissingTarget,

    /// The `url` parameter is not an absolute http(s) URL.
    #[error("Invalid url parameter: {0}")]
    InvalidTarget(String),

    /// The inbound body could not be read.
    #[error("Unreadable request body: {0}")]
    RequestBody(#[source] BytesRejection),

    /// The inbound body ran past `security.max_body_size` while streaming.
    #[error("Request body too large: {0}")]
    PayloadTooLarge(#[source] BytesRejection),

    /// The upstream round trip failed (connect, DNS, timeout, body read).
    #[error("Proxy failed: {0}")]
    Upstream(#[from] reqwest::Error),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MissingTarget | RelayError::InvalidTarget(_) | RelayError::RequestBody(_) => {
                StatusCode::BAD_REQUEST
            }
            RelayError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            RelayError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::MissingTarget => "missing_target",
            RelayError::InvalidTarget(_) => "invalid_target",
            RelayError::RequestBody(_) => "request_body",
            RelayError::PayloadTooLarge(_) => "payload_too_large",
            RelayError::Upstream(_) => "upstream_failed",
        }
    }

    /// JSON payload returned to the caller.
    pub fn payload(&self) -> Value {
        match self {
            RelayError::MissingTarget => json!({ "error": "Missing url parameter" }),
            RelayError::InvalidTarget(details) => {
                json!({ "error": "Invalid url parameter", "details": details })
            }
            RelayError::RequestBody(e) => {
                json!({ "error": "Unreadable request body", "details": error_chain(e) })
            }
            RelayError::PayloadTooLarge(e) => {
                json!({ "error": "Request body too large", "details": error_chain(e) })
            }
            RelayError::Upstream(e) => json!({ "error": "Proxy failed", "details": error_chain(e) }),
        }
    }
}

impl From<BytesRejection> for RelayError {
    fn from(rejection: BytesRejection) -> Self {
        match rejection {
            BytesRejection::FailedToBufferBody(FailedToBufferBody::LengthLimitError(_)) => {
                RelayError::PayloadTooLarge(rejection)
            }
            _ => RelayError::RequestBody(rejection),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.payload())).into_response()
    }
}

/// Render an error and its sources as one line. Never empty.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !text.is_empty() && !message.contains(&text) {
            if !message.is_empty() {
                message.push_str(": ");
            }
            message.push_str(&text);
        }
        source = cause.source();
    }
    if message.is_empty() {
        message.push_str("unknown error");
    }
    message
}
