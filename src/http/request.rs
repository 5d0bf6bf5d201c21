//! Request identification.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) when the caller sent none
//! - Expose the header name shared by the inbound and upstream sides
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A caller-supplied `X-Request-ID` is kept, not replaced

use axum::http::{HeaderMap, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the request ID in both directions.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request IDs for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Read the request ID for logging, `"unknown"` if absent.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}
