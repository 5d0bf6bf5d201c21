//! Cross-origin response headers.
//!
//! Every response leaving the relay routes carries the same permissive CORS
//! set. Preflight answers add `Access-Control-Max-Age` and never touch the
//! upstream.

use axum::{
    body::Body,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
            ACCESS_CONTROL_MAX_AGE,
        },
        HeaderMap, HeaderName, HeaderValue, StatusCode,
    },
    response::Response,
};

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization";
/// One day.
pub const PREFLIGHT_MAX_AGE: &str = "86400";

/// The header set attached to every relay response.
pub fn cors_headers() -> [(HeaderName, HeaderValue); 3] {
    [
        (ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static(ALLOW_ORIGIN)),
        (ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS)),
        (ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS)),
    ]
}

/// Insert the CORS set, replacing anything the upstream sent.
pub fn apply_cors(headers: &mut HeaderMap) {
    for (name, value) in cors_headers() {
        headers.insert(name, value);
    }
}

/// Empty `200` answering a CORS preflight.
pub fn preflight_response() -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    apply_cors(headers);
    headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(PREFLIGHT_MAX_AGE));
    response
}
