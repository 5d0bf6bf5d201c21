//! Relay endpoint handlers.

use std::sync::atomic::Ordering;
use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, State},
    http::{header::AUTHORIZATION, Method, Request},
    response::{IntoResponse, Response},
};

use crate::http::request::{request_id, X_REQUEST_ID};
use crate::http::response::preflight_response;
use crate::http::server::{AppState, RelayState};
use crate::observability::metrics;
use crate::relay::{resolve_target, OutboundRequest, RelayError};

/// Forward the request to its resolved target and relay the answer.
pub async fn relay_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers());
    let method = request.method().clone();
    let current = state.inner.load_full();

    state.request_count.fetch_add(1, Ordering::Relaxed);

    match relay(&state.mount_path, &current, request).await {
        Ok(response) => {
            let status = response.status();
            tracing::debug!(request_id = %request_id, method = %method, status = %status, "Relayed");
            metrics::record_request(method.as_str(), status.as_u16(), "relayed", start_time);
            response
        }
        Err(err) => {
            let status = err.status();
            if status.is_server_error() {
                state.failure_count.fetch_add(1, Ordering::Relaxed);
                tracing::error!(request_id = %request_id, method = %method, error = %err, "Relay failed");
            } else {
                tracing::warn!(request_id = %request_id, method = %method, error = %err, "Relay rejected request");
            }
            metrics::record_request(method.as_str(), status.as_u16(), err.kind(), start_time);
            err.into_response()
        }
    }
}

async fn relay(mount_path: &str, current: &RelayState, request: Request<Body>) -> Result<Response, RelayError> {
    let suffix = request
        .uri()
        .path()
        .strip_prefix(mount_path)
        .map(|rest| rest.trim_start_matches('/'));
    let target = resolve_target(
        request.uri().query(),
        suffix,
        &current.origin,
        current.config.relay.on_missing_target,
    )?;

    let method = request.method().clone();
    tracing::debug!(
        method = %method,
        target = %target.url,
        source = target.source.as_str(),
        "Forwarding upstream"
    );

    let authorization = request.headers().get(AUTHORIZATION).cloned();
    let request_id = request.headers().get(X_REQUEST_ID).cloned();

    // The body limit layer caps the stream; a chunked body past it fails here.
    let body = if matches!(method, Method::GET | Method::HEAD) {
        None
    } else {
        Some(Bytes::from_request(request, &()).await?)
    };

    let upstream = current
        .upstream
        .forward(OutboundRequest {
            method,
            url: target.url,
            authorization,
            request_id,
            body,
        })
        .await?;

    Ok(upstream.into_response())
}

/// Answer CORS preflight locally.
pub async fn preflight_handler() -> Response {
    metrics::record_preflight();
    preflight_response()
}
