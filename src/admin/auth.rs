use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::http::server::AppState;

/// Require `Authorization: Bearer <admin.api_key>`.
///
/// The key is read from the live relay state so a reload can rotate it.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let inner = state.inner.load_full();

    let authorized = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token == inner.config.admin.api_key);

    if authorized {
        return Ok(next.run(request).await);
    }

    tracing::warn!(path = %request.uri().path(), "Rejected admin request");
    Err(StatusCode::UNAUTHORIZED)
}
