//! Operator endpoints, served on the relay listener when `admin.enabled`.

pub mod auth;
pub mod handlers;

use axum::{middleware, routing::get, Router};

use self::auth::admin_auth_middleware;
use self::handlers::get_status;
use crate::http::server::AppState;

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
