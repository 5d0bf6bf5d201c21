use std::sync::atomic::Ordering;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::config::MissingTargetPolicy;
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct RelayStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub upstream_origin: String,
    pub mount_path: String,
    pub on_missing_target: MissingTargetPolicy,
    pub requests_total: u64,
    pub failures_total: u64,
}

pub async fn get_status(State(state): State<AppState>) -> Json<RelayStatus> {
    let inner = state.inner.load();

    Json(RelayStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        upstream_origin: inner.config.upstream.origin.clone(),
        mount_path: state.mount_path.to_string(),
        on_missing_target: inner.config.relay.on_missing_target,
        requests_total: state.request_count.load(Ordering::Relaxed),
        failures_total: state.failure_count.load(Ordering::Relaxed),
    })
}
