//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): relayed and rejected calls by method, status, outcome
//! - `relay_request_duration_seconds` (histogram): inbound-to-response latency
//! - `relay_preflight_total` (counter): preflights answered locally

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one relay call. `outcome` is `relayed` or a relay error kind.
pub fn record_request(method: &str, status: u16, outcome: &'static str, start: Instant) {
    counter!(
        "relay_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!(
        "relay_request_duration_seconds",
        "method" => method.to_string(),
        "outcome" => outcome
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_preflight() {
    counter!("relay_preflight_total").increment(1);
}
