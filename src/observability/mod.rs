//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Relay handlers produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout log collection
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID is a field on every relay log event
//! - Metric updates are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
