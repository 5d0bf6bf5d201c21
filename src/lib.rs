//! Garuda Relay Library
//!
//! HTTP relay that lets the Garuda Lands browser frontend reach its backend
//! across origin and mixed-content boundaries, plus a client that routes
//! every backend call through it.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod relay;
pub mod sdk;

pub use config::schema::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
