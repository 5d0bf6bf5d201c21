//! Relay subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request (method, query, path suffix, headers, body)
//!     → target.rs (url parameter, path rewrite, or missing-target policy)
//!     → forward.rs (one upstream call, raw bytes back)
//!     → UpstreamResponse (status, content type, body) → caller
//!
//! Failure:
//!     → error.rs (4xx for caller mistakes, 500 "Proxy failed" otherwise)
//! ```
//!
//! # Design Decisions
//! - Transparent pipe: upstream 4xx/5xx are relayed as data
//! - Bodies are opaque bytes, never re-encoded
//! - No state survives a request

pub mod error;
pub mod forward;
pub mod target;

pub use error::RelayError;
pub use forward::{OutboundRequest, UpstreamClient, UpstreamResponse, JSON_CONTENT_TYPE};
pub use target::{resolve_target, Target, TargetSource};
