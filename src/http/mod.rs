//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware, reload, shutdown)
//!     → request.rs (request ID)
//!     → relay.rs (resolve target, forward, relay answer)
//!     → response.rs (CORS headers, preflight)
//!     → Send to client
//! ```

pub mod relay;
pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer, RelayState, ServerError};
