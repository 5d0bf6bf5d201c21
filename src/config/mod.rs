//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → env overrides (GARUDA_UPSTREAM_ORIGIN, GARUDA_BIND_ADDRESS)
//!     → command line overrides
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config (same overrides)
//!     → validation.rs validates
//!     → atomic swap of the relay state in the HTTP server
//! ```
//!
//! # Design Decisions
//! - The upstream origin lives in exactly one place: `upstream.origin`
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load, ConfigError, Overrides};
pub use schema::{
    AdminConfig, ListenerConfig, MissingTargetPolicy, ObservabilityConfig, RelayConfig, RelaySettings,
    SecurityConfig, TimeoutConfig, TlsConfig, UpstreamConfig,
};
pub use validation::{validate_config, ValidationError};
pub use watcher::ConfigWatcher;
