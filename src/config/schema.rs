//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// The backend origin every relayed call ends up at.
    pub upstream: UpstreamConfig,

    /// Relay endpoint behaviour.
    pub relay: RelaySettings,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request limits.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin endpoint settings.
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,

    /// Seconds to wait for in-flight requests on shutdown.
    pub shutdown_grace_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
            shutdown_grace_secs: 10,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Upstream backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Absolute origin path-rewritten requests are forwarded to
    /// (e.g., "http://10.0.0.5" or "http://backend.internal/api").
    pub origin: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            origin: "http://127.0.0.1:3000".to_string(),
        }
    }
}

/// What the relay does when a request names no target.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingTargetPolicy {
    /// Answer `400 {"error":"Missing url parameter"}` without a network call.
    #[default]
    Reject,
    /// Forward to the configured upstream origin.
    UseDefault,
}

impl std::fmt::Display for MissingTargetPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingTargetPolicy::Reject => f.write_str("reject"),
            MissingTargetPolicy::UseDefault => f.write_str("use_default"),
        }
    }
}

/// Relay endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RelaySettings {
    /// Path prefix the relay is mounted under. `<mount>?url=...` and
    /// `<mount>/<suffix>` are both served.
    pub mount_path: String,

    /// Behaviour when neither a `url` parameter nor a path suffix is given.
    pub on_missing_target: MissingTargetPolicy,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            mount_path: "/relay".to_string(),
            on_missing_target: MissingTargetPolicy::Reject,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Upstream round trip timeout (send + full body read) in seconds.
    pub upstream_secs: u64,

    /// Inbound request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 30,
            request_secs: 60,
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum inbound body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Placeholder admin key; validation refuses it when admin is enabled.
pub const PLACEHOLDER_API_KEY: &str = "CHANGE_ME_IN_PRODUCTION";

/// Admin endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AdminConfig {
    /// Serve `/admin/*` on the relay listener.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: PLACEHOLDER_API_KEY.to_string(),
        }
    }
}
