//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, the upstream origin and the mount path
//! - Validate value ranges (timeouts > 0, body limit > 0)
//! - Detect admin routes shadowed by the relay mount
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{RelayConfig, PLACEHOLDER_API_KEY};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: `{value}` is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("upstream.origin: `{value}` {reason}")]
    InvalidOrigin { value: String, reason: String },

    #[error("relay.mount_path: `{0}` must start with '/', must not end with '/' and must not be the root")]
    InvalidMountPath(String),

    #[error("relay.mount_path: `{0}` overlaps the /admin routes")]
    MountShadowsAdmin(String),

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("timeouts.upstream_secs ({upstream}) must not exceed timeouts.request_secs ({request})")]
    UpstreamExceedsRequest { upstream: u64, request: u64 },

    #[error("security.max_body_size must be greater than zero")]
    ZeroBodyLimit,

    #[error("admin.api_key must be set to a non-placeholder value when admin is enabled")]
    WeakAdminKey,
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if let Err(reason) = check_origin(&config.upstream.origin) {
        errors.push(ValidationError::InvalidOrigin {
            value: config.upstream.origin.clone(),
            reason,
        });
    }

    let mount = &config.relay.mount_path;
    if !mount.starts_with('/') || mount.len() < 2 || mount.ends_with('/') || mount.contains(['{', '}', '?', '#']) {
        errors.push(ValidationError::InvalidMountPath(mount.clone()));
    } else if config.admin.enabled && (mount == "/admin" || mount.starts_with("/admin/")) {
        errors.push(ValidationError::MountShadowsAdmin(mount.clone()));
    }

    let timeouts = &config.timeouts;
    for (name, value) in [
        ("connect_secs", timeouts.connect_secs),
        ("upstream_secs", timeouts.upstream_secs),
        ("request_secs", timeouts.request_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(name));
        }
    }
    if timeouts.upstream_secs > timeouts.request_secs {
        errors.push(ValidationError::UpstreamExceedsRequest {
            upstream: timeouts.upstream_secs,
            request: timeouts.request_secs,
        });
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.admin.enabled
        && (config.admin.api_key.trim().is_empty() || config.admin.api_key == PLACEHOLDER_API_KEY)
    {
        errors.push(ValidationError::WeakAdminKey);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_origin(origin: &str) -> Result<(), String> {
    let url = Url::parse(origin).map_err(|e| format!("is not an absolute URL ({e})"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err("must use http or https".to_string());
    }
    if url.host_str().is_none() {
        return Err("has no host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("must not carry a query or fragment".to_string());
    }
    Ok(())
}
