//! Configuration loading from disk, environment and command line.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `upstream.origin`.
pub const ENV_UPSTREAM_ORIGIN: &str = "GARUDA_UPSTREAM_ORIGIN";
/// Environment variable overriding `listener.bind_address`.
pub const ENV_BIND_ADDRESS: &str = "GARUDA_BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Values that replace whatever the config file says.
///
/// Environment variables are applied first, then explicit values (usually
/// from the command line).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub upstream_origin: Option<String>,
    pub bind_address: Option<String>,
}

impl Overrides {
    /// Read overrides from the process environment.
    pub fn from_env() -> Self {
        Self {
            upstream_origin: non_empty_var(ENV_UPSTREAM_ORIGIN),
            bind_address: non_empty_var(ENV_BIND_ADDRESS),
        }
    }

    /// Layer `other` on top of `self`; set values in `other` win.
    pub fn merge(self, other: Overrides) -> Self {
        Self {
            upstream_origin: other.upstream_origin.or(self.upstream_origin),
            bind_address: other.bind_address.or(self.bind_address),
        }
    }

    /// Write the overrides into `config`.
    pub fn apply(&self, config: &mut RelayConfig) {
        if let Some(origin) = &self.upstream_origin {
            config.upstream.origin = origin.clone();
        }
        if let Some(addr) = &self.bind_address {
            config.listener.bind_address = addr.clone();
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parse a TOML document into a configuration without validating it.
pub fn parse_config(content: &str) -> Result<RelayConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Load, override and validate configuration.
///
/// With no path the built-in defaults are the starting point.
pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<RelayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_config(&fs::read_to_string(path)?)?,
        None => RelayConfig::default(),
    };
    overrides.apply(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
