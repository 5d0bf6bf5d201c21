//! Client for the Garuda backend that goes through the relay.
//!
//! Every endpoint is reached as `<relay>/<mount>/<backend path>`, so the
//! backend origin is only known to the relay's configuration and every
//! call gets the same CORS and credential handling.

pub mod client;
pub mod types;

pub use client::{RelayClient, SdkError, DEFAULT_MOUNT_PATH};
pub use types::{LoginRequest, LoginResponse};
