//! Network layer helpers.
//!
//! The relay can terminate TLS itself so an HTTPS frontend can reach a
//! plain-HTTP backend without mixed-content errors.

pub mod tls;
