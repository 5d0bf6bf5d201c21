use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of `POST /auth/login-user`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginRequest {
    /// Email or phone number.
    pub identifier: String,
    pub password: String,
}

/// Successful login. Only `token` is interpreted; the rest is kept as sent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginResponse {
    pub token: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
