use reqwest::{header::AUTHORIZATION, Client, Method, StatusCode};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::sdk::types::{LoginRequest, LoginResponse};

pub const DEFAULT_MOUNT_PATH: &str = "/relay";

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("invalid relay URL `{0}`")]
    InvalidRelayUrl(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Talks to the backend through a relay instance.
#[derive(Debug, Clone)]
pub struct RelayClient {
    client: Client,
    base: Url,
    token: Option<String>,
}

impl RelayClient {
    /// Client for a relay at `relay_url` mounted at `/relay`.
    pub fn new(relay_url: &str) -> Result<Self, SdkError> {
        Self::with_mount_path(relay_url, DEFAULT_MOUNT_PATH)
    }

    pub fn with_mount_path(relay_url: &str, mount_path: &str) -> Result<Self, SdkError> {
        let joined = format!(
            "{}/{}",
            relay_url.trim_end_matches('/'),
            mount_path.trim_matches('/')
        );
        let base = Url::parse(&joined).map_err(|_| SdkError::InvalidRelayUrl(joined.clone()))?;
        if base.cannot_be_a_base() {
            return Err(SdkError::InvalidRelayUrl(joined));
        }

        Ok(Self {
            client: Client::builder().no_proxy().build()?,
            base,
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Log in and keep the returned token for later calls.
    pub async fn login(&mut self, identifier: &str, password: &str) -> Result<LoginResponse, SdkError> {
        let body = serde_json::to_value(LoginRequest {
            identifier: identifier.to_string(),
            password: password.to_string(),
        })?;
        let value = self.send(Method::POST, &["auth", "login-user"], Some(&body)).await?;
        let login: LoginResponse = serde_json::from_value(value)?;
        self.token = Some(login.token.clone());
        Ok(login)
    }

    /// All verified land listings.
    pub async fn verified_lands(&self) -> Result<Value, SdkError> {
        self.send(Method::GET, &["user", "verified", "land"], None).await
    }

    /// One verified land listing.
    pub async fn verified_land(&self, id: &str) -> Result<Value, SdkError> {
        self.send(Method::GET, &["user", "verified", "land", id], None).await
    }

    /// Roles offered at signup.
    pub async fn roles(&self) -> Result<Value, SdkError> {
        self.send(Method::GET, &["admin", "roles"], None).await
    }

    /// Register a user. The payload is passed to the backend as-is.
    pub async fn create_user(&self, user: &Value) -> Result<Value, SdkError> {
        self.send(Method::POST, &["api", "create-user"], Some(user)).await
    }

    /// URL of a backend path on the relay. Segments are percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(&self, method: Method, segments: &[&str], body: Option<&Value>) -> Result<Value, SdkError> {
        let mut request = self.client.request(method, self.endpoint(segments));
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(SdkError::Status { status, body: text });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}
