//! Outbound forwarding to the upstream.
//!
//! # Responsibilities
//! - Issue exactly one upstream request per relayed call
//! - Build the outbound header set: forced JSON content type, the
//!   caller's `Authorization` when present, the request ID
//! - Drain the upstream body as raw bytes and hand it back untouched
//!
//! # Design Decisions
//! - No retries; a failed round trip is reported, never repeated
//! - System proxy variables are ignored so the relay always talks to the
//!   origin it was configured with
//! - Redirects are followed the way a browser `fetch` would

use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
};
use url::Url;

use crate::config::TimeoutConfig;
use crate::http::request::X_REQUEST_ID;
use crate::relay::error::RelayError;

/// Content type sent upstream on every request, and assumed for upstream
/// responses that do not declare one.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// One request to send upstream.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub authorization: Option<HeaderValue>,
    pub request_id: Option<HeaderValue>,
    /// `None` for GET/HEAD; the raw inbound body otherwise.
    pub body: Option<Bytes>,
}

/// What came back from the upstream.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        response.headers_mut().insert(
            CONTENT_TYPE,
            self.content_type
                .unwrap_or_else(|| HeaderValue::from_static(JSON_CONTENT_TYPE)),
        );
        response
    }
}

/// HTTP client for the upstream side of the relay.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
}

impl UpstreamClient {
    /// Build a client honouring the configured connect and round trip timeouts.
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.upstream_secs))
            .no_proxy()
            .build()?;
        Ok(Self { client })
    }

    /// Forward one request and collect the full upstream response.
    pub async fn forward(&self, outbound: OutboundRequest) -> Result<UpstreamResponse, RelayError> {
        let mut request = self
            .client
            .request(outbound.method, outbound.url)
            .header(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

        if let Some(authorization) = outbound.authorization {
            request = request.header(AUTHORIZATION, authorization);
        }
        if let Some(request_id) = outbound.request_id {
            request = request.header(X_REQUEST_ID, request_id);
        }
        if let Some(body) = outbound.body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let content_type = response.headers().get(CONTENT_TYPE).cloned();
        let body = response.bytes().await?;

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}
