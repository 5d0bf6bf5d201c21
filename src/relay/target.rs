//! Target URL resolution.
//!
//! # Rules
//! 1. A non-empty `url` query parameter wins. It must be an absolute
//!    http(s) URL and is used as-is; the other query parameters are not
//!    forwarded.
//! 2. Otherwise a path suffix after the mount path is appended to the
//!    upstream origin, and the inbound query string is kept.
//! 3. Otherwise the missing-target policy decides: reject, or forward to
//!    the origin itself (inbound query string kept).

use url::{form_urlencoded, Url};

use crate::config::MissingTargetPolicy;
use crate::relay::error::RelayError;

/// Where the resolved target came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSource {
    /// Explicit `url` query parameter.
    Query,
    /// Path suffix rewritten against the upstream origin.
    PathSuffix,
    /// Nothing given; the upstream origin was substituted.
    DefaultOrigin,
}

impl TargetSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetSource::Query => "query",
            TargetSource::PathSuffix => "path_suffix",
            TargetSource::DefaultOrigin => "default_origin",
        }
    }
}

/// A resolved upstream target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub url: Url,
    pub source: TargetSource,
}

/// Resolve the upstream URL for one inbound request.
///
/// `suffix` is the inbound path with the mount prefix removed, without a
/// leading slash; pass `None` (or an empty string) when there is none.
pub fn resolve_target(
    query: Option<&str>,
    suffix: Option<&str>,
    origin: &Url,
    policy: MissingTargetPolicy,
) -> Result<Target, RelayError> {
    if let Some(raw) = url_param(query) {
        return Ok(Target {
            url: parse_explicit(&raw)?,
            source: TargetSource::Query,
        });
    }

    let query = query.filter(|q| !q.is_empty());

    match suffix.filter(|s| !s.is_empty()) {
        Some(suffix) => Ok(Target {
            url: join_origin(origin, suffix, query),
            source: TargetSource::PathSuffix,
        }),
        None => match policy {
            MissingTargetPolicy::Reject => Err(RelayError::MissingTarget),
            MissingTargetPolicy::UseDefault => Ok(Target {
                url: join_origin(origin, "", query),
                source: TargetSource::DefaultOrigin,
            }),
        },
    }
}

fn url_param(query: Option<&str>) -> Option<String> {
    form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_explicit(raw: &str) -> Result<Url, RelayError> {
    let url = Url::parse(raw).map_err(|e| RelayError::InvalidTarget(format!("{raw}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(RelayError::InvalidTarget(format!(
            "{raw}: unsupported scheme `{}`",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(RelayError::InvalidTarget(format!("{raw}: missing host")));
    }
    Ok(url)
}

fn join_origin(origin: &Url, suffix: &str, query: Option<&str>) -> Url {
    let mut url = origin.clone();
    let base = origin.path().trim_end_matches('/');
    url.set_path(&format!("{base}/{}", suffix.trim_start_matches('/')));
    url.set_query(query);
    url.set_fragment(None);
    url
}
