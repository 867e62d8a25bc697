//! The forwarding handler.

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderName, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::{debug, error, instrument, warn};
use url::Url;

use crate::error::ProxyError;

/// Headers added to every proxy response.
pub const CORS_HEADERS: [(HeaderName, &str); 4] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type, Authorization"),
    (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, OPTIONS"),
    (header::CONTENT_TYPE, "application/json"),
];

/// Shared state of the forwarding handler.
pub struct ProxyState {
    client: reqwest::Client,
    upstream: Url,
    api_token: Option<String>,
}

impl fmt::Debug for ProxyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyState")
            .field("upstream", &self.upstream.as_str())
            .field("has_token", &self.api_token.is_some())
            .finish_non_exhaustive()
    }
}

impl ProxyState {
    /// Creates the state for forwarding to `upstream` with `api_token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(upstream: Url, api_token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("cinefind-proxy/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .build()
            .context("failed to build upstream HTTP client")?;
        Ok(Self {
            client,
            upstream,
            api_token: api_token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// Builds the upstream URL for the captured `path`.
    ///
    /// The path is appended segment by segment below the upstream base, and
    /// the result must still share its origin and base path.
    fn upstream_url(&self, path: &str, query: Option<&str>) -> Result<Url, ProxyError> {
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        if !segments.iter().copied().all(is_plain_segment) {
            warn!(path, "rejecting path outside the upstream base");
            return Err(ProxyError::InvalidPath);
        }

        let mut url = self.upstream.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ProxyError::Internal(format!("upstream {} cannot take a path", self.upstream))
            })?
            .pop_if_empty()
            .extend(segments);
        url.set_query(query.filter(|q| !q.is_empty()));

        if url.origin() != self.upstream.origin()
            || !url.path().starts_with(self.upstream.path())
        {
            warn!(%url, "rejecting URL that leaves the upstream base");
            return Err(ProxyError::InvalidPath);
        }
        Ok(url)
    }
}

/// Whether `segment` names a resource directly below its parent.
fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains([':', '\\'])
}

/// Forwards `GET {prefix}/{path}` to the upstream API.
#[instrument(skip_all, fields(%method, path = %path))]
pub async fn forward(
    State(state): State<Arc<ProxyState>>,
    method: Method,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, ProxyError> {
    if method == Method::OPTIONS {
        return Ok((StatusCode::OK, CORS_HEADERS, Body::empty()).into_response());
    }
    if method != Method::GET {
        return Err(ProxyError::MethodNotAllowed);
    }
    let Some(token) = state.api_token.as_deref() else {
        error!("refusing to forward: no API token configured");
        return Err(ProxyError::MissingKey);
    };

    let url = state.upstream_url(&path, query.as_deref())?;
    debug!(%url, "forwarding to upstream");

    let response = state
        .client
        .get(url)
        .header(header::ACCEPT, "application/json")
        .bearer_auth(token)
        .send()
        .await
        .map_err(|e| {
            error!(error = %e, "upstream request failed");
            ProxyError::Internal(e.to_string())
        })?;

    let status = StatusCode::from_u16(response.status().as_u16())
        .unwrap_or(StatusCode::BAD_GATEWAY);
    if !status.is_success() {
        warn!(%status, "upstream returned an error");
        return Err(ProxyError::Upstream {
            status,
            reason: status.canonical_reason().unwrap_or_default(),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| ProxyError::Internal(e.to_string()))?;
    Ok((StatusCode::OK, CORS_HEADERS, body).into_response())
}
