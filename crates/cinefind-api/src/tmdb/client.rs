//! `CatalogClient` - TMDB API client implementation.

use std::fmt;

use anyhow::{Context, Result};
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use super::api::LocalCatalogApi;
use super::error::CatalogError;
use super::types::{
    MovieDetail, MoviePage, ProxyErrorResponse, SearchMovieParams, TmdbErrorResponse,
};

/// Default base URL for TMDB API v3.
pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3/";

/// Error text the proxy returns when it has no credential.
const PROXY_MISSING_KEY: &str = "API key not configured";

/// How requests reach the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// Through the cinefind proxy; the proxy injects the credential.
    Proxy,
    /// Straight to the upstream API with the client-held credential.
    Direct,
    /// Through a CORS relay: the full upstream URL is appended to `prefix`.
    Relay {
        /// Relay prefix, e.g. `https://corsproxy.io/?`.
        prefix: String,
    },
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proxy => write!(f, "proxy"),
            Self::Direct => write!(f, "direct"),
            Self::Relay { .. } => write!(f, "relay"),
        }
    }
}

/// TMDB API client bound to one transport.
#[allow(clippy::module_name_repetitions)]
pub struct CatalogClient {
    /// HTTP client.
    http_client: Client,
    /// Base URL for API requests (proxy mount or upstream API root).
    base_url: Url,
    /// Bearer API token (unused by the proxy transport).
    api_token: Option<String>,
    /// Transport strategy.
    transport: Transport,
}

impl fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogClient")
            .field("base_url", &self.base_url.as_str())
            .field("transport", &self.transport)
            .field("has_token", &self.api_token.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for `CatalogClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct CatalogClientBuilder {
    base_url: Option<Url>,
    api_token: Option<String>,
    user_agent: Option<String>,
    transport: Transport,
}

impl CatalogClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            api_token: None,
            user_agent: None,
            transport: Transport::Proxy,
        }
    }

    /// Overrides the base URL. Must end with `/` so relative paths join below it.
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the API bearer token (needed by `Direct` and `Relay`).
    #[must_use]
    pub fn api_token(mut self, token: Option<String>) -> Self {
        self.api_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the transport (default: `Proxy`).
    #[must_use]
    pub fn transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Builds the client.
    ///
    /// A missing token is not a build error; requests on a transport that
    /// needs one fail with [`CatalogError::Auth`].
    ///
    /// # Errors
    ///
    /// - `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<CatalogClient> {
        let user_agent = self.user_agent.context("user_agent is required")?;

        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            let result = Url::parse(DEFAULT_BASE_URL);
            result.context("invalid default base URL")?
        };

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .build()
            .context("failed to build HTTP client")?;

        Ok(CatalogClient {
            http_client,
            base_url,
            api_token: self.api_token,
            transport: self.transport,
        })
    }
}

impl CatalogClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> CatalogClientBuilder {
        CatalogClientBuilder::new()
    }

    /// Returns the transport this client uses.
    #[must_use]
    pub const fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Resolves `path` and `query` into the URL actually requested.
    fn request_url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, CatalogError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| CatalogError::Unknown(format!("failed to join URL path {path}: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }

        match &self.transport {
            Transport::Relay { prefix } => Url::parse(&format!("{prefix}{url}"))
                .map_err(|e| CatalogError::Unknown(format!("invalid relay URL: {e}"))),
            Transport::Proxy | Transport::Direct => Ok(url),
        }
    }

    /// Sends a GET request and decodes the JSON body.
    #[instrument(skip_all, fields(transport = %self.transport))]
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        let url = self.request_url(path, query)?;

        let mut request = self
            .http_client
            .get(url)
            .header(ACCEPT, "application/json");
        match (&self.transport, &self.api_token) {
            (Transport::Proxy, _) => {}
            (_, Some(token)) => request = request.bearer_auth(token),
            (_, None) => return Err(CatalogError::Auth),
        }

        tracing::debug!(path, "catalog API request");

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(classify_error_body(status.as_u16(), &body));
        }

        let raw_result: std::result::Result<T, _> = serde_json::from_str(&body);
        raw_result.map_err(|e| {
            CatalogError::Unknown(format!("failed to decode JSON response from {path}: {e}"))
        })
    }
}

/// Maps a non-2xx response body onto the error taxonomy.
fn classify_error_body(status: u16, body: &str) -> CatalogError {
    if let Ok(err) = serde_json::from_str::<TmdbErrorResponse>(body) {
        return CatalogError::Http {
            status,
            message: format!("code={}, message={}", err.status_code, err.status_message),
        };
    }
    if let Ok(err) = serde_json::from_str::<ProxyErrorResponse>(body) {
        if status == 500 && err.error == PROXY_MISSING_KEY {
            return CatalogError::Auth;
        }
        return CatalogError::Http {
            status,
            message: err.error,
        };
    }
    let message = if body.trim().is_empty() {
        String::from("<empty body>")
    } else {
        String::from(body.trim())
    };
    CatalogError::Http { status, message }
}

impl LocalCatalogApi for CatalogClient {
    #[instrument(skip_all)]
    async fn discover_movies(&self, page: u32) -> Result<MoviePage, CatalogError> {
        let query = [
            ("sort_by", String::from("popularity.desc")),
            ("page", page.to_string()),
        ];
        self.get_json("discover/movie", &query).await
    }

    #[instrument(skip_all)]
    async fn search_movies(&self, params: &SearchMovieParams) -> Result<MoviePage, CatalogError> {
        let mut query: Vec<(&str, String)> = vec![
            ("query", params.query.clone()),
            ("page", params.page.to_string()),
            ("include_adult", params.include_adult.to_string()),
        ];
        if let Some(ref language) = params.language {
            query.push(("language", language.clone()));
        }

        self.get_json("search/movie", &query).await
    }

    #[instrument(skip_all)]
    async fn movie_details(&self, movie_id: u64) -> Result<MovieDetail, CatalogError> {
        let path = format!("movie/{movie_id}");
        let query = [("append_to_response", String::from("credits,videos"))];
        self.get_json(&path, &query).await
    }
}
