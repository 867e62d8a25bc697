//! Session-wide configuration and the wiring built from it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use cinefind_api::tmdb::{CatalogClient, Transport};
use url::Url;

use crate::analytics::SearchAnalytics;
use crate::debounce::{DEFAULT_WINDOW, Debouncer};
use crate::detail::{DetailFetcher, DetailView};
use crate::orchestrator::{DEFAULT_TIMEOUT, DEFAULT_TRENDING_LIMIT, ListController};
use crate::query::SearchQuery;

/// Default public CORS relay prefix.
pub const DEFAULT_RELAY_PREFIX: &str = "https://corsproxy.io/?";

/// User-Agent sent by catalog clients.
pub const USER_AGENT: &str = concat!("cinefind/", env!("CARGO_PKG_VERSION"));

/// Immutable settings built once per session.
#[derive(Clone)]
pub struct BrowseConfig {
    /// Base URL of the catalog proxy (list fetches).
    pub proxy_base: Url,
    /// Base URL of the upstream API (direct and relay detail fetches).
    pub upstream_base: Url,
    /// Client-held bearer credential.
    pub api_token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Search input quiescence window.
    pub debounce_window: Duration,
    /// Number of trending searches to show.
    pub trending_limit: usize,
    /// Detail fetch strategies, tried in order.
    pub detail_transports: Vec<Transport>,
}

impl fmt::Debug for BrowseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowseConfig")
            .field("proxy_base", &self.proxy_base.as_str())
            .field("upstream_base", &self.upstream_base.as_str())
            .field("has_token", &self.api_token.is_some())
            .field("timeout", &self.timeout)
            .field("debounce_window", &self.debounce_window)
            .field("trending_limit", &self.trending_limit)
            .field("detail_transports", &self.detail_transports)
            .finish()
    }
}

impl BrowseConfig {
    /// Creates a configuration with default timings and the direct-then-relay
    /// detail strategy.
    #[must_use]
    pub fn new(proxy_base: Url, upstream_base: Url) -> Self {
        Self {
            proxy_base,
            upstream_base,
            api_token: None,
            timeout: DEFAULT_TIMEOUT,
            debounce_window: DEFAULT_WINDOW,
            trending_limit: DEFAULT_TRENDING_LIMIT,
            detail_transports: vec![
                Transport::Direct,
                Transport::Relay {
                    prefix: String::from(DEFAULT_RELAY_PREFIX),
                },
            ],
        }
    }

    /// Builds the client used for list fetches (through the proxy).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn list_client(&self) -> Result<CatalogClient> {
        CatalogClient::builder()
            .base_url(self.proxy_base.clone())
            .user_agent(USER_AGENT)
            .transport(Transport::Proxy)
            .build()
            .context("failed to build list client")
    }

    /// Builds one client per detail strategy, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if any HTTP client cannot be built.
    pub fn detail_clients(&self) -> Result<Vec<CatalogClient>> {
        self.detail_transports
            .iter()
            .map(|transport| {
                let base_url = match transport {
                    Transport::Proxy => self.proxy_base.clone(),
                    Transport::Direct | Transport::Relay { .. } => self.upstream_base.clone(),
                };
                CatalogClient::builder()
                    .base_url(base_url)
                    .api_token(self.api_token.clone())
                    .user_agent(USER_AGENT)
                    .transport(transport.clone())
                    .build()
                    .with_context(|| format!("failed to build {transport} detail client"))
            })
            .collect()
    }

    /// Builds the list controller.
    ///
    /// # Errors
    ///
    /// Returns an error if the list client cannot be built.
    pub fn list_controller<S>(&self, analytics: Arc<S>) -> Result<ListController<CatalogClient, S>>
    where
        S: SearchAnalytics + Sync + 'static,
    {
        Ok(ListController::new(self.list_client()?, analytics)
            .timeout(self.timeout)
            .trending_limit(self.trending_limit))
    }

    /// Builds the detail fetcher over the configured strategies.
    ///
    /// # Errors
    ///
    /// Returns an error if a detail client cannot be built.
    pub fn detail_fetcher(&self) -> Result<DetailFetcher<CatalogClient>> {
        Ok(DetailFetcher::new(self.detail_clients()?).timeout(self.timeout))
    }

    /// Builds the detail modal.
    ///
    /// # Errors
    ///
    /// Returns an error if a detail client cannot be built.
    pub fn detail_view(&self) -> Result<DetailView<CatalogClient>> {
        Ok(DetailView::new(self.detail_fetcher()?))
    }

    /// Starts the search input debouncer.
    #[must_use]
    pub fn debouncer(&self) -> Debouncer<SearchQuery> {
        Debouncer::spawn(self.debounce_window, SearchQuery::default())
    }
}
