//! `AppConfig` struct and TOML read/write.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use cinefind_api::tmdb::{DEFAULT_BASE_URL, Transport};
use cinefind_browse::BrowseConfig;
use cinefind_browse::config::DEFAULT_RELAY_PREFIX;
use cinefind_proxy::{DEFAULT_LISTEN, DEFAULT_PREFIX, ProxySettings};
use serde::{Deserialize, Serialize};
use url::Url;

/// Default proxy URL list fetches go through.
const DEFAULT_PROXY_URL: &str = "http://127.0.0.1:8888/api/";

/// Top-level application configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Catalog endpoints and transports.
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Search behavior.
    #[serde(default)]
    pub search: SearchConfig,
    /// Proxy server settings.
    #[serde(default)]
    pub proxy: ProxyConfig,
}

/// A detail fetch strategy as written in the config file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransportName {
    /// Through the cinefind proxy.
    Proxy,
    /// Straight to the upstream API.
    Direct,
    /// Through the public CORS relay.
    Relay,
}

/// Catalog endpoint configuration.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CatalogConfig {
    /// Proxy base URL used for list fetches.
    pub proxy_url: String,
    /// Upstream API base URL used for direct and relay detail fetches.
    pub upstream_url: String,
    /// CORS relay prefix.
    pub relay_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Detail fetch strategies, tried in order.
    pub detail_transports: Vec<TransportName>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            proxy_url: String::from(DEFAULT_PROXY_URL),
            upstream_url: String::from(DEFAULT_BASE_URL),
            relay_url: String::from(DEFAULT_RELAY_PREFIX),
            timeout_secs: 10,
            detail_transports: vec![TransportName::Direct, TransportName::Relay],
        }
    }
}

/// Search behavior configuration.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet period before typed input is searched, in milliseconds.
    pub debounce_ms: u64,
    /// Number of trending searches to show.
    pub trending_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            trending_limit: 5,
        }
    }
}

/// Proxy server configuration.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProxyConfig {
    /// Address the proxy listens on.
    pub listen: String,
    /// Path prefix the upstream API is mounted under.
    pub prefix: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen: String::from(DEFAULT_LISTEN),
            prefix: String::from(DEFAULT_PREFIX),
        }
    }
}

/// Parses a base URL, adding the trailing slash relative joins rely on.
fn parse_base_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    let with_slash = if raw.ends_with('/') {
        raw.to_owned()
    } else {
        format!("{raw}/")
    };
    Url::parse(&with_slash).with_context(|| format!("invalid base URL {raw:?}"))
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Saves config to a TOML file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or file write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config to TOML")?;
        std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Builds the browse configuration with the client-held `api_token`.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured URL is invalid.
    pub fn browse_config(&self, api_token: Option<String>) -> Result<BrowseConfig> {
        let catalog = &self.catalog;
        let mut config = BrowseConfig::new(
            parse_base_url(&catalog.proxy_url).context("catalog.proxy_url")?,
            parse_base_url(&catalog.upstream_url).context("catalog.upstream_url")?,
        );
        config.api_token = api_token.filter(|t| !t.trim().is_empty());
        config.timeout = Duration::from_secs(catalog.timeout_secs);
        config.debounce_window = Duration::from_millis(self.search.debounce_ms);
        config.trending_limit = self.search.trending_limit;
        config.detail_transports = catalog
            .detail_transports
            .iter()
            .map(|name| match name {
                TransportName::Proxy => Transport::Proxy,
                TransportName::Direct => Transport::Direct,
                TransportName::Relay => Transport::Relay {
                    prefix: catalog.relay_url.clone(),
                },
            })
            .collect();
        Ok(config)
    }

    /// Builds the proxy settings with the server-held `api_token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listen address or upstream URL is invalid.
    pub fn proxy_settings(&self, api_token: Option<String>) -> Result<ProxySettings> {
        let listen: SocketAddr = self
            .proxy
            .listen
            .parse()
            .with_context(|| format!("invalid proxy.listen {:?}", self.proxy.listen))?;
        Ok(ProxySettings {
            listen,
            prefix: self.proxy.prefix.clone(),
            upstream: parse_base_url(&self.catalog.upstream_url).context("catalog.upstream_url")?,
            api_token,
        })
    }
}
