//! Router construction and the serve loop.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::any;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
use tracing::{error, info};
use url::Url;

use crate::handler::{ProxyState, forward};

/// Default listen address.
pub const DEFAULT_LISTEN: &str = "127.0.0.1:8888";

/// Default mount prefix.
pub const DEFAULT_PREFIX: &str = "/api";

/// Proxy settings.
#[derive(Clone)]
pub struct ProxySettings {
    /// Socket address to bind.
    pub listen: SocketAddr,
    /// Path prefix the upstream API is mounted under.
    pub prefix: String,
    /// Upstream API base URL.
    pub upstream: Url,
    /// Server-side bearer credential.
    pub api_token: Option<String>,
}

impl std::fmt::Debug for ProxySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxySettings")
            .field("listen", &self.listen)
            .field("prefix", &self.prefix)
            .field("upstream", &self.upstream.as_str())
            .field("has_token", &self.api_token.is_some())
            .finish()
    }
}

/// Normalizes a mount prefix to `/segment` form (empty for the root).
#[must_use]
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// Builds the proxy router: every method under `{prefix}/` goes to the
/// forwarding handler.
#[must_use]
pub fn router(state: ProxyState, prefix: &str) -> Router {
    let route = format!("{}/{{*path}}", normalize_prefix(prefix));
    Router::new()
        .route(&route, any(forward))
        .with_state(Arc::new(state))
}

/// Serves the proxy on `listener` until `shutdown` completes.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built or the server fails.
pub async fn serve<F>(listener: TcpListener, settings: ProxySettings, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = ProxyState::new(settings.upstream.clone(), settings.api_token.clone())?;
    if settings.api_token.is_none() {
        error!("TMDB_API_TOKEN is not set; every request will be answered with 500");
    }
    let app = router(state, &settings.prefix);

    let local = listener.local_addr().context("failed to read local address")?;
    info!(
        listen = %local,
        prefix = %normalize_prefix(&settings.prefix),
        upstream = %settings.upstream,
        "catalog proxy running"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("proxy server failed")?;

    info!("catalog proxy stopped");
    Ok(())
}

/// Binds `settings.listen` and serves until Ctrl+C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn run(settings: ProxySettings) -> Result<()> {
    let listener = TcpListener::bind(settings.listen)
        .await
        .with_context(|| format!("failed to bind {}", settings.listen))?;
    serve(listener, settings, shutdown_signal()).await
}

/// Completes on Ctrl+C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("received SIGTERM, shutting down");
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => {},
        () = terminate => {},
    }
}
