//! Catalog proxy for cinefind.
//!
//! Mounts the upstream TMDB API under a path prefix, injecting the
//! server-side bearer credential so clients never hold it. Only `GET` is
//! forwarded; `OPTIONS` preflights are answered locally.

/// Proxy error responses.
pub mod error;
/// The forwarding handler.
pub mod handler;
/// Router construction and the serve loop.
pub mod server;

pub use error::ProxyError;
pub use handler::ProxyState;
pub use server::{
    DEFAULT_LISTEN, DEFAULT_PREFIX, ProxySettings, normalize_prefix, router, run, serve,
    shutdown_signal,
};
