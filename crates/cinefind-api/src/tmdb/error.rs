//! `CatalogError` - failure taxonomy for catalog requests.

use std::fmt;

/// Why a request was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// A newer request took over the same slot.
    Superseded,
    /// No response arrived within the configured timeout.
    TimedOut,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Superseded => write!(f, "superseded"),
            Self::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Error returned by catalog operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[allow(clippy::module_name_repetitions)]
pub enum CatalogError {
    /// The request was superseded or timed out.
    #[error("request cancelled: {0}")]
    Cancelled(CancelReason),
    /// The catalog answered with a non-2xx status.
    #[error("catalog API error (HTTP {status}): {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Upstream error message, or the raw body.
        message: String,
    },
    /// The request failed before any response arrived.
    #[error("network error: {0}")]
    Network(String),
    /// No credential is configured for this transport.
    #[error("API credential is not configured")]
    Auth,
    /// Anything else (undecodable body, invalid URL, ...).
    #[error("unexpected catalog error: {0}")]
    Unknown(String),
}

impl CatalogError {
    /// Returns `true` for a timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Cancelled(CancelReason::TimedOut))
    }

    /// Returns `true` when the failure happened at the transport level, so a
    /// different transport might succeed.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Returns the HTTP status for `Http` errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Cancelled(CancelReason::TimedOut)
        } else if err.is_decode() || err.is_builder() {
            Self::Unknown(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            Self::Network(err.to_string())
        }
    }
}
