//! Proxy error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::handler::CORS_HEADERS;

/// A request the proxy answers with an error body.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::module_name_repetitions)]
pub enum ProxyError {
    /// Anything other than `GET` or `OPTIONS`.
    #[error("Method not allowed")]
    MethodNotAllowed,
    /// The path would leave the upstream base.
    #[error("Invalid path")]
    InvalidPath,
    /// No server-side credential.
    #[error("API key not configured")]
    MissingKey,
    /// The upstream answered with a non-2xx status.
    #[error("TMDB API error: {status} {reason}")]
    Upstream {
        /// Upstream status code.
        status: StatusCode,
        /// Canonical reason phrase.
        reason: &'static str,
    },
    /// The upstream could not be reached or its body not read.
    #[error("Internal server error")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::InvalidPath => StatusCode::BAD_REQUEST,
            Self::MissingKey | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream { status, .. } => *status,
        };
        let details = match &self {
            Self::Internal(details) => Some(details.clone()),
            _ => None,
        };
        let body = ErrorBody {
            error: self.to_string(),
            details,
        };

        (status, CORS_HEADERS, Json(body)).into_response()
    }
}
