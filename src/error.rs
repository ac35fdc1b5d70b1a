//! Error types and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::path::PathBuf;
use tracing::error;

/// Failure to encode or decode an environment token.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("environment must serialize to a JSON object")]
    NotAnObject,
    #[error("invalid base64 in environment token: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid JSON in environment token: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure to load branding strings.
#[derive(Debug, thiserror::Error)]
pub enum BrandingError {
    #[error("malformed builtin branding strings: {0}")]
    Builtin(#[source] serde_json::Error),
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed branding strings in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Failure to assemble the server state at startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("cannot encode the client environment: {0}")]
    Codec(#[from] CodecError),
    #[error("cannot build the upstream HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    #[error(transparent)]
    Branding(#[from] BrandingError),
    #[error("cannot open static directory {}: {source}", path.display())]
    StaticDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Failure while forwarding a request upstream.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("no proxy route for {0}")]
    NoRoute(String),
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
    #[error("request body exceeds the {limit} byte upload limit")]
    BodyTooLarge { limit: usize },
    #[error("cannot read request body: {0}")]
    RequestBody(axum::BoxError),
    #[error("cannot build response: {0}")]
    Response(#[from] axum::http::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NoRoute(_) => StatusCode::NOT_FOUND,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::RequestBody(_) => StatusCode::BAD_REQUEST,
            Self::Response(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        error!("{}", self);
        self.status().into_response()
    }
}
