use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::types::response::ErrorBody;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("Reqwest error: {0}")]
    HTTPClient(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("Invalid header value: {0}")]
    Header(#[from] axum::http::header::InvalidHeaderValue),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("SHEARSTREAM_USERNAME and SHEARSTREAM_PASSWORD must be configured")]
    AuthConfiguration,
    #[error("OAuth authentication failed: {status} {body}")]
    AuthUpstream { status: u16, body: String },
    #[error("Identity provider request failed: {0}")]
    AuthTransport(#[source] reqwest::Error),
    #[error("Invalid token response: {0}")]
    TokenResponse(#[source] serde_json::Error),
    #[error("URL encoding error: {0}")]
    URLEncode(#[from] serde_urlencoded::ser::Error),
    #[error("No credentials configured")]
    NoCredentials,
    #[error("Upstream request failed: {0}")]
    Upstream(#[source] reqwest::Error),
    #[error("Upstream returned invalid JSON ({status}): {source}")]
    UpstreamBody {
        status: StatusCode,
        source: serde_json::Error,
    },
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Invalid header value: {0}")]
    Header(#[from] axum::http::header::InvalidHeaderValue),
    #[error("Invalid upstream path: {0}")]
    InvalidPath(String),
    #[error("Invalid query string: {0}")]
    Query(#[from] serde_urlencoded::de::Error),
    #[error("Request body is not valid JSON: {0}")]
    InvalidBody(#[source] serde_json::Error),
}

impl Error {
    fn status(&self) -> StatusCode {
        match self {
            Error::UpstreamBody { status, .. }
                if status.is_client_error() || status.is_server_error() =>
            {
                *status
            }
            Error::InvalidPath(_) | Error::Query(_) | Error::InvalidBody(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Error::AuthConfiguration
            | Error::AuthUpstream { .. }
            | Error::AuthTransport(_)
            | Error::TokenResponse(_)
            | Error::URLEncode(_) => "Authentication failed",
            Error::NoCredentials => "No credentials configured",
            Error::InvalidPath(_) | Error::Query(_) | Error::InvalidBody(_) => {
                "Invalid proxy request"
            }
            Error::Upstream(_)
            | Error::UpstreamBody { .. }
            | Error::Serialize(_)
            | Error::Header(_) => "Proxy request failed",
        }
    }

    /// Underlying causes, outermost first, or `None` for leaf errors.
    fn stack(&self) -> Option<String> {
        let mut source = std::error::Error::source(self);
        let mut causes = Vec::new();

        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }

        if causes.is_empty() {
            None
        } else {
            Some(causes.join("\n"))
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::error!("{:?}", self);

        let body = ErrorBody {
            error: self.label(),
            message: self.to_string(),
            stack: self.stack(),
        };

        (self.status(), Json(body)).into_response()
    }
}
