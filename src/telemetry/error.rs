use reqwest::StatusCode;

/// Errors returned by [`TelemetryClient`](super::TelemetryClient).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The API (or proxy) answered 401.
    #[error("Authentication required. Please check your credentials.")]
    Unauthorized,
    /// Any other non-success status.
    #[error("API Error: {0}")]
    Status(StatusCode),
    /// Transport failure or an undecodable body.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("URL encoding error: {0}")]
    URLEncode(#[from] serde_urlencoded::ser::Error),
}
