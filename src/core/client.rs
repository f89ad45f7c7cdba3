use axum::body::Bytes;
use axum::http::{header, HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;
use tracing::instrument;
use url::Url;

use crate::core::error::Error;

/// Forwards requests to the telemetry API and relays what comes back.
#[derive(Clone)]
pub(crate) struct Client {
    client: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl Client {
    pub(crate) fn new(client: reqwest::Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    pub(crate) fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[instrument(skip_all, fields(%method, url = %url))]
    pub(crate) async fn forward(
        &self,
        method: Method,
        url: Url,
        authorization: HeaderValue,
        body: Option<Value>,
    ) -> Result<reqwest::Response, Error> {
        let mut request = self
            .client
            .request(method, url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, authorization);

        if let Some(body) = body {
            request = request.body(serde_json::to_vec(&body)?);
        }

        let resp = request.send().await.map_err(Error::Upstream)?;
        tracing::debug!(status = %resp.status(), "Upstream responded");

        Ok(resp)
    }

    /// JSON responses are parsed and re-emitted; anything else (gateway error
    /// pages, plain text) is passed through as text so its status survives.
    pub(crate) async fn relay(resp: reqwest::Response) -> Result<Response, Error> {
        let status = resp.status();
        let content_type = resp.headers().get(header::CONTENT_TYPE).cloned();

        let is_json = content_type
            .as_ref()
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("application/json"));

        if is_json {
            let body: Bytes = resp.bytes().await.map_err(Error::Upstream)?;

            if body.is_empty() {
                return Ok(status.into_response());
            }

            let value = serde_json::from_slice::<Value>(&body)
                .map_err(|source| Error::UpstreamBody { status, source })?;

            return Ok((status, Json(value)).into_response());
        }

        let text = resp.text().await.map_err(Error::Upstream)?;
        let mut response = (status, text).into_response();

        if let Some(content_type) = content_type {
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, content_type);
        }

        Ok(response)
    }
}
