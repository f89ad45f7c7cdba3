use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use tracing::instrument;

use crate::core::client::Client;
use crate::core::error::Error;
use crate::core::state::AppState;
use crate::types::request::ProxyQuery;
use crate::utils::path::upstream_url;

#[instrument(skip_all, fields(%method))]
pub(crate) async fn forward(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, Error> {
    if method == Method::OPTIONS {
        return Ok(StatusCode::OK.into_response());
    }

    let query = serde_urlencoded::from_str::<ProxyQuery>(uri.query().unwrap_or_default())?;
    let url = upstream_url(state.client.base_url(), &query.path.unwrap_or_default())?;

    let authorization = state.strategy.authorization(&headers).await?;

    let body = if method != Method::GET && method != Method::HEAD && !body.is_empty() {
        Some(serde_json::from_slice::<Value>(&body).map_err(Error::InvalidBody)?)
    } else {
        None
    };

    let resp = state
        .client
        .forward(method, url, authorization, body)
        .await?;

    Client::relay(resp).await
}
