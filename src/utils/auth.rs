use axum::http::{header, HeaderMap, HeaderValue};
use base64::prelude::*;
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use crate::core::config::StrategyKind;
use crate::core::error::{ConfigError, Error};
use crate::token::broker::{Credentials, TokenBroker};

/// How the proxy obtains the `Authorization` header it sends upstream.
/// Exactly one is active per deployment.
#[derive(Debug, Clone)]
pub(crate) enum AuthStrategy {
    /// Forward the client's own header unmodified.
    PassThrough,
    /// A header fixed at startup, `None` when nothing was configured.
    StaticCredential(Option<HeaderValue>),
    BrokeredToken(TokenBroker),
}

impl AuthStrategy {
    pub(crate) fn new(
        kind: StrategyKind,
        token: Option<&SecretString>,
        credentials: Option<&Credentials>,
        broker: &TokenBroker,
    ) -> Result<Self, ConfigError> {
        Ok(match kind {
            StrategyKind::PassThrough => Self::PassThrough,
            StrategyKind::StaticCredential => {
                Self::StaticCredential(static_authorization(token, credentials)?)
            }
            StrategyKind::BrokeredToken => Self::BrokeredToken(broker.clone()),
        })
    }

    #[instrument(skip_all)]
    pub(crate) async fn authorization(&self, headers: &HeaderMap) -> Result<HeaderValue, Error> {
        match self {
            Self::PassThrough => headers
                .get(header::AUTHORIZATION)
                .cloned()
                .ok_or(Error::NoCredentials),
            Self::StaticCredential(value) => value.clone().ok_or(Error::NoCredentials),
            Self::BrokeredToken(broker) => {
                let token = broker.get_access_token().await?;
                bearer(token.expose_secret()).map_err(Error::Header)
            }
        }
    }
}

/// A configured bearer token wins over basic credentials.
fn static_authorization(
    token: Option<&SecretString>,
    credentials: Option<&Credentials>,
) -> Result<Option<HeaderValue>, axum::http::header::InvalidHeaderValue> {
    if let Some(token) = token.filter(|token| !token.expose_secret().is_empty()) {
        return bearer(token.expose_secret()).map(Some);
    }

    credentials
        .map(|credentials| {
            let encoded = BASE64_STANDARD.encode(format!(
                "{}:{}",
                credentials.username,
                credentials.password.expose_secret()
            ));
            sensitive(format!("Basic {}", encoded))
        })
        .transpose()
}

fn bearer(token: &str) -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
    sensitive(format!("Bearer {}", token))
}

fn sensitive(value: String) -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
    let mut value = HeaderValue::from_str(&value)?;
    value.set_sensitive(true);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::broker::IdentityProvider;
    use crate::token::clock::SystemClock;
    use std::sync::Arc;
    use url::Url;

    fn idle_broker() -> TokenBroker {
        let provider = IdentityProvider {
            token_url: Url::parse("http://127.0.0.1:9/token").unwrap(),
            client_id: "dashboard".into(),
            scope: "openid".into(),
        };

        TokenBroker::new(
            reqwest::Client::new(),
            provider,
            None,
            Arc::new(SystemClock),
        )
    }

    fn secret(value: &str) -> SecretString {
        SecretString::new(value.into())
    }

    #[tokio::test]
    async fn test_pass_through_copies_client_header() {
        let strategy =
            AuthStrategy::new(StrategyKind::PassThrough, None, None, &idle_broker()).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer client"));

        let value = strategy.authorization(&headers).await.unwrap();

        assert_eq!(value, "Bearer client");
    }

    #[tokio::test]
    async fn test_pass_through_without_header_has_no_credentials() {
        let strategy =
            AuthStrategy::new(StrategyKind::PassThrough, None, None, &idle_broker()).unwrap();

        assert!(matches!(
            strategy.authorization(&HeaderMap::new()).await,
            Err(Error::NoCredentials)
        ));
    }

    #[tokio::test]
    async fn test_static_prefers_bearer_token() {
        let credentials = Credentials::from_parts(Some("operator"), Some("s3cret"));
        let strategy = AuthStrategy::new(
            StrategyKind::StaticCredential,
            Some(&secret("long-lived")),
            credentials.as_ref(),
            &idle_broker(),
        )
        .unwrap();

        let value = strategy.authorization(&HeaderMap::new()).await.unwrap();

        assert_eq!(value, "Bearer long-lived");
        assert!(value.is_sensitive());
    }

    #[tokio::test]
    async fn test_static_falls_back_to_basic() {
        let credentials = Credentials::from_parts(Some("operator"), Some("s3cret"));
        let strategy = AuthStrategy::new(
            StrategyKind::StaticCredential,
            Some(&secret("")),
            credentials.as_ref(),
            &idle_broker(),
        )
        .unwrap();

        let value = strategy.authorization(&HeaderMap::new()).await.unwrap();

        // base64("operator:s3cret")
        assert_eq!(value, "Basic b3BlcmF0b3I6czNjcmV0");
    }

    #[tokio::test]
    async fn test_static_ignores_client_header() {
        let strategy =
            AuthStrategy::new(StrategyKind::StaticCredential, None, None, &idle_broker()).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer client"));

        assert!(matches!(
            strategy.authorization(&headers).await,
            Err(Error::NoCredentials)
        ));
    }

    #[tokio::test]
    async fn test_brokered_without_credentials_fails_before_network() {
        let strategy =
            AuthStrategy::new(StrategyKind::BrokeredToken, None, None, &idle_broker()).unwrap();

        assert!(matches!(
            strategy.authorization(&HeaderMap::new()).await,
            Err(Error::AuthConfiguration)
        ));
    }
}
