use axum::http::header;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::instrument;
use url::Url;

use crate::core::error::Error;
use crate::token::clock::Clock;
use crate::token::store::{CachedToken, TokenStore};
use crate::types::request::TokenRequest;
use crate::types::response::TokenResponse;

const DEFAULT_EXPIRES_IN: i64 = 3600;

#[derive(Debug)]
pub(crate) struct Credentials {
    pub(crate) username: String,
    pub(crate) password: SecretString,
}

impl Credentials {
    /// Empty values count as missing.
    pub(crate) fn from_parts(username: Option<&str>, password: Option<&str>) -> Option<Self> {
        match (username, password) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Some(Self {
                    username: username.to_string(),
                    password: SecretString::new(password.into()),
                })
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct IdentityProvider {
    pub(crate) token_url: Url,
    pub(crate) client_id: String,
    pub(crate) scope: String,
}

/// Issues bearer tokens through a password exchange and caches the latest one.
#[derive(Clone)]
pub(crate) struct TokenBroker {
    inner: Arc<Inner>,
}

struct Inner {
    client: reqwest::Client,
    provider: IdentityProvider,
    credentials: Option<Credentials>,
    store: TokenStore,
    clock: Arc<dyn Clock>,
    refresh: Mutex<()>,
}

impl std::fmt::Debug for TokenBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenBroker")
            .field("provider", &self.inner.provider)
            .field("credentials", &self.inner.credentials)
            .finish()
    }
}

impl TokenBroker {
    pub(crate) fn new(
        client: reqwest::Client,
        provider: IdentityProvider,
        credentials: Option<Credentials>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                provider,
                credentials,
                store: TokenStore::default(),
                clock,
                refresh: Mutex::new(()),
            }),
        }
    }

    pub(crate) fn credentials(&self) -> Option<&Credentials> {
        self.inner.credentials.as_ref()
    }

    #[instrument(skip_all)]
    pub(crate) async fn get_access_token(&self) -> Result<SecretString, Error> {
        let token = self.token().await?;

        Ok(SecretString::new(token.token.expose_secret().into()))
    }

    /// The cached token if still valid, otherwise a fresh one. Only one
    /// refresh runs at a time; callers queued behind it reuse its result.
    #[instrument(skip_all)]
    pub(crate) async fn token(&self) -> Result<Arc<CachedToken>, Error> {
        if let Some(token) = self.inner.store.read(self.inner.clock.now()).await {
            return Ok(token);
        }

        let _guard = self.inner.refresh.lock().await;

        if let Some(token) = self.inner.store.read(self.inner.clock.now()).await {
            tracing::debug!("Token refreshed by concurrent request");
            return Ok(token);
        }

        let credentials = self
            .inner
            .credentials
            .as_ref()
            .ok_or(Error::AuthConfiguration)?;

        let token = self.request_token(credentials).await?;

        Ok(self.inner.store.replace(token).await)
    }

    async fn request_token(&self, credentials: &Credentials) -> Result<CachedToken, Error> {
        let provider = &self.inner.provider;

        let form = TokenRequest {
            grant_type: "password",
            client_id: &provider.client_id,
            username: &credentials.username,
            password: credentials.password.expose_secret(),
            scope: &provider.scope,
        };

        tracing::debug!("Requesting access token");
        let resp = self
            .inner
            .client
            .post(provider.token_url.clone())
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(serde_urlencoded::to_string(form)?)
            .send()
            .await
            .map_err(Error::AuthTransport)?;

        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.map_err(Error::AuthTransport)?;
            return Err(Error::AuthUpstream {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.bytes().await.map_err(Error::AuthTransport)?;
        let response =
            serde_json::from_slice::<TokenResponse>(&body).map_err(Error::TokenResponse)?;
        let expires_in = response
            .expires_in
            .filter(|expires_in| *expires_in != 0)
            .unwrap_or(DEFAULT_EXPIRES_IN);

        let token = CachedToken::issue(response.access_token, expires_in, self.inner.clock.now());
        tracing::info!(expires_in, expires_at = %token.expires_at, "Access token refreshed");

        Ok(token)
    }
}
