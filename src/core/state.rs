use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::core::client::Client;
use crate::core::config::{Args, StrategyKind};
use crate::core::error::ConfigError;
use crate::token::broker::{Credentials, IdentityProvider, TokenBroker};
use crate::token::clock::{Clock, SystemClock};
use crate::utils::auth::AuthStrategy;
use crate::utils::path::normalize_base;

#[derive(Clone, Debug)]
pub(crate) struct AppState {
    pub(crate) client: Client,
    pub(crate) broker: TokenBroker,
    pub(crate) strategy: Arc<AuthStrategy>,
}

impl AppState {
    pub(crate) fn new(args: &Args) -> Result<Self, ConfigError> {
        Self::with_clock(args, Arc::new(SystemClock))
    }

    pub(crate) fn with_clock(args: &Args, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        let http = reqwest::ClientBuilder::new()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(args.request_timeout))
            .build()?;

        let credentials =
            Credentials::from_parts(args.username.as_deref(), args.password.as_deref());
        let token = args
            .token
            .as_deref()
            .map(|token| SecretString::new(token.into()));

        if credentials.is_none() && args.auth_strategy == StrategyKind::BrokeredToken {
            tracing::warn!("No username/password configured, token exchange is unavailable");
        }

        let provider = IdentityProvider {
            token_url: Url::parse(&args.token_url)?,
            client_id: args.client_id.clone(),
            scope: args.scope.clone(),
        };

        let broker = TokenBroker::new(http.clone(), provider, credentials, clock);
        let strategy = AuthStrategy::new(
            args.auth_strategy,
            token.as_ref(),
            broker.credentials(),
            &broker,
        )?;

        tracing::info!(strategy = ?args.auth_strategy, "Authorization strategy selected");

        Ok(AppState {
            client: Client::new(http, normalize_base(&args.api_url)?),
            broker,
            strategy: Arc::new(strategy),
        })
    }
}
