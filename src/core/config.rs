use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};
use serde::Deserialize;

pub(crate) const DEFAULT_API_URL: &str = "https://app.shearstreaming.com/api/v1/";
pub(crate) const DEFAULT_TOKEN_URL: &str =
    "https://shield.shearfrac.com/realms/sfg/protocol/openid-connect/token";
pub(crate) const DEFAULT_CLIENT_ID: &str =
    "production-shearstreamweb-9836353444ef91f9ac6f5f3b842b860a";
pub(crate) const DEFAULT_SCOPE: &str = "openid organization email profile";

/// Which credential the proxy attaches to upstream requests.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub(crate) enum StrategyKind {
    PassThrough,
    StaticCredential,
    BrokeredToken,
}

#[derive(Deserialize, Clone)]
pub(crate) struct Args {
    pub(crate) username: Option<String>,
    pub(crate) password: Option<String>,
    pub(crate) token: Option<String>,
    pub(crate) auth_strategy: StrategyKind,
    pub(crate) api_url: String,
    pub(crate) token_url: String,
    pub(crate) client_id: String,
    pub(crate) scope: String,
    /// seconds
    pub(crate) request_timeout: u64,
    pub(crate) log_level: String,
    pub(crate) port: u16,
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("auth_strategy", &self.auth_strategy)
            .field("api_url", &self.api_url)
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("scope", &self.scope)
            .field("request_timeout", &self.request_timeout)
            .field("log_level", &self.log_level)
            .field("port", &self.port)
            .finish()
    }
}

impl Args {
    /// Defaults, then `shearstream.toml` if present, then `SHEARSTREAM_*` variables.
    pub(crate) fn load() -> Result<Self, ConfigError> {
        defaults()?
            .add_source(config::File::with_name("shearstream").required(false))
            .add_source(config::Environment::with_prefix("SHEARSTREAM"))
            .build()?
            .try_deserialize::<Args>()
    }
}

pub(crate) fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("auth_strategy", "brokered_token")?
        .set_default("api_url", DEFAULT_API_URL)?
        .set_default("token_url", DEFAULT_TOKEN_URL)?
        .set_default("client_id", DEFAULT_CLIENT_ID)?
        .set_default("scope", DEFAULT_SCOPE)?
        .set_default("request_timeout", 30_i64)?
        .set_default("log_level", "info")?
        .set_default("port", 3000_i64)
}
