use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Seconds before the provider's expiry at which a token stops being served.
pub(crate) const EXPIRY_MARGIN_SECS: i64 = 300;

#[derive(Debug)]
pub(crate) struct CachedToken {
    pub(crate) token: SecretString,
    pub(crate) expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// `expires_at` never lands before `issued_at`, even when `expires_in`
    /// is shorter than the margin.
    pub(crate) fn issue(token: String, expires_in: i64, issued_at: DateTime<Utc>) -> Self {
        let lifetime = Duration::try_seconds(expires_in.saturating_sub(EXPIRY_MARGIN_SECS).max(0))
            .unwrap_or(Duration::MAX);

        Self {
            token: SecretString::new(token.into()),
            expires_at: issued_at
                .checked_add_signed(lifetime)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    pub(crate) fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Holds at most one token; a refresh replaces it outright.
#[derive(Debug, Default)]
pub(crate) struct TokenStore {
    current: RwLock<Option<Arc<CachedToken>>>,
}

impl TokenStore {
    pub(crate) async fn read(&self, now: DateTime<Utc>) -> Option<Arc<CachedToken>> {
        self.current
            .read()
            .await
            .as_ref()
            .filter(|token| token.is_valid_at(now))
            .cloned()
    }

    pub(crate) async fn replace(&self, token: CachedToken) -> Arc<CachedToken> {
        let token = Arc::new(token);
        *self.current.write().await = Some(Arc::clone(&token));
        token
    }
}
