use axum::extract::State;
use axum::Json;
use secrecy::ExposeSecret;
use tracing::instrument;

use crate::core::error::Error;
use crate::core::state::AppState;
use crate::types::response::AuthStatus;

/// Reports on the broker's current token without revealing it.
#[instrument(skip_all)]
pub(crate) async fn status(State(state): State<AppState>) -> Result<Json<AuthStatus>, Error> {
    let token = state.broker.token().await?;

    Ok(Json(AuthStatus {
        success: true,
        token_length: token.token.expose_secret().len(),
        expires_at: token.expires_at.timestamp_millis(),
    }))
}
