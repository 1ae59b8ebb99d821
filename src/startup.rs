//! Process bootstrap: environment, logging and a fail-fast check of the
//! Spotify credentials.

use tracing::info;

use crate::{config, logging, management::TokenStore, spotify::SpotifyError};

/// Loads `.env` files, then installs the tracing subscriber.
///
/// `RUST_LOG` may therefore come from the process environment or a `.env`
/// file, the former winning.
///
/// # Errors
///
/// Returns the `.env` parse or I/O failure; logging is not installed then.
pub async fn init_environment(verbose: bool) -> Result<(), String> {
    config::load_env().await?;
    logging::init(verbose);
    Ok(())
}

/// Proves the configured refresh token works before serving traffic.
///
/// With OAuth enabled the token may legitimately be missing until the
/// operator completes `/oauth/login`, so nothing is checked. Otherwise a
/// refresh token must be present and must yield an access token.
///
/// # Errors
///
/// [`SpotifyError::NotConfigured`] when the refresh token is missing or
/// Accounts rejects it.
pub async fn validate(oauth_enabled: bool, tokens: &TokenStore) -> Result<(), SpotifyError> {
    if oauth_enabled {
        info!("Spotify OAuth endpoints enabled.");
        return Ok(());
    }

    info!("Spotify OAuth endpoints disabled. Using refresh token authentication only.");
    if tokens.refresh_token().await.is_none() {
        return Err(SpotifyError::NotConfigured(
            "SPOTIFY_REFRESH_TOKEN is required when OAuth is disabled.".to_string(),
        ));
    }

    tokens
        .get_valid_access_token()
        .await
        .map_err(|e| SpotifyError::NotConfigured(e.to_string()))?;
    Ok(())
}
