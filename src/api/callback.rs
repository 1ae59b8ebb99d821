use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{server::AppState, spotify::SpotifyError};

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
}

pub async fn callback(
    State(app): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<Response, SpotifyError> {
    let Some(auth) = app.auth.as_ref() else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    let state_ok = match params.state.as_deref() {
        Some(state) => auth.is_state_valid(state).await,
        None => false,
    };
    if !state_ok {
        warn!("OAuth callback rejected: state mismatch");
        return Err(SpotifyError::InvalidInput(
            "Invalid state parameter.".to_string(),
        ));
    }

    let Some(code) = params.code.filter(|c| !c.trim().is_empty()) else {
        return Err(SpotifyError::InvalidInput(
            "Missing authorization code.".to_string(),
        ));
    };

    let grant = auth.exchange_code_for_token(&code).await?;
    if let Some(refresh_token) = grant.refresh_token.as_deref() {
        info!(
            "Spotify refresh token obtained. Save this value to SPOTIFY_REFRESH_TOKEN: {}",
            refresh_token
        );
    }

    Ok((
        StatusCode::OK,
        "Spotify account linked successfully. You may close this window.",
    )
        .into_response())
}
