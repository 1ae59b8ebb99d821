use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::{server::AppState, spotify::SpotifyError};

pub async fn login(State(state): State<AppState>) -> Result<Response, SpotifyError> {
    let Some(auth) = state.auth.as_ref() else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    let url = auth.build_login_url().await?;
    Ok((StatusCode::FOUND, [(header::LOCATION, url)]).into_response())
}
