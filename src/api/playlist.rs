use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::{server::AppState, spotify::SpotifyError, spotify::playlists, utils};

pub async fn playlist(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, SpotifyError> {
    let Some(playlist_id) = utils::extract_playlist_id(&raw_id) else {
        debug!("Rejected blank playlist id");
        return Ok(StatusCode::BAD_REQUEST.into_response());
    };

    let playlist = playlists::fetch_playlist(&state.spotify, &playlist_id).await?;
    Ok(Json(playlist).into_response())
}
