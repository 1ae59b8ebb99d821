use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::spotify::{SpotifyError, UNAVAILABLE_MESSAGE};

impl IntoResponse for SpotifyError {
    fn into_response(self) -> Response {
        match self {
            SpotifyError::InvalidInput(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            SpotifyError::RateLimited | SpotifyError::Unavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, UNAVAILABLE_MESSAGE).into_response()
            }
            other => {
                error!("Request failed: {}", other);
                let message = match other {
                    SpotifyError::NotConfigured(_) => "Spotify access is not configured.",
                    SpotifyError::TokenRefreshFailed(_) => "Failed to refresh Spotify access token.",
                    SpotifyError::AuthExchangeFailed(_) => {
                        "Failed to exchange authorization code for tokens."
                    }
                    _ => "Spotify request failed.",
                };
                (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
            }
        }
    }
}
