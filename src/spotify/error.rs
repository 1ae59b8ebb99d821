use reqwest::StatusCode;

/// Message surfaced to clients whenever Spotify throttling wins.
pub const UNAVAILABLE_MESSAGE: &str =
    "Spotify API temporarily unavailable. Please try again shortly.";

/// Failures of the Spotify access layer.
#[derive(Debug, thiserror::Error)]
pub enum SpotifyError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not configured: {0}")]
    NotConfigured(String),
    #[error("failed to refresh Spotify access token: {0}")]
    TokenRefreshFailed(String),
    #[error("failed to exchange authorization code for tokens: {0}")]
    AuthExchangeFailed(String),
    #[error("{}", UNAVAILABLE_MESSAGE)]
    RateLimited,
    #[error("{}", UNAVAILABLE_MESSAGE)]
    Unavailable,
    #[error("Spotify returned {status}: {message}")]
    Upstream { status: StatusCode, message: String },
    #[error("Spotify request failed: {0}")]
    Http(#[from] reqwest::Error),
}
