//! # API Module
//!
//! HTTP handlers of the backend, built on [Axum](https://docs.rs/axum).
//!
//! ## Endpoints
//!
//! - [`playlist`] - `GET /api/playlist/{id}`: playlist name and tracks ordered
//!   by release year. Answers 400 for a blank id and 503 while Spotify keeps
//!   throttling.
//! - [`login`] - `GET /oauth/login`: 302 to Spotify's authorize page with a
//!   fresh CSRF `state`.
//! - [`callback`] - `GET /oauth/callback`: validates `state`, exchanges the
//!   code and stores the resulting tokens.
//! - [`health`] - `GET /health`: status and version for monitoring.
//!
//! The OAuth endpoints are only routed when OAuth is enabled in the
//! configuration.
//!
//! ## Errors
//!
//! Handlers return [`crate::spotify::SpotifyError`], which converts into a
//! plain-text response with the matching status code.

mod callback;
mod error;
mod health;
mod login;
mod playlist;

pub use callback::callback;
pub use health::health;
pub use login::login;
pub use playlist::playlist;
