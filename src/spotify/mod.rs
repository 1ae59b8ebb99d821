//! # Spotify Integration Module
//!
//! This module is the access layer between the backend and Spotify's two
//! services: the Accounts service (token endpoint) and the Web API.
//!
//! ## Architecture
//!
//! ```text
//! HTTP handlers
//!      ↓
//! playlists::fetch_playlist   (paginate, de-duplicate, project, sort)
//!      ↓
//! ApiClient::get              (bearer auth, one-shot retry on 429)
//!      ↓
//! RateGovernor::gated         (global backoff deadline + permit pool)
//!      ↓
//! Spotify Web API
//! ```
//!
//! Token refreshes run beside this stack: [`crate::management::TokenStore`]
//! calls [`auth::refresh_access_token`] directly, never through the governor.
//!
//! ## Rate Limiting
//!
//! - Every Web API call first waits out the global `Retry-After` deadline and
//!   then takes a permit; with the default single permit all calls are
//!   serialized.
//! - A 429 moves the deadline forward for everyone, sleeps the window while
//!   still holding the permit and retries once. A second 429 surfaces as
//!   [`SpotifyError::RateLimited`].
//!
//! ## Error Types
//!
//! All functions return [`SpotifyError`], matched to a status code at the
//! HTTP boundary.

pub mod auth;
mod client;
mod error;
mod governor;
pub mod playlists;

pub use client::ApiClient;
pub use error::{SpotifyError, UNAVAILABLE_MESSAGE};
pub use governor::RateGovernor;
