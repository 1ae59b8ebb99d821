use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    spotify::{self, SpotifyError},
    types::{ClientCredentials, TokenGrant},
};

/// Seconds before expiry at which an access token is already treated as stale.
const EARLY_REFRESH_SECS: i64 = 60;

const MAX_TOKEN_LIFETIME_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at - Duration::seconds(EARLY_REFRESH_SECS)
    }
}

#[derive(Debug)]
struct TokenState {
    access: Option<AccessToken>,
    refresh_token: Option<String>,
}

impl TokenState {
    fn apply(&mut self, grant: &TokenGrant, now: DateTime<Utc>) {
        let lifetime = grant.expires_in.min(MAX_TOKEN_LIFETIME_SECS) as i64;
        self.access = Some(AccessToken {
            value: grant.access_token.clone(),
            expires_at: now + Duration::seconds(lifetime),
        });
        if let Some(refresh_token) = grant
            .refresh_token
            .as_ref()
            .filter(|t| !t.trim().is_empty())
        {
            self.refresh_token = Some(refresh_token.clone());
        }
    }
}

/// Holds the host account's tokens for the lifetime of the process.
///
/// Every read and transition runs under one async mutex, and a refresh keeps
/// the lock across the Accounts call, so at most one refresh is in flight.
pub struct TokenStore {
    http: Client,
    token_url: String,
    credentials: ClientCredentials,
    state: Mutex<TokenState>,
}

impl TokenStore {
    /// Creates a store seeded with an optional refresh token; blank seeds
    /// count as unset.
    pub fn new(
        http: Client,
        token_url: impl Into<String>,
        credentials: ClientCredentials,
        refresh_token: Option<String>,
    ) -> Self {
        let refresh_token = refresh_token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        Self {
            http,
            token_url: token_url.into(),
            credentials,
            state: Mutex::new(TokenState {
                access: None,
                refresh_token,
            }),
        }
    }

    /// Returns an access token valid for at least another minute.
    ///
    /// Refreshes first when there is no token yet or the current one is
    /// inside the early-refresh window.
    ///
    /// # Errors
    ///
    /// - [`SpotifyError::NotConfigured`] when no refresh token is known
    /// - [`SpotifyError::TokenRefreshFailed`] when Accounts rejects the refresh
    pub async fn get_valid_access_token(&self) -> Result<String, SpotifyError> {
        let mut state = self.state.lock().await;
        let Some(refresh_token) = state.refresh_token.clone() else {
            return Err(SpotifyError::NotConfigured(
                "SPOTIFY_REFRESH_TOKEN is not set. Complete /oauth/login first.".to_string(),
            ));
        };

        if let Some(access) = state.access.as_ref() {
            if !access.is_expired(Utc::now()) {
                return Ok(access.value.clone());
            }
        }

        debug!("Refreshing Spotify access token");
        let grant = spotify::auth::refresh_access_token(
            &self.http,
            &self.token_url,
            &self.credentials,
            &refresh_token,
        )
        .await?;
        state.apply(&grant, Utc::now());
        info!(
            "Spotify access token refreshed, valid for {} s",
            grant.expires_in
        );
        Ok(grant.access_token)
    }

    /// Stores a freshly obtained grant.
    ///
    /// The refresh token is replaced only when the grant carries a non-blank
    /// one.
    pub async fn update_from_authorization(&self, grant: &TokenGrant) {
        self.state.lock().await.apply(grant, Utc::now());
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.state.lock().await.refresh_token.clone()
    }

    /// Instant after which the current access token is no longer used.
    pub async fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.access.as_ref().map(|a| a.expires_at)
    }
}
