use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use reqwest::{Client, StatusCode, header::RETRY_AFTER};
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::{
    management::TokenStore,
    spotify::{RateGovernor, SpotifyError, governor},
    utils,
};

/// Outcome of a single GET attempt.
enum Attempt<T> {
    Done(T),
    Throttled(u64),
}

/// Authenticated, governed access to the Spotify Web API.
pub struct ApiClient {
    http: Client,
    api_url: String,
    tokens: Arc<TokenStore>,
    governor: RateGovernor,
}

impl ApiClient {
    pub fn new(
        http: Client,
        api_url: impl Into<String>,
        tokens: Arc<TokenStore>,
        governor: RateGovernor,
    ) -> Self {
        Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            tokens,
            governor,
        }
    }

    /// Base URL of the Web API, without trailing slash.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn governor(&self) -> &RateGovernor {
        &self.governor
    }

    /// GETs `url` and deserializes the body as `T`.
    ///
    /// The call waits out any global backoff and holds a governor permit for
    /// its whole duration. A 429 records the `Retry-After` deadline, sleeps
    /// it off and retries exactly once.
    ///
    /// # Errors
    ///
    /// - [`SpotifyError::RateLimited`] when the retry is throttled as well
    /// - [`SpotifyError::Upstream`] for any other non-2xx status
    /// - token store failures while obtaining the bearer token
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, SpotifyError> {
        self.governor
            .gated(|| self.execute_with_backoff::<T>(url))
            .await
    }

    async fn execute_with_backoff<T: DeserializeOwned>(&self, url: &str) -> Result<T, SpotifyError> {
        let retry_seconds = match self.do_get(url).await? {
            Attempt::Done(value) => return Ok(value),
            Attempt::Throttled(seconds) => seconds,
        };

        let deadline = self.governor.note_retry_after(retry_seconds);
        warn!(
            "Spotify 429 received. Global backoff until {}.",
            governor::format_epoch_ms(deadline)
        );
        sleep(Duration::from_secs(retry_seconds)).await;

        match self.do_get(url).await? {
            Attempt::Done(value) => Ok(value),
            Attempt::Throttled(_) => {
                warn!("Spotify 429 received again on retry: {}", url);
                Err(SpotifyError::RateLimited)
            }
        }
    }

    async fn do_get<T: DeserializeOwned>(&self, url: &str) -> Result<Attempt<T>, SpotifyError> {
        let token = self.tokens.get_valid_access_token().await?;

        let start = Instant::now();
        info!("Spotify request start: {}", url);
        let response = self.http.get(url).bearer_auth(token).send().await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok());
            return Ok(Attempt::Throttled(utils::parse_retry_after(retry_after)));
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Spotify request failed with {}: {}", status, url);
            return Err(SpotifyError::Upstream { status, message });
        }

        let body = response.json::<T>().await?;
        info!(
            "Spotify request finished in {} ms: {}",
            start.elapsed().as_millis(),
            url
        );
        Ok(Attempt::Done(body))
    }
}
