use std::sync::Arc;

use reqwest::{Client, Url};
use tokio::sync::Mutex;

use crate::{
    management::TokenStore,
    spotify::{self, SpotifyError},
    types::{ClientCredentials, TokenGrant},
    utils,
};

/// Authorization Code flow for linking the host account once.
///
/// Only the most recent `state` is remembered, so overlapping logins race and
/// the last one wins. This is intended for a single operator.
pub struct AuthFlow {
    http: Client,
    auth_url: String,
    token_url: String,
    credentials: ClientCredentials,
    redirect_uri: String,
    scope: Option<String>,
    tokens: Arc<TokenStore>,
    last_state: Mutex<Option<String>>,
}

impl AuthFlow {
    pub fn new(
        http: Client,
        auth_url: impl Into<String>,
        token_url: impl Into<String>,
        credentials: ClientCredentials,
        redirect_uri: impl Into<String>,
        scope: Option<String>,
        tokens: Arc<TokenStore>,
    ) -> Self {
        Self {
            http,
            auth_url: auth_url.into(),
            token_url: token_url.into(),
            credentials,
            redirect_uri: redirect_uri.into(),
            scope: scope.filter(|s| !s.trim().is_empty()),
            tokens,
            last_state: Mutex::new(None),
        }
    }

    /// Issues a fresh `state` and returns the Spotify authorize URL.
    ///
    /// # Errors
    ///
    /// [`SpotifyError::NotConfigured`] if the configured authorize URL does
    /// not parse.
    pub async fn build_login_url(&self) -> Result<String, SpotifyError> {
        let mut last_state = self.last_state.lock().await;
        let state = utils::generate_state();

        let mut url = Url::parse(&self.auth_url)
            .map_err(|e| SpotifyError::NotConfigured(format!("invalid authorize URL: {}", e)))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", "code")
                .append_pair("client_id", &self.credentials.client_id)
                .append_pair("redirect_uri", &self.redirect_uri)
                .append_pair("state", &state);
            if let Some(scope) = &self.scope {
                query.append_pair("scope", scope);
            }
        }

        *last_state = Some(state);
        Ok(url.into())
    }

    /// True iff `state` equals the most recently issued one.
    pub async fn is_state_valid(&self, state: &str) -> bool {
        match self.last_state.lock().await.as_deref() {
            Some(expected) => utils::constant_time_eq(expected, state),
            None => false,
        }
    }

    /// Trades an authorization code for tokens and hands them to the
    /// [`TokenStore`].
    ///
    /// # Errors
    ///
    /// [`SpotifyError::AuthExchangeFailed`] on any non-2xx answer or a body
    /// without access token.
    pub async fn exchange_code_for_token(&self, code: &str) -> Result<TokenGrant, SpotifyError> {
        let _guard = self.last_state.lock().await;
        let grant = spotify::auth::exchange_code(
            &self.http,
            &self.token_url,
            &self.credentials,
            code,
            &self.redirect_uri,
        )
        .await?;
        self.tokens.update_from_authorization(&grant).await;
        Ok(grant)
    }
}
