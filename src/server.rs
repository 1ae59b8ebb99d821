use std::{net::SocketAddr, str::FromStr, sync::Arc, time::Duration};

use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::get,
};
use reqwest::Client;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::{
    Res, api,
    config::Config,
    management::{AuthFlow, TokenStore},
    spotify::{ApiClient, RateGovernor, SpotifyError},
    types::ClientCredentials,
};

/// Timeout applied to every outbound Spotify call.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Process-lifetime handles shared by all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenStore>,
    pub spotify: Arc<ApiClient>,
    /// Present only when the OAuth endpoints are enabled.
    pub auth: Option<Arc<AuthFlow>>,
}

impl AppState {
    /// Wires token store, governor, API client and (optionally) the login
    /// flow from configuration. No network traffic happens here.
    pub fn from_config(config: &Config) -> Result<Self, SpotifyError> {
        let http = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        let credentials = ClientCredentials {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        };

        let tokens = Arc::new(TokenStore::new(
            http.clone(),
            config.token_url.clone(),
            credentials.clone(),
            config.refresh_token.clone(),
        ));

        let spotify = Arc::new(ApiClient::new(
            http.clone(),
            config.api_url.clone(),
            Arc::clone(&tokens),
            RateGovernor::new(config.max_concurrent_calls),
        ));

        let auth = match (config.oauth_enabled, config.redirect_uri.as_ref()) {
            (true, Some(redirect_uri)) => Some(Arc::new(AuthFlow::new(
                http,
                config.auth_url.clone(),
                config.token_url.clone(),
                credentials,
                redirect_uri.clone(),
                config.scope.clone(),
                Arc::clone(&tokens),
            ))),
            (true, None) => {
                return Err(SpotifyError::NotConfigured(
                    "SPOTIFY_REDIRECT_URI is required when OAuth is enabled.".to_string(),
                ));
            }
            (false, _) => None,
        };

        Ok(Self {
            tokens,
            spotify,
            auth,
        })
    }
}

/// Builds the application router.
///
/// `/api/**` only accepts `GET` from `frontend_origin`; the OAuth routes are
/// mounted only when the state carries an [`AuthFlow`].
pub fn router(state: AppState, frontend_origin: HeaderValue) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(frontend_origin)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/playlist/{id}", get(api::playlist))
        .layer(cors);

    let mut app = Router::new()
        .route("/health", get(api::health))
        .nest("/api", api_routes);

    if state.auth.is_some() {
        app = app
            .route("/oauth/login", get(api::login))
            .route("/oauth/callback", get(api::callback));
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Serves the router on `config.server_addr` until Ctrl-C.
pub async fn start_api_server(config: &Config, state: AppState) -> Res<()> {
    let addr = SocketAddr::from_str(&config.server_addr)?;
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    serve(listener, state, config.frontend_origin.clone(), ctrl_c()).await?;
    info!("Server stopped");
    Ok(())
}

/// Serves the router on `listener` until `shutdown` resolves.
///
/// The governor is closed as soon as `shutdown` fires, before open
/// connections drain, so calls still queued for a permit fail with
/// `Unavailable` (503) instead of reaching Spotify.
pub async fn serve<S>(
    listener: TcpListener,
    state: AppState,
    frontend_origin: HeaderValue,
    shutdown: S,
) -> std::io::Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    let spotify = Arc::clone(&state.spotify);
    let app = router(state, frontend_origin);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("Shutting down, rejecting queued Spotify calls");
            spotify.governor().close();
        })
        .await
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
