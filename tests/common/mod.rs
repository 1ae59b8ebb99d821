//! In-process stub of Spotify Accounts and the Web API for integration tests.
#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU16, AtomicU64, AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use muzikant::{
    config::Config,
    server::{self, AppState},
};
use serde_json::{Value, json};

#[derive(Debug, Clone)]
pub struct ApiCall {
    pub uri: String,
    pub bearer: Option<String>,
    pub started: Instant,
}

#[derive(Debug, Clone)]
pub struct TokenCall {
    pub form: HashMap<String, String>,
    pub authorization: Option<String>,
}

pub struct StubState {
    pub base_url: Mutex<String>,
    pub playlist_name: Mutex<Option<String>>,
    /// Items served per page, page N answering `offset = N * 100`. Offsets
    /// past the last page answer `items: null`.
    pub pages: Mutex<Vec<Vec<Value>>>,
    /// Raw `next` sent with the last page instead of `null`.
    pub last_next: Mutex<Option<String>>,
    /// Upcoming Web API calls to answer with 429; the value is the raw
    /// `Retry-After` header, `None` to omit it.
    pub throttles: Mutex<VecDeque<Option<String>>>,
    /// Status returned by the Web API when not 200.
    pub api_status: AtomicU16,
    pub api_delay_ms: AtomicU64,
    pub api_calls: Mutex<Vec<ApiCall>>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub token_status: AtomicU16,
    pub token_expires_in: AtomicU64,
    /// Refresh token handed out with every grant, if any.
    pub issued_refresh_token: Mutex<Option<String>>,
    pub token_calls: Mutex<Vec<TokenCall>>,
}

pub struct StubSpotify {
    pub addr: SocketAddr,
    pub state: Arc<StubState>,
}

impl StubSpotify {
    pub async fn start() -> Self {
        let state = Arc::new(StubState {
            base_url: Mutex::new(String::new()),
            playlist_name: Mutex::new(Some("X".to_string())),
            pages: Mutex::new(vec![Vec::new()]),
            last_next: Mutex::new(None),
            throttles: Mutex::new(VecDeque::new()),
            api_status: AtomicU16::new(200),
            api_delay_ms: AtomicU64::new(0),
            api_calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            token_status: AtomicU16::new(200),
            token_expires_in: AtomicU64::new(3600),
            issued_refresh_token: Mutex::new(None),
            token_calls: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/api/token", post(token))
            .route("/v1/playlists/{id}", get(playlist_name))
            .route("/v1/playlists/{id}/tracks", get(playlist_tracks))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        *state.base_url.lock().unwrap() = format!("http://{}", addr);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn api_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    pub fn token_url(&self) -> String {
        format!("http://{}/api/token", self.addr)
    }

    pub fn auth_url(&self) -> String {
        format!("http://{}/authorize", self.addr)
    }

    pub fn set_pages(&self, pages: Vec<Vec<Value>>) {
        *self.state.pages.lock().unwrap() = pages;
    }

    pub fn set_last_next(&self, next: &str) {
        *self.state.last_next.lock().unwrap() = Some(next.to_string());
    }

    pub fn throttle(&self, retry_after: Option<&str>) {
        self.state
            .throttles
            .lock()
            .unwrap()
            .push_back(retry_after.map(str::to_string));
    }

    pub fn api_calls(&self) -> Vec<ApiCall> {
        self.state.api_calls.lock().unwrap().clone()
    }

    pub fn token_calls(&self) -> Vec<TokenCall> {
        self.state.token_calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }

    /// Configuration pointing every Spotify URL at this stub.
    ///
    /// `overrides` replace defaults; an empty value removes the key.
    pub fn config(&self, overrides: &[(&str, &str)]) -> Config {
        let mut vars: HashMap<String, String> = [
            ("SPOTIFY_CLIENT_ID", "client-id".to_string()),
            ("SPOTIFY_CLIENT_SECRET", "client-secret".to_string()),
            ("SPOTIFY_REFRESH_TOKEN", "refresh-0".to_string()),
            ("SPOTIFY_API_URL", self.api_url()),
            ("SPOTIFY_API_TOKEN_URL", self.token_url()),
            ("SPOTIFY_API_AUTH_URL", self.auth_url()),
            ("FRONTEND_ORIGIN", "http://frontend.test".to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        for (key, value) in overrides {
            if value.is_empty() {
                vars.remove(*key);
            } else {
                vars.insert(key.to_string(), value.to_string());
            }
        }

        Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
    }
}

/// Runs the real router on an ephemeral port.
pub async fn serve_app(config: &Config) -> (SocketAddr, AppState) {
    let state = AppState::from_config(config).unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let origin = config.frontend_origin.clone();
    let app_state = state.clone();
    tokio::spawn(async move {
        server::serve(listener, app_state, origin, std::future::pending())
            .await
            .unwrap();
    });
    (addr, state)
}

/// A playlist item as Spotify returns it for the requested `fields`.
pub fn item(id: &str, name: &str, artists: &[&str], release_date: Option<&str>) -> Value {
    json!({
        "is_local": false,
        "track": {
            "id": id,
            "name": name,
            "artists": artists.iter().map(|a| json!({ "name": a })).collect::<Vec<_>>(),
            "album": { "name": format!("{} album", name), "release_date": release_date },
            "external_urls": { "spotify": format!("https://open.spotify.com/track/{}", id) }
        }
    })
}

pub fn local_item(id: &str, name: &str) -> Value {
    json!({
        "is_local": true,
        "track": { "id": id, "name": name, "artists": [], "album": null, "external_urls": {} }
    })
}

async fn token(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    state.token_calls.lock().unwrap().push(TokenCall {
        form,
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });

    let status = StatusCode::from_u16(state.token_status.load(Ordering::SeqCst)).unwrap();
    if status != StatusCode::OK {
        return (status, Json(json!({ "error": "invalid_grant" }))).into_response();
    }

    let n = state.token_calls.lock().unwrap().len();
    Json(json!({
        "access_token": format!("access-{}", n),
        "token_type": "Bearer",
        "expires_in": state.token_expires_in.load(Ordering::SeqCst),
        "refresh_token": state.issued_refresh_token.lock().unwrap().clone(),
    }))
    .into_response()
}

/// Records the call, tracks concurrency and answers a queued 429 if any.
async fn enter(state: &StubState, uri: &Uri, headers: &HeaderMap) -> Option<Response> {
    state.api_calls.lock().unwrap().push(ApiCall {
        uri: uri.to_string(),
        bearer: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        started: Instant::now(),
    });

    let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    state.max_in_flight.fetch_max(now, Ordering::SeqCst);
    let delay = state.api_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    state.in_flight.fetch_sub(1, Ordering::SeqCst);

    if let Some(retry_after) = state.throttles.lock().unwrap().pop_front() {
        let mut response = StatusCode::TOO_MANY_REQUESTS.into_response();
        if let Some(value) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, value.parse().unwrap());
        }
        return Some(response);
    }

    let status = StatusCode::from_u16(state.api_status.load(Ordering::SeqCst)).unwrap();
    if status != StatusCode::OK {
        return Some((status, "upstream failure").into_response());
    }
    None
}

async fn playlist_name(
    State(state): State<Arc<StubState>>,
    Path(_id): Path<String>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if let Some(response) = enter(&state, &uri, &headers).await {
        return response;
    }
    Json(json!({ "name": state.playlist_name.lock().unwrap().clone() })).into_response()
}

async fn playlist_tracks(
    State(state): State<Arc<StubState>>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if let Some(response) = enter(&state, &uri, &headers).await {
        return response;
    }

    let offset: usize = query
        .get("offset")
        .and_then(|o| o.parse().ok())
        .unwrap_or(0);
    let index = offset / 100;
    let pages = state.pages.lock().unwrap().clone();
    let items = pages.get(index).cloned();
    let next = if index + 1 < pages.len() {
        Some(format!(
            "{}/v1/playlists/{}/tracks?offset={}&limit=100",
            state.base_url.lock().unwrap(),
            id,
            (index + 1) * 100
        ))
    } else {
        state.last_next.lock().unwrap().clone()
    };

    Json(json!({ "items": items, "next": next })).into_response()
}
