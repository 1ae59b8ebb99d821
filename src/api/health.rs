use axum::{extract::State, response::Json};
use serde_json::{Value, json};

use crate::server::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let retry_after = state.spotify.governor().retry_after_epoch_ms();
    let backoff_until = (retry_after > 0).then_some(retry_after);
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "oauth": state.auth.is_some(),
        "spotifyBackoffUntilMs": backoff_until,
    }))
}
