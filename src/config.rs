//! Configuration management for the Muzikant backend.
//!
//! This module handles loading and accessing configuration values from environment
//! variables and `.env` files. The configuration system follows a hierarchical
//! approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the working directory
//! 3. `.env` file in the local data directory
//! 4. Application defaults (where applicable)

use std::{env, path::PathBuf};

use axum::http::HeaderValue;
use tokio::sync::Semaphore;

pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8080";

/// Errors raised while binding the environment to a [`Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Loads environment variables from a `.env` file.
///
/// The working directory is tried first. When it has no `.env`, the file is
/// looked up in the platform-specific local data directory under
/// `muzikant/.env`:
/// - Linux: `~/.local/share/muzikant/.env`
/// - macOS: `~/Library/Application Support/muzikant/.env`
/// - Windows: `%LOCALAPPDATA%/muzikant/.env`
///
/// Variables already present in the process environment are never
/// overwritten. A missing file is not an error.
///
/// # Errors
///
/// This function will return an error if:
/// - The data directory cannot be created
/// - A `.env` file exists but cannot be parsed
pub async fn load_env() -> Result<(), String> {
    match dotenv::dotenv() {
        Ok(_) => return Ok(()),
        Err(dotenv::Error::Io(_)) => {}
        Err(e) => return Err(e.to_string()),
    }

    let path = env_file_path();
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    match dotenv::from_path(&path) {
        Ok(()) | Err(dotenv::Error::Io(_)) => Ok(()),
        Err(e) => Err(format!("{}: {}", path.display(), e)),
    }
}

fn env_file_path() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("muzikant/.env");
    path
}

/// Runtime configuration bound from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    /// Long-lived refresh token; `None` when unset or blank.
    pub refresh_token: Option<String>,
    /// Callback URL registered with Spotify; required when OAuth is enabled.
    pub redirect_uri: Option<String>,
    pub oauth_enabled: bool,
    pub scope: Option<String>,
    /// Outbound Web API calls allowed in flight at once, always >= 1.
    pub max_concurrent_calls: usize,
    /// Only origin allowed by CORS on `/api/**`.
    pub frontend_origin: HeaderValue,
    pub server_addr: String,
    pub api_url: String,
    pub auth_url: String,
    pub token_url: String,
}

impl Config {
    /// Binds the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Binds configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as unset everywhere.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let client_id = get("SPOTIFY_CLIENT_ID").ok_or(ConfigError::Missing("SPOTIFY_CLIENT_ID"))?;
        let client_secret =
            get("SPOTIFY_CLIENT_SECRET").ok_or(ConfigError::Missing("SPOTIFY_CLIENT_SECRET"))?;

        let oauth_enabled = match get("SPOTIFY_OAUTH_ENABLED") {
            Some(value) => parse_bool("SPOTIFY_OAUTH_ENABLED", &value)?,
            None => false,
        };

        let redirect_uri = get("SPOTIFY_REDIRECT_URI");
        if oauth_enabled && redirect_uri.is_none() {
            return Err(ConfigError::Missing("SPOTIFY_REDIRECT_URI"));
        }

        // Clamped into the range a tokio semaphore can hold.
        let max_concurrent_calls = match get("SPOTIFY_MAX_CONCURRENT_CALLS") {
            Some(value) => value
                .parse::<i64>()
                .map_err(|e| ConfigError::Invalid {
                    key: "SPOTIFY_MAX_CONCURRENT_CALLS",
                    value: value.clone(),
                    reason: e.to_string(),
                })?
                .max(1),
            None => 1,
        };
        let max_concurrent_calls = usize::try_from(max_concurrent_calls)
            .unwrap_or(usize::MAX)
            .min(Semaphore::MAX_PERMITS);

        let origin = get("FRONTEND_ORIGIN").unwrap_or_else(|| DEFAULT_FRONTEND_ORIGIN.to_string());
        let frontend_origin =
            HeaderValue::from_str(&origin).map_err(|e| ConfigError::Invalid {
                key: "FRONTEND_ORIGIN",
                value: origin.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client_id,
            client_secret,
            refresh_token: get("SPOTIFY_REFRESH_TOKEN"),
            redirect_uri,
            oauth_enabled,
            scope: get("SPOTIFY_OAUTH_SCOPE"),
            max_concurrent_calls,
            frontend_origin,
            server_addr: get("SERVER_ADDRESS").unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string()),
            api_url: get("SPOTIFY_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            auth_url: get("SPOTIFY_API_AUTH_URL").unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
            token_url: get("SPOTIFY_API_TOKEN_URL")
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
        })
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}
