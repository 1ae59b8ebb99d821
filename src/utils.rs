use std::cmp::Ordering;

use base64::{Engine, engine::general_purpose::STANDARD};
use rand::{Rng, distr::Alphanumeric};

use crate::types::{SpotifyArtist, Track};

/// Seconds to back off when a 429 carries no usable `Retry-After`.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

const STATE_LENGTH: usize = 32;

/// Extracts a playlist id from a share URL or returns the input as-is.
///
/// Returns `None` for blank input or when the URL yields an empty id.
pub fn extract_playlist_id(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if !trimmed.contains("spotify.com") {
        return Some(trimmed.to_string());
    }

    let parts: Vec<&str> = trimmed.split('/').collect();
    let id = parts
        .windows(2)
        .find(|pair| pair[0] == "playlist")
        .map(|pair| pair[1].split('?').next().unwrap_or_default())
        .unwrap_or(trimmed);

    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// Parses the year out of a Spotify `release_date` (`YYYY`, `YYYY-MM` or
/// `YYYY-MM-DD`).
pub fn extract_year(release_date: Option<&str>) -> Option<i32> {
    let date = release_date?;
    let prefix = date.get(0..4)?;
    prefix.parse::<i32>().ok()
}

/// Joins the non-blank artist names with `", "`.
pub fn join_artist_names(artists: Option<&[Option<SpotifyArtist>]>) -> String {
    artists
        .unwrap_or_default()
        .iter()
        .flatten()
        .filter_map(|artist| artist.name.as_deref())
        .filter(|name| !name.trim().is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Stable sort by year ascending, tracks without a year last.
pub fn sort_tracks_by_year(tracks: &mut [Track]) {
    tracks.sort_by(|a, b| match (a.year, b.year) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Generates an unpredictable CSRF `state` value.
pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LENGTH)
        .map(char::from)
        .collect()
}

/// Compares two strings without short-circuiting on the first mismatch.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Value of an `Authorization` header carrying HTTP Basic credentials.
pub fn basic_auth_header(client_id: &str, client_secret: &str) -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!("{}:{}", client_id, client_secret))
    )
}

/// Reads `Retry-After` as integer seconds, defaulting on absence or garbage.
pub fn parse_retry_after(value: Option<&str>) -> u64 {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}
