use std::collections::HashSet;

use reqwest::Url;

use crate::{
    spotify::{ApiClient, SpotifyError},
    types::{
        PlaylistNameResponse, PlaylistResponse, PlaylistTrackItem, PlaylistTracksPage, Track,
    },
    utils,
};

/// Page size requested from Spotify, the maximum it allows.
const PAGE_LIMIT: u32 = 100;

const TRACK_FIELDS: &str = "items(track(id,name,artists(name),album(name,release_date),external_urls(spotify))),next";

/// Retrieves a playlist's name and every track, ordered by release year.
///
/// Pages are fetched strictly one after another by following Spotify's
/// `next` URL verbatim. Local files and items without a track id are
/// skipped; a track id seen twice is kept only at its first position.
/// Tracks are then stable-sorted by year with unknown years last.
///
/// # Errors
///
/// Any error of [`ApiClient::get`] is propagated untouched.
pub async fn fetch_playlist(
    client: &ApiClient,
    playlist_id: &str,
) -> Result<PlaylistResponse, SpotifyError> {
    let name = fetch_playlist_name(client, playlist_id).await?;

    let mut tracks: Vec<Track> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    let mut next_url = Some(first_page_url(client.api_url(), playlist_id)?);
    while let Some(url) = next_url.take() {
        let page: PlaylistTracksPage = client.get(&url).await?;
        let Some(items) = page.items else {
            break;
        };
        add_tracks(&mut tracks, &mut seen, items.into_iter().flatten());
        next_url = page.next.filter(|n| !n.trim().is_empty());
    }

    utils::sort_tracks_by_year(&mut tracks);
    Ok(PlaylistResponse { name, tracks })
}

async fn fetch_playlist_name(
    client: &ApiClient,
    playlist_id: &str,
) -> Result<Option<String>, SpotifyError> {
    let mut url = playlist_url(client.api_url(), playlist_id, &[])?;
    url.query_pairs_mut().append_pair("fields", "name");
    let response: PlaylistNameResponse = client.get(url.as_str()).await?;
    Ok(response.name)
}

fn first_page_url(api_url: &str, playlist_id: &str) -> Result<String, SpotifyError> {
    let mut url = playlist_url(api_url, playlist_id, &["tracks"])?;
    url.query_pairs_mut()
        .append_pair("limit", &PAGE_LIMIT.to_string())
        .append_pair("offset", "0")
        .append_pair("fields", TRACK_FIELDS);
    Ok(url.into())
}

fn playlist_url(api_url: &str, playlist_id: &str, suffix: &[&str]) -> Result<Url, SpotifyError> {
    let mut url = Url::parse(api_url)
        .map_err(|e| SpotifyError::NotConfigured(format!("invalid Spotify API URL: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| SpotifyError::NotConfigured("Spotify API URL cannot be a base".to_string()))?
        .pop_if_empty()
        .push("playlists")
        .push(playlist_id)
        .extend(suffix);
    Ok(url)
}

/// Projects `items` onto `results`, skipping local and id-less entries and
/// any id already in `seen`.
fn add_tracks<I>(results: &mut Vec<Track>, seen: &mut HashSet<String>, items: I)
where
    I: IntoIterator<Item = PlaylistTrackItem>,
{
    for item in items {
        if item.is_local {
            continue;
        }
        let Some(track) = item.track else {
            continue;
        };
        let id = match track.id.as_deref() {
            Some(id) if !id.trim().is_empty() => id.to_string(),
            _ => continue,
        };
        if !seen.insert(id.clone()) {
            continue;
        }

        let release_date = track.album.as_ref().and_then(|a| a.release_date.as_deref());
        results.push(Track {
            artist: utils::join_artist_names(track.artists.as_deref()),
            album: track.album.as_ref().and_then(|a| a.name.clone()),
            year: utils::extract_year(release_date),
            spotify_url: track.external_urls.and_then(|u| u.spotify),
            title: track.name.unwrap_or_default(),
            id,
        });
    }
}
