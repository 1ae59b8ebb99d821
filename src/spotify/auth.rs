use reqwest::{Client, header::AUTHORIZATION};

use crate::{
    spotify::SpotifyError,
    types::{ClientCredentials, SpotifyTokenResponse, TokenGrant},
    utils,
};

/// Exchanges a refresh token for a new access token.
///
/// Posts `grant_type=refresh_token` to the Accounts token endpoint with the
/// client credentials as HTTP Basic auth. Spotify may rotate the refresh
/// token; when it does, the new one is carried in the returned grant.
///
/// # Errors
///
/// Any transport failure, non-2xx status or a body without an access token
/// yields [`SpotifyError::TokenRefreshFailed`].
pub async fn refresh_access_token(
    http: &Client,
    token_url: &str,
    credentials: &ClientCredentials,
    refresh_token: &str,
) -> Result<TokenGrant, SpotifyError> {
    request_token(
        http,
        token_url,
        credentials,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ],
    )
    .await
    .map_err(SpotifyError::TokenRefreshFailed)
}

/// Exchanges an authorization code for access and refresh tokens.
///
/// The `redirect_uri` must be the exact value used to build the login URL.
///
/// # Errors
///
/// Any transport failure, non-2xx status or a body without an access token
/// yields [`SpotifyError::AuthExchangeFailed`].
pub async fn exchange_code(
    http: &Client,
    token_url: &str,
    credentials: &ClientCredentials,
    code: &str,
    redirect_uri: &str,
) -> Result<TokenGrant, SpotifyError> {
    request_token(
        http,
        token_url,
        credentials,
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ],
    )
    .await
    .map_err(SpotifyError::AuthExchangeFailed)
}

async fn request_token(
    http: &Client,
    token_url: &str,
    credentials: &ClientCredentials,
    form: &[(&str, &str)],
) -> Result<TokenGrant, String> {
    let res = http
        .post(token_url)
        .header(
            AUTHORIZATION,
            utils::basic_auth_header(&credentials.client_id, &credentials.client_secret),
        )
        .form(form)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(format!("Accounts returned {}: {}", status, body));
    }

    let json: SpotifyTokenResponse = res.json().await.map_err(|e| e.to_string())?;
    json.into_grant()
        .ok_or_else(|| "response did not contain an access token".to_string())
}
