//! Spotify login helpers
//!
//! The backend runs the OAuth dance. We fetch the authorize URL it prepared,
//! the user opens it in a browser, and the backend's callback redirects to
//! `/auth?token=<json>`. That token (or the whole redirect URL) is pasted back
//! into the app.

use anyhow::{anyhow, Result};
use reqwest::Url;

use crate::model::{ApiError, Credential};

const AUTHORIZE_HOST: &str = "accounts.spotify.com";
const AUTHORIZE_PATH: &str = "/authorize";

/// Accept only an https URL on Spotify's authorize endpoint
pub fn validate_login_url(raw: &str) -> Result<String, ApiError> {
    let unexpected = || ApiError::UnexpectedLoginUrl(raw.to_string());
    let url = Url::parse(raw).map_err(|_| unexpected())?;

    if url.scheme() == "https"
        && url.host_str() == Some(AUTHORIZE_HOST)
        && url.path().starts_with(AUTHORIZE_PATH)
    {
        Ok(url.into())
    } else {
        Err(unexpected())
    }
}

/// Read a credential from either the token JSON or the redirect URL carrying it
pub fn parse_credential(input: &str) -> Result<Credential> {
    let input = input.trim();
    if input.is_empty() {
        return Err(anyhow!("Nothing was pasted"));
    }

    let json = if input.starts_with('{') {
        input.to_string()
    } else {
        let url = Url::parse(input).map_err(|e| anyhow!("Not a token or login redirect URL: {}", e))?;
        // The token JSON arrives unencoded; a '+' in the expiry offset is literal
        let raw = url
            .query()
            .and_then(|query| query.split('&').find_map(|pair| pair.strip_prefix("token=")))
            .ok_or_else(|| anyhow!("The URL has no token parameter"))?;
        let decoded = urlencoding::decode(raw)
            .map_err(|e| anyhow!("Token is not valid UTF-8: {}", e))?
            .into_owned();
        decoded
    };

    let credential: Credential =
        serde_json::from_str(&json).map_err(|e| anyhow!("Token is not valid: {}", e))?;
    if credential.access_token.is_empty() {
        return Err(anyhow!("Token has no access token"));
    }
    Ok(credential)
}
