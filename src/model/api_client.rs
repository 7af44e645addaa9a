//! Playlist backend API client

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{Credential, MatchKind, RefreshedToken, SpotifyUser, Suggestion, Track};

const LOGIN_URL_PATH: &str = "/api/spotifyLoginUrl/";
const GENERATE_PATH: &str = "/api/getPlaylist";
const CREATE_PATH: &str = "/api/createPlaylist";
const USER_PATH: &str = "/api/getSpotifyUser";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Server returned {status}: {body}")]
    Remote {
        status: u16,
        /// The `error` field of a JSON failure body
        error: Option<String>,
        body: String,
    },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Login URL missing from response")]
    MissingLoginUrl,

    #[error("Login URL does not point at Spotify: {0}")]
    UnexpectedLoginUrl(String),
}

impl ApiError {
    /// The structured error the server sent, if any
    pub fn structured_error(&self) -> Option<&str> {
        match self {
            ApiError::Remote { error, .. } => error.as_deref(),
            _ => None,
        }
    }

    /// The structured error, else the raw failure body, else nothing
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            ApiError::Remote { error: Some(error), .. } => Some(error.as_str()),
            ApiError::Remote { body, .. } => Some(body.trim()).filter(|b| !b.is_empty()),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    // The backend writes `Error`; other deployments use `error`
    #[serde(default, alias = "Error")]
    error: Option<String>,
}

/// Non-blank `error` field of a JSON failure body
pub fn error_field(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|e| !e.trim().is_empty())
}

#[derive(Clone, Debug, Serialize)]
pub struct GenerationRequest {
    pub length: String,
    pub title: String,
    pub artist: String,
    pub token: Credential,
    #[serde(rename = "lastFmUsername")]
    pub last_fm_username: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationRequest {
    pub token: Credential,
    pub playlist_name: String,
    pub songs: Vec<Track>,
}

#[derive(Clone, Debug, Serialize)]
pub struct MatchRequest {
    pub s: String,
    #[serde(rename = "userID")]
    pub user_id: String,
}

#[derive(Deserialize)]
struct MatchResponse {
    #[serde(default)]
    matches: Option<Vec<Suggestion>>,
}

#[derive(Deserialize)]
struct CreationResponse {
    #[serde(default)]
    token: Option<RefreshedToken>,
}

#[derive(Deserialize)]
struct LoginUrlResponse {
    #[serde(rename = "URL", default)]
    url: Option<String>,
}

/// Endpoints of the playlist backend
#[async_trait]
pub trait PlaylistApi: Send + Sync {
    async fn login_url(&self) -> Result<String, ApiError>;

    async fn generate_playlist(&self, request: &GenerationRequest) -> Result<Vec<Track>, ApiError>;

    /// Returns the refreshed token when the server sent one back
    async fn create_playlist(&self, request: &CreationRequest) -> Result<Option<RefreshedToken>, ApiError>;

    async fn match_suggestions(&self, kind: MatchKind, request: &MatchRequest) -> Result<Vec<Suggestion>, ApiError>;

    async fn current_user(&self, credential: &Credential) -> Result<SpotifyUser, ApiError>;
}

/// `PlaylistApi` over HTTP
#[derive(Clone)]
pub struct HttpPlaylistApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPlaylistApi {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and hand back the body of a 2xx response
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(ApiError::Remote {
                status: status.as_u16(),
                error: error_field(&body),
                body,
            })
        }
    }

    async fn post<B: Serialize + Sync, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R, ApiError> {
        let body = self.send(self.client.post(self.url(path)).json(body)).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn fetch_login_url(&self) -> Result<String, ApiError> {
        let body = self.send(self.client.get(self.url(LOGIN_URL_PATH))).await?;
        let response: LoginUrlResponse = serde_json::from_str(&body)?;
        response.url.ok_or(ApiError::MissingLoginUrl)
    }

    /// The creation endpoint may answer with an empty body or a refreshed token
    async fn post_playlist(&self, request: &CreationRequest) -> Result<Option<RefreshedToken>, ApiError> {
        let body = self.send(self.client.post(self.url(CREATE_PATH)).json(request)).await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        match serde_json::from_str::<CreationResponse>(&body) {
            Ok(response) => Ok(response.token),
            Err(e) => {
                tracing::debug!(error = %e, "Creation response carried no token");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl PlaylistApi for HttpPlaylistApi {
    async fn login_url(&self) -> Result<String, ApiError> {
        crate::log_api_request!("login_url", path = LOGIN_URL_PATH);
        let result = self.fetch_login_url().await;
        crate::log_api_result!("login_url", result);
        result
    }

    async fn generate_playlist(&self, request: &GenerationRequest) -> Result<Vec<Track>, ApiError> {
        crate::log_api_request!(
            "generate_playlist",
            length = %request.length,
            user = %request.last_fm_username
        );
        let result: Result<Vec<Track>, ApiError> = self.post(GENERATE_PATH, request).await;
        crate::log_api_result!("generate_playlist", result);
        result
    }

    async fn create_playlist(&self, request: &CreationRequest) -> Result<Option<RefreshedToken>, ApiError> {
        crate::log_api_request!("create_playlist", songs = request.songs.len());
        let result = self.post_playlist(request).await;
        crate::log_api_result!("create_playlist", result);
        result
    }

    async fn match_suggestions(&self, kind: MatchKind, request: &MatchRequest) -> Result<Vec<Suggestion>, ApiError> {
        crate::log_api_request!("match_suggestions", kind = ?kind, query = %request.s);
        let result: Result<MatchResponse, ApiError> = self.post(kind.path(), request).await;
        crate::log_api_result!("match_suggestions", result);
        Ok(result?.matches.unwrap_or_default())
    }

    async fn current_user(&self, credential: &Credential) -> Result<SpotifyUser, ApiError> {
        crate::log_api_request!("current_user", path = USER_PATH);
        let result: Result<SpotifyUser, ApiError> = self.post(USER_PATH, credential).await;
        crate::log_api_result!("current_user", result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn remote(body: &str) -> ApiError {
        ApiError::Remote {
            status: 500,
            error: error_field(body),
            body: body.to_string(),
        }
    }

    #[test]
    fn error_field_accepts_both_spellings() {
        assert_eq!(error_field(r#"{"error":"X"}"#).as_deref(), Some("X"));
        assert_eq!(
            error_field(r#"{"Error":"Your profile couldn't be retrieved."}"#).as_deref(),
            Some("Your profile couldn't be retrieved.")
        );
        assert_eq!(error_field(r#"{"error":""}"#), None);
        assert_eq!(error_field("plain text"), None);
    }

    #[test]
    fn remote_message_prefers_error_field() {
        assert_eq!(remote(r#"{"error":"X"}"#).remote_message(), Some("X"));
        assert_eq!(remote(r#"{"error":"X"}"#).structured_error(), Some("X"));
    }

    #[test]
    fn remote_message_falls_back_to_body() {
        let err = remote("An error occurred. Please try again later.\n");
        assert_eq!(err.remote_message(), Some("An error occurred. Please try again later."));
        assert_eq!(err.structured_error(), None);

        assert_eq!(remote("").remote_message(), None);
        assert_eq!(remote("  \n").remote_message(), None);
    }

    #[test]
    fn only_remote_errors_carry_a_message() {
        assert_eq!(ApiError::MissingLoginUrl.remote_message(), None);
        assert_eq!(ApiError::UnexpectedLoginUrl("x".into()).structured_error(), None);
    }

    #[test]
    fn requests_use_backend_field_names() {
        let token = Credential {
            access_token: "a".into(),
            token_type: "Bearer".into(),
            refresh_token: "r".into(),
            expiry: DateTime::parse_from_rfc3339("2030-01-01T00:00:00Z").unwrap(),
        };
        let generation = serde_json::to_value(GenerationRequest {
            length: "20".into(),
            title: "A".into(),
            artist: "B".into(),
            token: token.clone(),
            last_fm_username: "snyderks".into(),
        })
        .unwrap();
        assert_eq!(generation["lastFmUsername"], "snyderks");
        assert_eq!(generation["token"]["access_token"], "a");

        let creation = serde_json::to_value(CreationRequest {
            token,
            playlist_name: "Generated by Spotkov".into(),
            songs: vec![Track::new("A", "B")],
        })
        .unwrap();
        assert_eq!(creation["playlistName"], "Generated by Spotkov");
        assert_eq!(creation["songs"][0]["Title"], "A");

        let query = serde_json::to_value(MatchRequest { s: "he".into(), user_id: "snyderks".into() }).unwrap();
        assert_eq!(query["userID"], "snyderks");
    }

    #[test]
    fn null_matches_decode_as_empty() {
        let response: MatchResponse = serde_json::from_str(r#"{"num":0,"matches":null}"#).unwrap();
        assert!(response.matches.unwrap_or_default().is_empty());
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let api = HttpPlaylistApi::new("http://localhost:8080/").unwrap();
        assert_eq!(api.url(GENERATE_PATH), "http://localhost:8080/api/getPlaylist");
    }
}
