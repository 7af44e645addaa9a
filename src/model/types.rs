//! Core type definitions for the application

use std::time::Instant;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A title/artist pair returned by the matching endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Artist")]
    pub artist: String,
}

impl Suggestion {
    #[cfg(test)]
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
        }
    }

    /// Text shown for this suggestion in the field it completes
    pub fn label(&self, use_title: bool) -> String {
        if use_title {
            format!("{} - {}", self.title, self.artist)
        } else {
            format!("{} - {}", self.artist, self.title)
        }
    }
}

/// A generated track. Fields other than title and artist belong to the
/// backend and are sent back untouched when the playlist is created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Artist")]
    pub artist: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
impl Track {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            extra: Map::new(),
        }
    }
}

/// OAuth token bundle, laid out the way the backend serializes it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: String,
    pub expiry: DateTime<FixedOffset>,
}

/// Token as returned by the creation endpoint. Any field may be missing.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RefreshedToken {
    pub access_token: Option<String>,
    pub token_type: Option<String>,
    pub refresh_token: Option<String>,
    pub expiry: Option<DateTime<FixedOffset>>,
}

impl RefreshedToken {
    /// Only a token with all four fields replaces the stored one
    pub fn into_credential(self) -> Option<Credential> {
        Some(Credential {
            access_token: self.access_token?,
            token_type: self.token_type?,
            refresh_token: self.refresh_token?,
            expiry: self.expiry?,
        })
    }
}

/// Spotify profile of the logged-in user
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SpotifyUser {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl SpotifyUser {
    pub fn name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.id)
    }
}

/// Which matching endpoint a query goes to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchKind {
    Song,
    Artist,
}

impl MatchKind {
    pub fn path(self) -> &'static str {
        match self {
            MatchKind::Song => "/api/autocomplete/song",
            MatchKind::Artist => "/api/autocomplete/artist",
        }
    }
}

/// Required form fields
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormField {
    SongName,
    ArtistName,
    ListenerId,
}

impl FormField {
    pub const REQUIRED: [FormField; 3] = [
        FormField::SongName,
        FormField::ArtistName,
        FormField::ListenerId,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::SongName => "song name",
            FormField::ArtistName => "artist name",
            FormField::ListenerId => "Last.fm username",
        }
    }
}

/// Which part of the UI has keyboard focus
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Song,
    Artist,
    Listener,
    Length,
    Draft,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Song => Focus::Artist,
            Focus::Artist => Focus::Listener,
            Focus::Listener => Focus::Length,
            Focus::Length => Focus::Draft,
            Focus::Draft => Focus::Song,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Focus::Song => Focus::Draft,
            Focus::Artist => Focus::Song,
            Focus::Listener => Focus::Artist,
            Focus::Length => Focus::Listener,
            Focus::Draft => Focus::Length,
        }
    }

    /// Matching endpoint that completes this field, if any
    pub fn match_kind(self) -> Option<MatchKind> {
        match self {
            Focus::Song => Some(MatchKind::Song),
            Focus::Artist => Some(MatchKind::Artist),
            _ => None,
        }
    }
}

/// Modal overlays drawn above the main layout
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Overlay {
    Login { url: String },
    TokenPrompt { input: String },
    Help,
}

/// Request lifecycle and user-facing notices
#[derive(Clone, Debug, Default)]
pub struct StatusState {
    pub activity: bool,
    pub message: Option<String>,
    pub error: Option<String>,
    pub error_timestamp: Option<Instant>,
}

impl StatusState {
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.error_timestamp = Some(Instant::now());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
        self.error_timestamp = None;
    }
}

/// UI state for the application
#[derive(Clone, Debug)]
pub struct UiState {
    pub focus: Focus,
    pub suggestion_selected: Option<usize>,
    pub draft_selected: usize,
    pub overlay: Option<Overlay>,
    pub user: Option<SpotifyUser>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            focus: Focus::Song,
            suggestion_selected: None,
            draft_selected: 0,
            overlay: None,
            user: None,
        }
    }
}
