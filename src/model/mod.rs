//! Model module - Application state and data types
//!
//! This module contains all the data structures and state management for the application.
//! It is organized into submodules by responsibility:
//!
//! - `types`: Core type definitions (tracks, tokens, focus, UI state, etc.)
//! - `storage`: Persistent key/value store and the token wrapper around it
//! - `form`: Request form values and suggestion reconciliation
//! - `draft`: The generated playlist being edited
//! - `api_client`: Playlist backend API client
//! - `notice`: Delayed status notices
//! - `app_model`: Main application model with state management methods

mod types;
mod storage;
mod form;
mod draft;
mod api_client;
mod notice;
mod app_model;

// Re-export the types used outside the model
pub use types::{Credential, Focus, FormField, MatchKind, Overlay, StatusState, UiState};

#[cfg(test)]
pub use types::{Suggestion, Track};

pub use storage::FileStore;

pub use form::FormState;

pub use draft::PlaylistDraft;

pub use api_client::{ApiError, HttpPlaylistApi};

pub use app_model::AppModel;
