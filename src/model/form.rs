//! Playlist request form

use std::collections::HashSet;

use super::types::{FormField, Suggestion};

pub const DEFAULT_LENGTH: &str = "20";

/// Values entered by the user plus the current completion list
#[derive(Clone, Debug)]
pub struct FormState {
    pub song_name: String,
    pub artist_name: String,
    pub listener_id: String,
    pub requested_length: String,
    pub suggestions: Vec<Suggestion>,
    pub invalid: HashSet<FormField>,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            song_name: String::new(),
            artist_name: String::new(),
            listener_id: String::new(),
            requested_length: DEFAULT_LENGTH.to_string(),
            suggestions: Vec::new(),
            invalid: HashSet::new(),
        }
    }
}

impl FormState {
    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::SongName => &self.song_name,
            FormField::ArtistName => &self.artist_name,
            FormField::ListenerId => &self.listener_id,
        }
    }

    pub fn is_invalid(&self, field: FormField) -> bool {
        self.invalid.contains(&field)
    }

    /// "song" for a length of exactly one, "songs" otherwise
    pub fn song_label(&self) -> &'static str {
        match self.requested_length.trim().parse::<i64>() {
            Ok(1) => "song",
            _ => "songs",
        }
    }

    /// Fill song and artist from the first suggestion whose label equals
    /// `entered`. Returns whether a suggestion matched.
    pub fn reconcile(&mut self, use_title: bool, entered: &str) -> bool {
        let matched = self
            .suggestions
            .iter()
            .find(|s| s.label(use_title) == entered)
            .cloned();

        match matched {
            Some(suggestion) => {
                self.song_name = suggestion.title;
                self.artist_name = suggestion.artist;
                true
            }
            None => false,
        }
    }

    /// Reconcile text typed or pasted into the song or artist field that
    /// spells out a suggestion label
    pub fn reconcile_entered(&mut self) -> bool {
        let song = self.song_name.clone();
        if self.reconcile(true, &song) {
            return true;
        }
        let artist = self.artist_name.clone();
        self.reconcile(false, &artist)
    }
}
