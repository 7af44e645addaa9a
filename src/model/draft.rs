//! The generated, not yet created, playlist

use thiserror::Error;

use super::types::Track;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("Track index {index} is out of range for a playlist of {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlaylistDraft {
    tracks: Vec<Track>,
}

impl PlaylistDraft {
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn replace(&mut self, tracks: Vec<Track>) {
        self.tracks = tracks;
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    fn check(&self, index: usize) -> Result<(), DraftError> {
        if index < self.tracks.len() {
            Ok(())
        } else {
            Err(DraftError::IndexOutOfRange {
                index,
                len: self.tracks.len(),
            })
        }
    }

    pub fn delete(&mut self, index: usize) -> Result<Track, DraftError> {
        self.check(index)?;
        Ok(self.tracks.remove(index))
    }

    /// Take the track at `from` out and put it back at `to`
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<(), DraftError> {
        self.check(from)?;
        self.check(to)?;
        let track = self.tracks.remove(from);
        self.tracks.insert(to, track);
        Ok(())
    }
}
