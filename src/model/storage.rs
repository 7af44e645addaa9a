//! Persistent key/value storage for form values and the login token

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use chrono::DateTime;

use super::types::Credential;

/// Keys under which values are persisted
pub mod keys {
    pub const ACCESS_TOKEN: &str = "access_token";
    pub const EXPIRY: &str = "expiry";
    pub const REFRESH_TOKEN: &str = "refresh_token";
    pub const TOKEN_TYPE: &str = "token_type";
    pub const SONG_NAME: &str = "songName";
    pub const ARTIST_NAME: &str = "artistName";
    pub const LISTENER_ID: &str = "lastFMID";
    pub const LENGTH: &str = "length";
}

/// String key/value store with get/set/remove
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;

    /// Write several entries together. Either all are stored or none are.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()>;
}

fn lock(map: &Mutex<HashMap<String, String>>) -> MutexGuard<'_, HashMap<String, String>> {
    // A panic while holding the lock can't leave the map half-written
    map.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory store, used in tests
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_many(&[(key, value)])
    }

    fn remove(&self, key: &str) -> Result<()> {
        lock(&self.values).remove(key);
        Ok(())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut values = lock(&self.values);
        for (key, value) in entries {
            values.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }
}

/// Store backed by a single JSON object on disk, rewritten on every change
pub struct FileStore {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let content = fs::read_to_string(&path)?;
            match serde_json::from_str(&content) {
                Ok(values) => values,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Storage file unreadable, starting empty");
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        tracing::debug!(path = %path.display(), entries = values.len(), "Storage opened");
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    fn save(&self, values: &HashMap<String, String>) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        let content = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_many(&[(key, value)])
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = lock(&self.values);
        if !values.contains_key(key) {
            return Ok(());
        }
        let mut updated = values.clone();
        updated.remove(key);
        self.save(&updated)?;
        *values = updated;
        Ok(())
    }

    /// The map only changes once the file has been written
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut values = lock(&self.values);
        let mut updated = values.clone();
        for (key, value) in entries {
            updated.insert(key.to_string(), value.to_string());
        }
        self.save(&updated)?;
        *values = updated;
        Ok(())
    }
}

/// Reads and writes the credential as four separate keys
#[derive(Clone)]
pub struct TokenStore {
    store: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The stored credential, if all four parts are present and valid
    pub fn load(&self) -> Option<Credential> {
        let access_token = self.store.get(keys::ACCESS_TOKEN)?;
        let token_type = self.store.get(keys::TOKEN_TYPE)?;
        let refresh_token = self.store.get(keys::REFRESH_TOKEN)?;
        let expiry = self.store.get(keys::EXPIRY)?;

        let expiry = match DateTime::parse_from_rfc3339(&expiry) {
            Ok(expiry) => expiry,
            Err(e) => {
                tracing::warn!(error = %e, "Stored token expiry is not a timestamp");
                return None;
            }
        };

        Some(Credential {
            access_token,
            token_type,
            refresh_token,
            expiry,
        })
    }

    pub fn save(&self, credential: &Credential) -> Result<()> {
        let expiry = credential.expiry.to_rfc3339();
        self.store.set_many(&[
            (keys::ACCESS_TOKEN, credential.access_token.as_str()),
            (keys::EXPIRY, expiry.as_str()),
            (keys::REFRESH_TOKEN, credential.refresh_token.as_str()),
            (keys::TOKEN_TYPE, credential.token_type.as_str()),
        ])
    }

    pub fn clear(&self) -> Result<()> {
        for key in [keys::ACCESS_TOKEN, keys::EXPIRY, keys::REFRESH_TOKEN, keys::TOKEN_TYPE] {
            self.store.remove(key)?;
        }
        Ok(())
    }
}
