//! Runtime configuration read from the environment (and `.env`)

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:8080";
const DEFAULT_STORAGE: &str = ".cache/local_storage.json";
const DEFAULT_LOG_DIR: &str = ".logs";
const DEFAULT_SLOW_NOTICE_MS: u64 = 5500;
pub const DEFAULT_PLAYLIST_NAME: &str = "Generated by Spotkov";

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    /// Base URL of the playlist backend
    pub api_url: String,
    /// JSON file holding persisted form values and the token
    pub storage_path: PathBuf,
    pub log_dir: PathBuf,
    /// How long a generation request may run before the slow notice shows
    pub slow_notice_delay: Duration,
    pub playlist_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            storage_path: PathBuf::from(DEFAULT_STORAGE),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            slow_notice_delay: Duration::from_millis(DEFAULT_SLOW_NOTICE_MS),
            playlist_name: DEFAULT_PLAYLIST_NAME.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let slow_notice_delay = match get("SPOTKOV_SLOW_NOTICE_MS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(ms) => Duration::from_millis(ms),
                Err(e) => {
                    tracing::warn!(value = %raw, error = %e, "Invalid SPOTKOV_SLOW_NOTICE_MS, using default");
                    defaults.slow_notice_delay
                }
            },
            None => defaults.slow_notice_delay,
        };

        Self {
            api_url: get("SPOTKOV_API_URL").unwrap_or(defaults.api_url),
            storage_path: get("SPOTKOV_STORAGE").map(PathBuf::from).unwrap_or(defaults.storage_path),
            log_dir: get("SPOTKOV_LOG_DIR").map(PathBuf::from).unwrap_or(defaults.log_dir),
            slow_notice_delay,
            playlist_name: get("SPOTKOV_PLAYLIST_NAME").unwrap_or(defaults.playlist_name),
        }
    }
}
