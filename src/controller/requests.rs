//! Backend requests spawned from key handling so the UI keeps drawing

use crate::model::{MatchKind, Overlay};
use super::AppController;

impl AppController {
    pub fn spawn_generation(&self) {
        let model = self.model.clone();
        tokio::spawn(async move {
            model.request_playlist_generation().await;
        });
    }

    pub fn spawn_creation(&self) {
        let model = self.model.clone();
        tokio::spawn(async move {
            model.request_playlist_creation().await;
        });
    }

    pub fn spawn_match_query(&self, kind: MatchKind, query: String) {
        let model = self.model.clone();
        tokio::spawn(async move {
            model.query_matches(kind, &query).await;
        });
    }

    /// Fetch the authorize URL and show it for the user to open
    pub fn spawn_login(&self) {
        let model = self.model.clone();
        tokio::spawn(async move {
            if let Some(url) = model.request_login_url().await {
                tracing::info!("Showing Spotify login URL");
                model.show_overlay(Overlay::Login { url }).await;
            }
        });
    }

    pub fn spawn_user_fetch(&self) {
        let model = self.model.clone();
        tokio::spawn(async move {
            model.fetch_current_user().await;
        });
    }

    /// Store the pasted token and load the profile it belongs to
    pub async fn submit_token(&self, input: String) {
        if self.model.import_credential(&input).await {
            self.model.hide_overlay().await;
            self.spawn_user_fetch();
        }
    }
}
