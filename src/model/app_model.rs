//! Playlist builder view-model with state management

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::auth;
use crate::config::AppConfig;

use super::api_client::{CreationRequest, GenerationRequest, MatchRequest, PlaylistApi};
use super::draft::{DraftError, PlaylistDraft};
use super::form::FormState;
use super::notice::DelayedNotice;
use super::storage::{keys, KeyValueStore, TokenStore};
use super::types::{Focus, FormField, MatchKind, Overlay, StatusState, Track, UiState};

pub const NOT_LOGGED_IN: &str = "You need to log in to Spotify first (Ctrl-L).";
pub const SLOW_GENERATION_NOTICE: &str =
    "The first playlist for a Last.fm user may take a while. Hang tight!";
pub const GENERATION_FALLBACK: &str = "Couldn't generate the playlist. Please try again.";
pub const CREATION_FALLBACK: &str = "Couldn't save the playlist to Spotify. Please try again.";
pub const CREATION_SUCCESS: &str = "Playlist created! Check your Spotify account.";
pub const EMPTY_DRAFT: &str = "Generate a playlist before saving it.";

const ERROR_DISPLAY_SECS: u64 = 5;

fn storage_key(field: FormField) -> &'static str {
    match field {
        FormField::SongName => keys::SONG_NAME,
        FormField::ArtistName => keys::ARTIST_NAME,
        FormField::ListenerId => keys::LISTENER_ID,
    }
}

/// State behind the playlist builder screen. Cloning shares the state.
#[derive(Clone)]
pub struct AppModel {
    store: Arc<dyn KeyValueStore>,
    tokens: TokenStore,
    api: Arc<dyn PlaylistApi>,
    slow_notice_delay: Duration,
    playlist_name: String,
    form: Arc<Mutex<FormState>>,
    draft: Arc<Mutex<PlaylistDraft>>,
    status: Arc<Mutex<StatusState>>,
    pub ui_state: Arc<Mutex<UiState>>,
    /// Sequence number of the newest match query
    match_seq: Arc<AtomicU64>,
    should_quit: Arc<Mutex<bool>>,
}

impl AppModel {
    pub fn new(store: Arc<dyn KeyValueStore>, api: Arc<dyn PlaylistApi>, config: &AppConfig) -> Self {
        Self {
            tokens: TokenStore::new(store.clone()),
            store,
            api,
            slow_notice_delay: config.slow_notice_delay,
            playlist_name: config.playlist_name.clone(),
            form: Arc::new(Mutex::new(FormState::default())),
            draft: Arc::new(Mutex::new(PlaylistDraft::default())),
            status: Arc::new(Mutex::new(StatusState::default())),
            ui_state: Arc::new(Mutex::new(UiState::default())),
            match_seq: Arc::new(AtomicU64::new(0)),
            should_quit: Arc::new(Mutex::new(false)),
        }
    }

    fn persist(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            tracing::warn!(key, error = %e, "Failed to persist value");
        }
    }

    /// Fill the form from values saved by earlier sessions
    pub async fn load_persisted(&self) {
        let mut form = self.form.lock().await;
        if let Some(song) = self.store.get(keys::SONG_NAME) {
            form.song_name = song;
        }
        if let Some(artist) = self.store.get(keys::ARTIST_NAME) {
            form.artist_name = artist;
        }
        if let Some(listener) = self.store.get(keys::LISTENER_ID) {
            form.listener_id = listener;
        }
        if let Some(length) = self.store.get(keys::LENGTH).filter(|l| !l.is_empty()) {
            form.requested_length = length;
        }
        tracing::debug!(logged_in = self.logged_in(), "Restored persisted form state");
    }

    // ========================================================================
    // Form validation & generation
    // ========================================================================

    /// Check the required fields, marking empty ones invalid and saving the
    /// rest. True when all are filled in.
    pub async fn validate_and_persist_form(&self) -> bool {
        let mut form = self.form.lock().await;
        let mut missing = Vec::new();

        for field in FormField::REQUIRED {
            let value = form.value(field).to_string();
            if value.trim().is_empty() {
                form.invalid.insert(field);
                missing.push(field.label());
            } else {
                form.invalid.remove(&field);
                self.persist(storage_key(field), &value);
            }
        }

        let length = form.requested_length.trim().to_string();
        drop(form);
        if !length.is_empty() {
            self.persist(keys::LENGTH, &length);
        }

        if missing.is_empty() {
            true
        } else {
            tracing::debug!(?missing, "Form validation failed");
            self.set_error(format!("Please enter a {}.", missing.join(", "))).await;
            false
        }
    }

    /// Mark the status busy unless another request already is
    async fn begin_request(&self) -> bool {
        let mut status = self.status.lock().await;
        if status.activity {
            tracing::debug!("A request is already running, ignoring");
            return false;
        }
        status.activity = true;
        status.message = None;
        status.clear_error();
        true
    }

    pub async fn request_playlist_generation(&self) {
        if self.form.lock().await.reconcile_entered() {
            tracing::debug!("Entered text matched a suggestion");
        }
        if !self.validate_and_persist_form().await {
            return;
        }
        let Some(token) = self.tokens.load() else {
            self.set_error(NOT_LOGGED_IN).await;
            return;
        };

        let request = {
            let form = self.form.lock().await;
            GenerationRequest {
                length: form.requested_length.trim().to_string(),
                title: form.song_name.clone(),
                artist: form.artist_name.clone(),
                token,
                last_fm_username: form.listener_id.clone(),
            }
        };

        if !self.begin_request().await {
            return;
        }
        self.draft.lock().await.clear();

        tracing::info!(song = %request.title, artist = %request.artist, length = %request.length, "Generating playlist");
        let notice = DelayedNotice::schedule(self.status.clone(), self.slow_notice_delay, SLOW_GENERATION_NOTICE);
        let result = self.api.generate_playlist(&request).await;
        notice.cancel();

        let error = match result {
            Ok(tracks) => {
                tracing::info!(count = tracks.len(), "Playlist generated");
                self.draft.lock().await.replace(tracks);
                let mut ui_state = self.ui_state.lock().await;
                ui_state.draft_selected = 0;
                ui_state.focus = Focus::Draft;
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "Playlist generation failed");
                Some(e.remote_message().unwrap_or(GENERATION_FALLBACK).to_string())
            }
        };

        let mut status = self.status.lock().await;
        status.activity = false;
        status.message = None;
        if let Some(error) = error {
            status.set_error(error);
        }
    }

    // ========================================================================
    // Draft editing & creation
    // ========================================================================

    pub async fn delete_track(&self, index: usize) -> Result<Track, DraftError> {
        let mut draft = self.draft.lock().await;
        let removed = draft.delete(index)?;
        let remaining = draft.len();
        drop(draft);

        let mut ui_state = self.ui_state.lock().await;
        ui_state.draft_selected = ui_state.draft_selected.min(remaining.saturating_sub(1));
        tracing::debug!(index, title = %removed.title, "Track removed from draft");
        Ok(removed)
    }

    pub async fn reorder_track(&self, from: usize, to: usize) -> Result<(), DraftError> {
        self.draft.lock().await.reorder(from, to)?;
        self.ui_state.lock().await.draft_selected = to;
        Ok(())
    }

    pub async fn request_playlist_creation(&self) {
        let Some(token) = self.tokens.load() else {
            self.set_error(NOT_LOGGED_IN).await;
            return;
        };
        let songs = self.draft.lock().await.tracks().to_vec();
        if songs.is_empty() {
            self.set_error(EMPTY_DRAFT).await;
            return;
        }
        if !self.begin_request().await {
            return;
        }

        let request = CreationRequest {
            token,
            playlist_name: self.playlist_name.clone(),
            songs,
        };
        tracing::info!(name = %request.playlist_name, songs = request.songs.len(), "Creating playlist");
        let result = self.api.create_playlist(&request).await;

        let mut status = self.status.lock().await;
        status.activity = false;
        match result {
            Ok(refreshed) => {
                match refreshed.and_then(|token| token.into_credential()) {
                    Some(credential) => {
                        if let Err(e) = self.tokens.save(&credential) {
                            tracing::warn!(error = %e, "Failed to store refreshed token");
                        } else {
                            tracing::debug!("Stored refreshed token");
                        }
                    }
                    None => tracing::debug!("No complete refreshed token in response"),
                }
                status.message = Some(CREATION_SUCCESS.to_string());
                status.clear_error();
                drop(status);
                self.draft.lock().await.clear();
                self.ui_state.lock().await.draft_selected = 0;
            }
            Err(e) => {
                tracing::error!(error = %e, "Playlist creation failed");
                status.set_error(e.structured_error().unwrap_or(CREATION_FALLBACK));
            }
        }
    }

    // ========================================================================
    // Suggestions
    // ========================================================================

    /// Ask the backend for completions of `query`. Only the newest query's
    /// answer is applied.
    pub async fn query_matches(&self, kind: MatchKind, query: &str) {
        let listener_id = self.form.lock().await.listener_id.trim().to_string();
        if listener_id.is_empty() {
            return;
        }

        let seq = self.match_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let request = MatchRequest {
            s: query.to_string(),
            user_id: listener_id,
        };

        match self.api.match_suggestions(kind, &request).await {
            Ok(suggestions) => {
                let mut form = self.form.lock().await;
                if self.match_seq.load(Ordering::SeqCst) != seq {
                    tracing::debug!(query, "Dropping stale suggestions");
                    return;
                }
                form.suggestions = suggestions;
                drop(form);
                self.ui_state.lock().await.suggestion_selected = None;
            }
            Err(e) => tracing::warn!(query, error = %e, "Suggestion query failed"),
        }
    }

    pub async fn reconcile_suggestion_selection(&self, use_title: bool, entered_text: &str) -> bool {
        self.form.lock().await.reconcile(use_title, entered_text)
    }

    /// Put the highlighted suggestion's label into the focused field and
    /// reconcile it into song and artist
    pub async fn accept_suggestion(&self) -> bool {
        let (focus, selected) = {
            let ui_state = self.ui_state.lock().await;
            (ui_state.focus, ui_state.suggestion_selected)
        };
        let Some(index) = selected else {
            return false;
        };
        let use_title = focus == Focus::Song;

        let label = {
            let mut form = self.form.lock().await;
            let Some(label) = form.suggestions.get(index).map(|s| s.label(use_title)) else {
                return false;
            };
            match focus {
                Focus::Song => form.song_name = label.clone(),
                Focus::Artist => form.artist_name = label.clone(),
                _ => return false,
            }
            label
        };

        let matched = self.reconcile_suggestion_selection(use_title, &label).await;
        self.ui_state.lock().await.suggestion_selected = None;
        matched
    }

    // ========================================================================
    // Login
    // ========================================================================

    pub fn logged_in(&self) -> bool {
        self.tokens.load().is_some()
    }

    /// Fetch and check the Spotify authorize URL
    pub async fn request_login_url(&self) -> Option<String> {
        match self.api.login_url().await.and_then(|url| auth::validate_login_url(&url)) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::error!(error = %e, "Could not get a login URL");
                self.set_error(format!("Couldn't start Spotify login: {}", e)).await;
                None
            }
        }
    }

    /// Store a credential pasted by the user
    pub async fn import_credential(&self, input: &str) -> bool {
        let credential = match auth::parse_credential(input) {
            Ok(credential) => credential,
            Err(e) => {
                self.set_error(e.to_string()).await;
                return false;
            }
        };
        if let Err(e) = self.tokens.save(&credential) {
            tracing::error!(error = %e, "Failed to store token");
            self.set_error(format!("Couldn't save the token: {}", e)).await;
            return false;
        }
        tracing::info!("Logged in with imported token");
        self.set_message("Logged in to Spotify.").await;
        true
    }

    pub async fn logout(&self) {
        if let Err(e) = self.tokens.clear() {
            tracing::warn!(error = %e, "Failed to clear stored token");
        }
        self.ui_state.lock().await.user = None;
        self.set_message("Logged out.").await;
    }

    pub async fn fetch_current_user(&self) {
        let Some(token) = self.tokens.load() else {
            return;
        };
        match self.api.current_user(&token).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "Fetched Spotify profile");
                self.ui_state.lock().await.user = Some(user);
            }
            Err(e) => tracing::warn!(error = %e, "Could not fetch Spotify profile"),
        }
    }

    // ========================================================================
    // Derived values & snapshots
    // ========================================================================

    pub async fn song_label(&self) -> &'static str {
        self.form.lock().await.song_label()
    }

    pub async fn playlist_generated(&self) -> bool {
        !self.draft.lock().await.is_empty()
    }

    pub async fn get_form_state(&self) -> FormState {
        self.form.lock().await.clone()
    }

    pub async fn get_draft(&self) -> PlaylistDraft {
        self.draft.lock().await.clone()
    }

    pub async fn get_status(&self) -> StatusState {
        self.status.lock().await.clone()
    }

    pub async fn get_ui_state(&self) -> UiState {
        self.ui_state.lock().await.clone()
    }

    pub async fn set_error(&self, message: impl Into<String>) {
        self.status.lock().await.set_error(message);
    }

    pub async fn clear_error(&self) {
        self.status.lock().await.clear_error();
    }

    pub async fn has_error(&self) -> bool {
        self.status.lock().await.error.is_some()
    }

    pub async fn set_message(&self, message: &str) {
        self.status.lock().await.message = Some(message.to_string());
    }

    pub async fn auto_clear_old_errors(&self) {
        let mut status = self.status.lock().await;
        if let Some(timestamp) = status.error_timestamp {
            if timestamp.elapsed().as_secs() > ERROR_DISPLAY_SECS {
                status.clear_error();
            }
        }
    }

    pub async fn should_quit(&self) -> bool {
        *self.should_quit.lock().await
    }

    pub async fn set_should_quit(&self, quit: bool) {
        *self.should_quit.lock().await = quit;
    }

    // ========================================================================
    // Focus, cursors & text entry
    // ========================================================================

    pub async fn cycle_focus_forward(&self) {
        let mut state = self.ui_state.lock().await;
        state.focus = state.focus.next();
        state.suggestion_selected = None;
    }

    pub async fn cycle_focus_backward(&self) {
        let mut state = self.ui_state.lock().await;
        state.focus = state.focus.prev();
        state.suggestion_selected = None;
    }

    pub async fn move_selection_up(&self) {
        let mut state = self.ui_state.lock().await;
        match state.focus {
            Focus::Draft => state.draft_selected = state.draft_selected.saturating_sub(1),
            Focus::Song | Focus::Artist => {
                state.suggestion_selected = match state.suggestion_selected {
                    Some(0) | None => None,
                    Some(i) => Some(i - 1),
                };
            }
            _ => {}
        }
    }

    pub async fn move_selection_down(&self) {
        let draft_len = self.draft.lock().await.len();
        let suggestion_count = self.form.lock().await.suggestions.len();
        let mut state = self.ui_state.lock().await;
        match state.focus {
            Focus::Draft => {
                if state.draft_selected < draft_len.saturating_sub(1) {
                    state.draft_selected += 1;
                }
            }
            Focus::Song | Focus::Artist if suggestion_count > 0 => {
                state.suggestion_selected = Some(match state.suggestion_selected {
                    None => 0,
                    Some(i) => (i + 1).min(suggestion_count - 1),
                });
            }
            _ => {}
        }
    }

    /// Edit the focused form field. Returns the match query to issue when the
    /// field has completions.
    pub async fn edit_focused_field(&self, edit: impl FnOnce(&mut String)) -> Option<(MatchKind, String)> {
        let focus = self.ui_state.lock().await.focus;
        let mut form = self.form.lock().await;
        let field = match focus {
            Focus::Song => &mut form.song_name,
            Focus::Artist => &mut form.artist_name,
            Focus::Listener => &mut form.listener_id,
            Focus::Length => &mut form.requested_length,
            Focus::Draft => return None,
        };
        edit(field);
        let text = field.clone();
        focus.match_kind().map(|kind| (kind, text))
    }

    pub async fn show_overlay(&self, overlay: Overlay) {
        self.ui_state.lock().await.overlay = Some(overlay);
    }

    pub async fn hide_overlay(&self) {
        self.ui_state.lock().await.overlay = None;
    }

    pub async fn edit_token_prompt(&self, edit: impl FnOnce(&mut String)) {
        if let Some(Overlay::TokenPrompt { input }) = self.ui_state.lock().await.overlay.as_mut() {
            edit(input);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use chrono::DateTime;

    use crate::model::api_client::{error_field, ApiError};
    use crate::model::storage::MemoryStore;
    use crate::model::types::{Credential, RefreshedToken, SpotifyUser, Suggestion};

    #[derive(Clone)]
    enum Reply<T> {
        Ok(T),
        Fail(&'static str),
    }

    impl<T: Clone> Reply<T> {
        fn get(&self) -> Result<T, ApiError> {
            match self {
                Reply::Ok(value) => Ok(value.clone()),
                Reply::Fail(body) => Err(ApiError::Remote {
                    status: 500,
                    error: error_field(body),
                    body: body.to_string(),
                }),
            }
        }
    }

    struct FakeApi {
        delay: Duration,
        /// None answers without a URL
        login: Option<Reply<String>>,
        generation: Reply<Vec<Track>>,
        creation: Reply<Option<RefreshedToken>>,
        /// query -> (delay, matches)
        matches: HashMap<&'static str, (Duration, Vec<Suggestion>)>,
        calls: AtomicUsize,
        last_generation: std::sync::Mutex<Option<GenerationRequest>>,
        last_creation: std::sync::Mutex<Option<CreationRequest>>,
    }

    impl Default for FakeApi {
        fn default() -> Self {
            Self {
                delay: Duration::ZERO,
                login: Some(Reply::Ok("https://accounts.spotify.com/authorize?state=s".into())),
                generation: Reply::Ok(Vec::new()),
                creation: Reply::Ok(None),
                matches: HashMap::new(),
                calls: AtomicUsize::new(0),
                last_generation: std::sync::Mutex::new(None),
                last_creation: std::sync::Mutex::new(None),
            }
        }
    }

    impl FakeApi {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PlaylistApi for FakeApi {
        async fn login_url(&self) -> Result<String, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.login {
                Some(reply) => reply.get(),
                None => Err(ApiError::MissingLoginUrl),
            }
        }

        async fn generate_playlist(&self, request: &GenerationRequest) -> Result<Vec<Track>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_generation.lock().unwrap() = Some(request.clone());
            tokio::time::sleep(self.delay).await;
            self.generation.get()
        }

        async fn create_playlist(&self, request: &CreationRequest) -> Result<Option<RefreshedToken>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_creation.lock().unwrap() = Some(request.clone());
            tokio::time::sleep(self.delay).await;
            self.creation.get()
        }

        async fn match_suggestions(&self, _kind: MatchKind, request: &MatchRequest) -> Result<Vec<Suggestion>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let (delay, matches) = self.matches.get(request.s.as_str()).cloned().unwrap_or_default();
            tokio::time::sleep(delay).await;
            Ok(matches)
        }

        async fn current_user(&self, _credential: &Credential) -> Result<SpotifyUser, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(SpotifyUser { id: "snyderks".into(), display_name: Some("Kristian".into()) })
        }
    }

    fn credential(access: &str) -> Credential {
        Credential {
            access_token: access.into(),
            token_type: "Bearer".into(),
            refresh_token: "refresh".into(),
            expiry: DateTime::parse_from_rfc3339("2030-01-01T00:00:00Z").unwrap(),
        }
    }

    fn tracks() -> Vec<Track> {
        vec![Track::new("Hey Jude", "The Beatles"), Track::new("Let It Be", "The Beatles")]
    }

    struct Harness {
        model: AppModel,
        api: Arc<FakeApi>,
        store: Arc<MemoryStore>,
    }

    fn harness(api: FakeApi) -> Harness {
        let api = Arc::new(api);
        let store = Arc::new(MemoryStore::new());
        let config = AppConfig {
            slow_notice_delay: Duration::from_millis(5500),
            ..AppConfig::default()
        };
        let model = AppModel::new(store.clone(), api.clone(), &config);
        Harness { model, api, store }
    }

    async fn fill_form(model: &AppModel) {
        let mut form = model.form.lock().await;
        form.song_name = "Hey Jude".into();
        form.artist_name = "The Beatles".into();
        form.listener_id = "snyderks".into();
        form.requested_length = "2".into();
    }

    fn log_in(h: &Harness) {
        TokenStore::new(h.store.clone()).save(&credential("access")).unwrap();
    }

    #[tokio::test]
    async fn missing_fields_never_reach_the_network() {
        for skip in FormField::REQUIRED {
            let h = harness(FakeApi::default());
            log_in(&h);
            fill_form(&h.model).await;
            {
                let mut form = h.model.form.lock().await;
                match skip {
                    FormField::SongName => form.song_name.clear(),
                    FormField::ArtistName => form.artist_name.clear(),
                    FormField::ListenerId => form.listener_id = "   ".into(),
                }
            }

            h.model.request_playlist_generation().await;

            assert_eq!(h.api.calls(), 0);
            let status = h.model.get_status().await;
            assert!(status.error.as_deref().is_some_and(|e| !e.is_empty()));
            assert!(!status.activity);
            let form = h.model.get_form_state().await;
            assert!(form.is_invalid(skip));
            assert_eq!(form.invalid.len(), 1);
        }
    }

    #[tokio::test]
    async fn valid_fields_are_persisted() {
        let h = harness(FakeApi::default());
        fill_form(&h.model).await;

        assert!(h.model.validate_and_persist_form().await);
        assert_eq!(h.store.get(keys::SONG_NAME).as_deref(), Some("Hey Jude"));
        assert_eq!(h.store.get(keys::ARTIST_NAME).as_deref(), Some("The Beatles"));
        assert_eq!(h.store.get(keys::LISTENER_ID).as_deref(), Some("snyderks"));
        assert_eq!(h.store.get(keys::LENGTH).as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn partially_valid_form_persists_the_valid_fields() {
        let h = harness(FakeApi::default());
        h.model.form.lock().await.song_name = "Hey Jude".into();

        assert!(!h.model.validate_and_persist_form().await);
        assert_eq!(h.store.get(keys::SONG_NAME).as_deref(), Some("Hey Jude"));
        assert_eq!(h.store.get(keys::ARTIST_NAME), None);
    }

    #[tokio::test]
    async fn generation_without_login_short_circuits() {
        let h = harness(FakeApi::default());
        fill_form(&h.model).await;

        h.model.request_playlist_generation().await;

        assert_eq!(h.api.calls(), 0);
        let status = h.model.get_status().await;
        assert_eq!(status.error.as_deref(), Some(NOT_LOGGED_IN));
        assert!(!status.activity);
    }

    #[tokio::test(start_paused = true)]
    async fn generation_success_replaces_draft() {
        let h = harness(FakeApi {
            generation: Reply::Ok(tracks()),
            ..FakeApi::default()
        });
        log_in(&h);
        fill_form(&h.model).await;
        h.model.draft.lock().await.replace(vec![Track::new("Old", "Draft")]);

        h.model.request_playlist_generation().await;

        assert_eq!(h.model.get_draft().await.tracks(), tracks().as_slice());
        assert!(h.model.playlist_generated().await);
        let status = h.model.get_status().await;
        assert!(!status.activity);
        assert_eq!(status.message, None);
        assert_eq!(status.error, None);

        let sent = h.api.last_generation.lock().unwrap().clone().unwrap();
        assert_eq!(sent.length, "2");
        assert_eq!(sent.title, "Hey Jude");
        assert_eq!(sent.artist, "The Beatles");
        assert_eq!(sent.last_fm_username, "snyderks");
        assert_eq!(sent.token, credential("access"));
    }

    #[tokio::test(start_paused = true)]
    async fn typed_suggestion_label_is_split_before_generation() {
        let h = harness(FakeApi {
            generation: Reply::Ok(tracks()),
            ..FakeApi::default()
        });
        log_in(&h);
        fill_form(&h.model).await;
        {
            let mut form = h.model.form.lock().await;
            form.suggestions = vec![Suggestion::new("Hey Jude", "The Beatles")];
            form.song_name = "Hey Jude - The Beatles".into();
            form.artist_name.clear();
        }

        h.model.request_playlist_generation().await;

        let sent = h.api.last_generation.lock().unwrap().clone().unwrap();
        assert_eq!(sent.title, "Hey Jude");
        assert_eq!(sent.artist, "The Beatles");
        assert_eq!(h.store.get(keys::SONG_NAME).as_deref(), Some("Hey Jude"));
    }

    #[tokio::test(start_paused = true)]
    async fn generation_failure_uses_error_field() {
        let h = harness(FakeApi {
            generation: Reply::Fail(r#"{"error":"X"}"#),
            ..FakeApi::default()
        });
        log_in(&h);
        fill_form(&h.model).await;

        h.model.request_playlist_generation().await;

        let status = h.model.get_status().await;
        assert_eq!(status.error.as_deref(), Some("X"));
        assert!(!status.activity);
        assert!(!h.model.playlist_generated().await);
    }

    #[tokio::test(start_paused = true)]
    async fn generation_failure_falls_back() {
        for (body, expected) in [
            ("", GENERATION_FALLBACK),
            ("Couldn't create the playlist. Try again.", "Couldn't create the playlist. Try again."),
        ] {
            let h = harness(FakeApi {
                generation: Reply::Fail(body),
                ..FakeApi::default()
            });
            log_in(&h);
            fill_form(&h.model).await;

            h.model.request_playlist_generation().await;

            assert_eq!(h.model.get_status().await.error.as_deref(), Some(expected));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_generation_shows_notice_until_settled() {
        let h = harness(FakeApi {
            delay: Duration::from_secs(10),
            generation: Reply::Ok(tracks()),
            ..FakeApi::default()
        });
        log_in(&h);
        fill_form(&h.model).await;

        let model = h.model.clone();
        let request = tokio::spawn(async move { model.request_playlist_generation().await });

        tokio::time::sleep(Duration::from_secs(6)).await;
        let status = h.model.get_status().await;
        assert!(status.activity);
        assert_eq!(status.message.as_deref(), Some(SLOW_GENERATION_NOTICE));

        request.await.unwrap();
        let status = h.model.get_status().await;
        assert!(!status.activity);
        assert_eq!(status.message, None);
        assert_eq!(h.model.get_draft().await.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn fast_generation_never_shows_notice() {
        let h = harness(FakeApi {
            delay: Duration::from_secs(1),
            generation: Reply::Fail(r#"{"error":"nope"}"#),
            ..FakeApi::default()
        });
        log_in(&h);
        fill_form(&h.model).await;

        h.model.request_playlist_generation().await;
        tokio::time::sleep(Duration::from_secs(10)).await;

        let status = h.model.get_status().await;
        assert_eq!(status.message, None);
        assert_eq!(status.error.as_deref(), Some("nope"));
    }

    #[tokio::test(start_paused = true)]
    async fn second_request_while_busy_is_ignored() {
        let h = harness(FakeApi {
            delay: Duration::from_secs(3),
            generation: Reply::Ok(tracks()),
            ..FakeApi::default()
        });
        log_in(&h);
        fill_form(&h.model).await;

        let model = h.model.clone();
        let first = tokio::spawn(async move { model.request_playlist_generation().await });
        tokio::time::sleep(Duration::from_secs(1)).await;
        h.model.request_playlist_generation().await;
        first.await.unwrap();

        assert_eq!(h.api.calls(), 1);
    }

    #[tokio::test]
    async fn delete_track_through_model() {
        let h = harness(FakeApi::default());
        h.model.draft.lock().await.replace(tracks());
        h.model.ui_state.lock().await.draft_selected = 1;

        let removed = h.model.delete_track(0).await.unwrap();
        assert_eq!(removed.title, "Hey Jude");
        assert_eq!(h.model.get_draft().await.tracks(), &tracks()[1..]);
        assert_eq!(h.model.get_ui_state().await.draft_selected, 0);

        assert_eq!(
            h.model.delete_track(5).await,
            Err(DraftError::IndexOutOfRange { index: 5, len: 1 })
        );
    }

    #[tokio::test]
    async fn reorder_track_through_model() {
        let h = harness(FakeApi::default());
        h.model.draft.lock().await.replace(tracks());

        h.model.reorder_track(1, 0).await.unwrap();
        let draft = h.model.get_draft().await;
        assert_eq!(draft.tracks()[0].title, "Let It Be");
        assert_eq!(h.model.get_ui_state().await.draft_selected, 0);
        assert!(h.model.reorder_track(0, 2).await.is_err());
    }

    #[tokio::test]
    async fn creation_with_full_token_overwrites_store() {
        let refreshed = RefreshedToken {
            access_token: Some("fresh".into()),
            token_type: Some("Bearer".into()),
            refresh_token: Some("refresh".into()),
            expiry: Some(DateTime::parse_from_rfc3339("2030-01-01T00:00:00Z").unwrap()),
        };
        let h = harness(FakeApi {
            creation: Reply::Ok(Some(refreshed)),
            ..FakeApi::default()
        });
        log_in(&h);
        h.model.draft.lock().await.replace(tracks());
        h.model.set_error("old").await;

        h.model.request_playlist_creation().await;

        assert_eq!(h.store.get(keys::ACCESS_TOKEN).as_deref(), Some("fresh"));
        let status = h.model.get_status().await;
        assert_eq!(status.message.as_deref(), Some(CREATION_SUCCESS));
        assert_eq!(status.error, None);
        assert!(!status.activity);
        assert!(!h.model.playlist_generated().await);

        let sent = h.api.last_creation.lock().unwrap().clone().unwrap();
        assert_eq!(sent.playlist_name, crate::config::DEFAULT_PLAYLIST_NAME);
        assert_eq!(sent.songs, tracks());
    }

    #[tokio::test]
    async fn creation_with_partial_token_keeps_store() {
        let refreshed = RefreshedToken {
            access_token: Some("fresh".into()),
            token_type: Some("Bearer".into()),
            refresh_token: None,
            expiry: Some(DateTime::parse_from_rfc3339("2031-01-01T00:00:00Z").unwrap()),
        };
        let h = harness(FakeApi {
            creation: Reply::Ok(Some(refreshed)),
            ..FakeApi::default()
        });
        log_in(&h);
        h.model.draft.lock().await.replace(tracks());

        h.model.request_playlist_creation().await;

        assert_eq!(h.store.get(keys::ACCESS_TOKEN).as_deref(), Some("access"));
        assert_eq!(h.store.get(keys::EXPIRY).as_deref(), Some("2030-01-01T00:00:00+00:00"));
        assert_eq!(h.model.get_status().await.message.as_deref(), Some(CREATION_SUCCESS));
    }

    #[tokio::test]
    async fn creation_failure_uses_structured_error_only() {
        for (body, expected) in [
            (r#"{"Error":"Your profile couldn't be retrieved."}"#, "Your profile couldn't be retrieved."),
            ("plain text", CREATION_FALLBACK),
        ] {
            let h = harness(FakeApi {
                creation: Reply::Fail(body),
                ..FakeApi::default()
            });
            log_in(&h);
            h.model.draft.lock().await.replace(tracks());

            h.model.request_playlist_creation().await;

            let status = h.model.get_status().await;
            assert_eq!(status.error.as_deref(), Some(expected));
            assert!(!status.activity);
            assert!(h.model.playlist_generated().await);
        }
    }

    #[tokio::test]
    async fn creation_without_login_short_circuits() {
        let h = harness(FakeApi::default());
        h.model.draft.lock().await.replace(tracks());

        h.model.request_playlist_creation().await;

        assert_eq!(h.api.calls(), 0);
        assert_eq!(h.model.get_status().await.error.as_deref(), Some(NOT_LOGGED_IN));
    }

    #[tokio::test]
    async fn match_query_needs_a_listener() {
        let h = harness(FakeApi::default());
        h.model.query_matches(MatchKind::Song, "hey").await;
        assert_eq!(h.api.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn newest_match_query_wins() {
        let mut matches = HashMap::new();
        matches.insert("h", (Duration::from_secs(3), vec![Suggestion::new("Help!", "The Beatles")]));
        matches.insert("he", (Duration::from_secs(1), vec![Suggestion::new("Hey Jude", "The Beatles")]));
        let h = harness(FakeApi {
            matches,
            ..FakeApi::default()
        });
        h.model.form.lock().await.listener_id = "snyderks".into();

        let model = h.model.clone();
        let older = tokio::spawn(async move { model.query_matches(MatchKind::Song, "h").await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        h.model.query_matches(MatchKind::Song, "he").await;
        older.await.unwrap();

        let form = h.model.get_form_state().await;
        assert_eq!(form.suggestions, vec![Suggestion::new("Hey Jude", "The Beatles")]);
    }

    #[tokio::test]
    async fn reconcile_through_model() {
        let h = harness(FakeApi::default());
        h.model.form.lock().await.suggestions = vec![Suggestion::new("A", "B")];

        assert!(h.model.reconcile_suggestion_selection(true, "A - B").await);
        assert!(h.model.reconcile_suggestion_selection(false, "B - A").await);
        let form = h.model.get_form_state().await;
        assert_eq!((form.song_name.as_str(), form.artist_name.as_str()), ("A", "B"));

        h.model.form.lock().await.song_name = "kept".into();
        assert!(!h.model.reconcile_suggestion_selection(true, "X - Y").await);
        assert_eq!(h.model.get_form_state().await.song_name, "kept");
    }

    #[tokio::test]
    async fn accepting_a_suggestion_fills_both_fields() {
        let h = harness(FakeApi::default());
        h.model.form.lock().await.suggestions = vec![
            Suggestion::new("Help!", "The Beatles"),
            Suggestion::new("Hey Jude", "The Beatles"),
        ];
        {
            let mut ui_state = h.model.ui_state.lock().await;
            ui_state.focus = Focus::Artist;
            ui_state.suggestion_selected = Some(1);
        }

        assert!(h.model.accept_suggestion().await);
        let form = h.model.get_form_state().await;
        assert_eq!(form.song_name, "Hey Jude");
        assert_eq!(form.artist_name, "The Beatles");
    }

    #[tokio::test]
    async fn derived_values() {
        let h = harness(FakeApi::default());
        assert!(!h.model.logged_in());
        assert_eq!(h.model.song_label().await, "songs");
        assert!(!h.model.playlist_generated().await);

        log_in(&h);
        h.model.form.lock().await.requested_length = "1".into();
        h.model.draft.lock().await.replace(tracks());
        assert!(h.model.logged_in());
        assert_eq!(h.model.song_label().await, "song");
        assert!(h.model.playlist_generated().await);
    }

    #[tokio::test]
    async fn missing_login_url_is_an_error() {
        let h = harness(FakeApi {
            login: None,
            ..FakeApi::default()
        });
        assert_eq!(h.model.request_login_url().await, None);
        let error = h.model.get_status().await.error.unwrap();
        assert!(error.contains("Login URL missing"), "{}", error);

        let h = harness(FakeApi {
            login: Some(Reply::Ok("https://phish.example.com/authorize".into())),
            ..FakeApi::default()
        });
        assert_eq!(h.model.request_login_url().await, None);
        assert!(h.model.has_error().await);

        let h = harness(FakeApi::default());
        assert!(h.model.request_login_url().await.is_some());
    }

    #[tokio::test]
    async fn import_then_logout() {
        let h = harness(FakeApi::default());
        let token = serde_json::to_string(&credential("pasted")).unwrap();

        assert!(h.model.import_credential(&token).await);
        assert!(h.model.logged_in());
        h.model.fetch_current_user().await;
        assert_eq!(h.model.get_ui_state().await.user.unwrap().name(), "Kristian");

        h.model.logout().await;
        assert!(!h.model.logged_in());
        assert!(h.model.get_ui_state().await.user.is_none());

        assert!(!h.model.import_credential("nonsense").await);
        assert!(h.model.has_error().await);
    }

    #[tokio::test]
    async fn persisted_values_prefill_the_form() {
        let h = harness(FakeApi::default());
        h.store.set(keys::SONG_NAME, "Hey Jude").unwrap();
        h.store.set(keys::LISTENER_ID, "snyderks").unwrap();
        h.store.set(keys::LENGTH, "1").unwrap();

        h.model.load_persisted().await;

        let form = h.model.get_form_state().await;
        assert_eq!(form.song_name, "Hey Jude");
        assert_eq!(form.artist_name, "");
        assert_eq!(form.listener_id, "snyderks");
        assert_eq!(form.song_label(), "song");
    }

    #[tokio::test]
    async fn typing_returns_a_match_query_for_song_and_artist() {
        let h = harness(FakeApi::default());
        let query = h.model.edit_focused_field(|f| f.push_str("he")).await;
        assert_eq!(query, Some((MatchKind::Song, "he".to_string())));

        h.model.ui_state.lock().await.focus = Focus::Listener;
        assert_eq!(h.model.edit_focused_field(|f| f.push('x')).await, None);
        assert_eq!(h.model.get_form_state().await.listener_id, "x");
    }
}
