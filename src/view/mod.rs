//! View module - UI rendering
//!
//! This module handles all UI rendering for the application using ratatui.
//! It is organized into submodules by component type:
//!
//! - `utils`: Shared utility functions (truncation, scrollable lists, popups)
//! - `layout`: Main layout structure (top bar, form fields)
//! - `content`: Suggestion and playlist lists
//! - `status`: Status bar rendering
//! - `overlays`: Modal overlays (error, login, token prompt, help)

mod utils;
mod layout;
mod content;
mod status;
mod overlays;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use crate::model::{FormState, Overlay, PlaylistDraft, StatusState, UiState};

/// Everything one frame needs, snapshotted from the model
pub struct ViewState {
    pub form: FormState,
    pub draft: PlaylistDraft,
    pub status: StatusState,
    pub ui_state: UiState,
    pub logged_in: bool,
    pub song_label: &'static str,
    pub playlist_generated: bool,
}

pub struct AppView;

impl AppView {
    pub fn render(frame: &mut Frame, state: &ViewState) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title + account
                Constraint::Min(0),    // Form and playlist
                Constraint::Length(3), // Status
            ])
            .split(frame.area());

        layout::render_top_bar(frame, chunks[0], &state.ui_state, state.logged_in);

        let main_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(40), // Form + suggestions
                Constraint::Percentage(60), // Playlist
            ])
            .split(chunks[1]);

        let suggestions_area = layout::render_form(frame, main_chunks[0], &state.form, &state.ui_state, state.song_label);
        content::render_suggestions(frame, suggestions_area, &state.form, &state.ui_state);
        content::render_draft(frame, main_chunks[1], &state.draft, &state.ui_state, state.playlist_generated);

        status::render_status_bar(frame, chunks[2], &state.status, state.logged_in);

        match &state.ui_state.overlay {
            Some(Overlay::Login { url }) => overlays::render_login_url(frame, url),
            Some(Overlay::TokenPrompt { input }) => overlays::render_token_prompt(frame, input),
            Some(Overlay::Help) => overlays::render_help_popup(frame),
            None => {}
        }

        // Error notification overlay (if there's an error)
        if let Some(error) = &state.status.error {
            overlays::render_error_notification(frame, error);
        }
    }
}
