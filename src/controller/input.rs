//! Key event handling

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::model::{Focus, Overlay};
use super::AppController;

impl AppController {
    pub async fn handle_key_event(&self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        let model = &self.model;
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        if ctrl && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q')) {
            model.set_should_quit(true).await;
            return Ok(());
        }

        // Handle error message first (blocks all other interactions)
        if model.has_error().await {
            return match key.code {
                KeyCode::Esc | KeyCode::Enter => {
                    model.clear_error().await;
                    Ok(())
                }
                _ => Ok(()),
            };
        }

        let ui_state = model.get_ui_state().await;

        // Overlays take every key while open
        if let Some(overlay) = ui_state.overlay {
            match overlay {
                Overlay::Help => {
                    if matches!(key.code, KeyCode::Esc | KeyCode::F(1)) {
                        model.hide_overlay().await;
                    }
                }
                Overlay::Login { .. } => match key.code {
                    KeyCode::Esc => model.hide_overlay().await,
                    KeyCode::Enter | KeyCode::Char('t') | KeyCode::Char('T') => {
                        model.show_overlay(Overlay::TokenPrompt { input: String::new() }).await;
                    }
                    _ => {}
                },
                Overlay::TokenPrompt { input } => match key.code {
                    KeyCode::Esc => model.hide_overlay().await,
                    KeyCode::Enter => self.submit_token(input).await,
                    KeyCode::Backspace => {
                        model.edit_token_prompt(|text| {
                            text.pop();
                        })
                        .await;
                    }
                    KeyCode::Char(c) if !ctrl => {
                        model.edit_token_prompt(|text| text.push(c)).await;
                    }
                    _ => {}
                },
            }
            return Ok(());
        }

        // Global keybindings
        match key.code {
            KeyCode::Char('l') | KeyCode::Char('L') if ctrl => {
                self.spawn_login();
                return Ok(());
            }
            KeyCode::Char('t') | KeyCode::Char('T') if ctrl => {
                model.show_overlay(Overlay::TokenPrompt { input: String::new() }).await;
                return Ok(());
            }
            KeyCode::Char('o') | KeyCode::Char('O') if ctrl => {
                model.logout().await;
                return Ok(());
            }
            KeyCode::F(1) => {
                model.show_overlay(Overlay::Help).await;
                return Ok(());
            }
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    model.cycle_focus_backward().await;
                } else {
                    model.cycle_focus_forward().await;
                }
                return Ok(());
            }
            KeyCode::BackTab => {
                model.cycle_focus_backward().await;
                return Ok(());
            }
            KeyCode::Up => {
                model.move_selection_up().await;
                return Ok(());
            }
            KeyCode::Down => {
                model.move_selection_down().await;
                return Ok(());
            }
            _ => {}
        }

        if ui_state.focus == Focus::Draft {
            let selected = ui_state.draft_selected;
            match key.code {
                KeyCode::Delete | KeyCode::Char('x') | KeyCode::Char('X') => {
                    if let Err(e) = model.delete_track(selected).await {
                        tracing::debug!(error = %e, "Nothing to delete");
                    }
                }
                // Move the selected track up
                KeyCode::Char('K') | KeyCode::Char('k') => {
                    if selected > 0 {
                        if let Err(e) = model.reorder_track(selected, selected - 1).await {
                            tracing::debug!(error = %e, "Reorder ignored");
                        }
                    }
                }
                // Move the selected track down
                KeyCode::Char('J') | KeyCode::Char('j') => {
                    if let Err(e) = model.reorder_track(selected, selected + 1).await {
                        tracing::debug!(error = %e, "Reorder ignored");
                    }
                }
                KeyCode::Char('c') | KeyCode::Char('C') => self.spawn_creation(),
                KeyCode::Enter => self.spawn_generation(),
                _ => {}
            }
            return Ok(());
        }

        // Form fields
        match key.code {
            KeyCode::Enter => {
                if ui_state.suggestion_selected.is_some() {
                    model.accept_suggestion().await;
                } else {
                    self.spawn_generation();
                }
            }
            KeyCode::Esc => {
                if let Some((kind, query)) = model.edit_focused_field(|text| text.clear()).await {
                    self.spawn_match_query(kind, query);
                }
            }
            KeyCode::Backspace => {
                if let Some((kind, query)) = model
                    .edit_focused_field(|text| {
                        text.pop();
                    })
                    .await
                {
                    self.spawn_match_query(kind, query);
                }
            }
            KeyCode::Char(c) if !ctrl => {
                // The length field only takes digits
                if ui_state.focus == Focus::Length && !c.is_ascii_digit() {
                    return Ok(());
                }
                if let Some((kind, query)) = model.edit_focused_field(|text| text.push(c)).await {
                    self.spawn_match_query(kind, query);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Bracketed paste goes into the token prompt or the focused field
    pub async fn handle_paste(&self, text: String) {
        let ui_state = self.model.get_ui_state().await;
        match ui_state.overlay {
            Some(Overlay::TokenPrompt { .. }) => {
                self.model.edit_token_prompt(|input| input.push_str(text.trim())).await;
            }
            Some(_) => {}
            None if ui_state.focus == Focus::Length => {}
            None => {
                let text = text.replace(['\r', '\n'], " ");
                if let Some((kind, query)) = self.model.edit_focused_field(|field| field.push_str(&text)).await {
                    self.spawn_match_query(kind, query);
                }
            }
        }
    }
}
