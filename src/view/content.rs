//! List rendering (suggestions, generated playlist)

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, ListItem, Paragraph},
    Frame,
};
use ratatui::widgets::Padding;

use crate::model::{Focus, FormState, PlaylistDraft, UiState};
use super::utils::{calculate_num_width, render_scrollable_list, truncate_string};

pub fn render_suggestions(frame: &mut Frame, area: Rect, form: &FormState, ui_state: &UiState) {
    let use_title = match ui_state.focus {
        Focus::Song => true,
        Focus::Artist => false,
        _ => {
            render_hint(frame, area);
            return;
        }
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Suggestions (↑↓ Enter) ")
        .padding(Padding::horizontal(1));

    if form.suggestions.is_empty() {
        let empty = Paragraph::new("Keep typing for matches from your listening history")
            .style(Style::default().fg(Color::DarkGray))
            .wrap(ratatui::widgets::Wrap { trim: true })
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = form
        .suggestions
        .iter()
        .enumerate()
        .map(|(i, suggestion)| {
            let style = if ui_state.suggestion_selected == Some(i) {
                Style::default().fg(Color::Black).bg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(suggestion.label(use_title)).style(style)
        })
        .collect();

    render_scrollable_list(frame, area, items, ui_state.suggestion_selected, block);
}

fn render_hint(frame: &mut Frame, area: Rect) {
    let hint = Paragraph::new("Enter: generate   Tab: next field   F1: help")
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL).padding(Padding::horizontal(1)));
    frame.render_widget(hint, area);
}

pub fn render_draft(
    frame: &mut Frame,
    area: Rect,
    draft: &PlaylistDraft,
    ui_state: &UiState,
    playlist_generated: bool,
) {
    let is_focused = ui_state.focus == Focus::Draft && ui_state.overlay.is_none();
    let border_style = if is_focused {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };

    if !playlist_generated {
        let content = Paragraph::new("Fill in a song, an artist and a Last.fm username,\nthen press Enter to generate a playlist.")
            .style(Style::default().fg(Color::DarkGray))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Playlist ")
                    .padding(Padding::horizontal(1))
                    .border_style(border_style),
            );
        frame.render_widget(content, area);
        return;
    }

    let content_width = area.width.saturating_sub(4) as usize;
    let num_width = calculate_num_width(draft.len());
    let text_width = content_width.saturating_sub(num_width + 4);
    let title_width = (text_width * 55) / 100;
    let artist_width = text_width.saturating_sub(title_width);

    let items: Vec<ListItem> = draft
        .tracks()
        .iter()
        .enumerate()
        .map(|(i, track)| {
            let selected = i == ui_state.draft_selected;
            let style = if selected && is_focused {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else if selected {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!("{:>width$}  ", i + 1, width = num_width), Style::default().fg(Color::DarkGray)),
                Span::styled(truncate_string(&track.title, title_width), style),
                Span::raw("  "),
                Span::styled(truncate_string(&track.artist, artist_width), Style::default().fg(Color::Gray)),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Playlist ({} tracks) ", draft.len()))
        .title_bottom(Line::from(" x: delete  K/J: move  c: save to Spotify ").right_aligned())
        .padding(Padding::horizontal(1))
        .border_style(border_style);

    render_scrollable_list(frame, area, items, Some(ui_state.draft_selected), block);
}
