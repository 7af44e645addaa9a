//! Layout rendering (top bar, request form)

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use ratatui::widgets::Padding;

use crate::model::{Focus, FormField, FormState, UiState};

pub fn render_top_bar(frame: &mut Frame, area: Rect, ui_state: &UiState, logged_in: bool) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),     // Title
            Constraint::Length(32), // Spotify account
        ])
        .split(area);

    let title = Paragraph::new(Line::from(vec![
        Span::styled("Spotkov", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        Span::styled("  playlists from your Last.fm history", Style::default().fg(Color::DarkGray)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .padding(Padding::horizontal(1)),
    );
    frame.render_widget(title, chunks[0]);

    let (account, style) = match (&ui_state.user, logged_in) {
        (Some(user), true) => (format!("● {}", user.name()), Style::default().fg(Color::Green)),
        (None, true) => ("● Logged in".to_string(), Style::default().fg(Color::Green)),
        (_, false) => ("○ Not logged in (Ctrl-L)".to_string(), Style::default().fg(Color::Yellow)),
    };
    let account = Paragraph::new(account)
        .style(style)
        .block(Block::default().borders(Borders::ALL).title(" Spotify "));
    frame.render_widget(account, chunks[1]);
}

fn field_block<'a>(title: String, focused: bool, invalid: bool) -> Block<'a> {
    let border_style = if invalid {
        Style::default().fg(Color::Red)
    } else if focused {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };
    let title = if invalid { format!(" {} (required) ", title) } else { format!(" {} ", title) };

    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .padding(Padding::horizontal(1))
        .border_style(border_style)
}

fn field_text<'a>(value: &'a str, placeholder: &'a str, focused: bool) -> Paragraph<'a> {
    if value.is_empty() && !focused {
        Paragraph::new(placeholder).style(Style::default().fg(Color::DarkGray))
    } else if focused {
        Paragraph::new(format!("{}▏", value)).style(Style::default().fg(Color::Green))
    } else {
        Paragraph::new(value).style(Style::default().fg(Color::White))
    }
}

/// The four input fields stacked vertically. Returns the area left below them.
pub fn render_form(
    frame: &mut Frame,
    area: Rect,
    form: &FormState,
    ui_state: &UiState,
    song_label: &str,
) -> Rect {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Song
            Constraint::Length(3), // Artist
            Constraint::Length(3), // Last.fm user
            Constraint::Length(3), // Length
            Constraint::Min(0),    // Suggestions
        ])
        .split(area);

    let fields = [
        (Focus::Song, Some(FormField::SongName), "Song", form.song_name.as_str(), "Type a song title..."),
        (Focus::Artist, Some(FormField::ArtistName), "Artist", form.artist_name.as_str(), "Type an artist..."),
        (Focus::Listener, Some(FormField::ListenerId), "Last.fm username", form.listener_id.as_str(), "Whose history to use"),
        (Focus::Length, None, "Length", form.requested_length.as_str(), "20"),
    ];

    for (i, (focus, field, title, value, placeholder)) in fields.into_iter().enumerate() {
        let focused = ui_state.focus == focus && ui_state.overlay.is_none();
        let invalid = field.is_some_and(|f| form.is_invalid(f));
        let title = if focus == Focus::Length {
            format!("{} ({})", title, song_label)
        } else {
            title.to_string()
        };

        let widget = field_text(value, placeholder, focused).block(field_block(title, focused, invalid));
        frame.render_widget(widget, chunks[i]);
    }

    chunks[4]
}
