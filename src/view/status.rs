//! Status bar rendering

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::model::StatusState;

pub fn render_status_bar(frame: &mut Frame, area: Rect, status: &StatusState, logged_in: bool) {
    let (text, style) = if status.activity {
        let text = status.message.as_deref().unwrap_or("Working...");
        (format!(" ⏳ {}", text), Style::default().fg(Color::Yellow))
    } else if let Some(message) = &status.message {
        (format!(" ✔ {}", message), Style::default().fg(Color::Green))
    } else {
        (" Ready".to_string(), Style::default().fg(Color::DarkGray))
    };

    let login_text = if logged_in { " Ctrl-O: log out " } else { " Ctrl-L: log in  Ctrl-T: paste token " };

    let bar = Paragraph::new(text).style(style).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Status ")
            .title_bottom(Line::from(format!("{}| F1: help | Ctrl-Q: quit ", login_text)).right_aligned()),
    );
    frame.render_widget(bar, area);
}
