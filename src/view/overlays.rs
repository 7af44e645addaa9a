//! Overlay rendering (error notification, login, token prompt, help popup)

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::utils::centered_popup;

pub fn render_error_notification(frame: &mut Frame, error_msg: &str) {
    let area = frame.area();

    // Fixed width popup (responsive to screen size)
    let popup_width = 52.min(area.width.saturating_sub(4));
    let inner_width = popup_width.saturating_sub(4).max(1) as usize; // account for borders

    // Calculate how many lines the error message will take when wrapped
    let error_line_count = ((error_msg.chars().count() as f32) / (inner_width as f32)).ceil() as u16;

    // Height: top border (1) + error lines + bottom border (1)
    let popup_area = centered_popup(area, popup_width, 2 + error_line_count.max(1));

    // Clear the area behind the popup first
    frame.render_widget(Clear, popup_area);

    let error_widget = Paragraph::new(error_msg.to_string())
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(" Error (Esc to dismiss) ")
                .title_style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
                .style(Style::default().bg(Color::Black)),
        );

    frame.render_widget(error_widget, popup_area);
}

pub fn render_login_url(frame: &mut Frame, url: &str) {
    let popup_area = centered_popup(frame.area(), 72, 12);
    frame.render_widget(Clear, popup_area);

    let lines = vec![
        Line::from("Open this URL in your browser and approve access:"),
        Line::from(""),
        Line::from(Span::styled(url.to_string(), Style::default().fg(Color::Cyan))),
        Line::from(""),
        Line::from(Span::styled(
            "Then press Enter and paste the token (or the whole redirect URL).",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let popup = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green))
                .title(" Log in to Spotify (Enter / Esc) ")
                .title_style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
                .style(Style::default().bg(Color::Black)),
        );
    frame.render_widget(popup, popup_area);
}

pub fn render_token_prompt(frame: &mut Frame, input: &str) {
    let popup_area = centered_popup(frame.area(), 72, 8);
    frame.render_widget(Clear, popup_area);

    let shown = if input.is_empty() {
        Span::styled("Paste the token JSON or redirect URL...", Style::default().fg(Color::DarkGray))
    } else {
        Span::styled(format!("{}▏", input), Style::default().fg(Color::White))
    };

    let popup = Paragraph::new(Line::from(shown))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Spotify token (Enter to save, Esc to cancel) ")
                .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                .style(Style::default().bg(Color::Black)),
        );
    frame.render_widget(popup, popup_area);
}

pub fn render_help_popup(frame: &mut Frame) {
    // Define keybindings organized by category
    let keybindings = vec![
        ("", "── Form ──"),
        ("Tab / Shift+Tab", "Next / previous field"),
        ("↑ / ↓", "Browse suggestions"),
        ("Enter", "Pick suggestion / Generate"),
        ("Esc", "Clear field"),
        ("", ""),
        ("", "── Playlist ──"),
        ("↑ / ↓", "Move selection"),
        ("X / Delete", "Remove track"),
        ("K / J", "Move track up / down"),
        ("C", "Save playlist to Spotify"),
        ("", ""),
        ("", "── Account ──"),
        ("Ctrl+L", "Log in to Spotify"),
        ("Ctrl+T", "Paste token"),
        ("Ctrl+O", "Log out"),
        ("", ""),
        ("", "── General ──"),
        ("F1", "Toggle this help"),
        ("Ctrl+Q", "Quit"),
    ];

    let popup_area = centered_popup(frame.area(), 62, keybindings.len() as u16 + 2);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    // Create help text lines
    let lines: Vec<Line> = keybindings
        .iter()
        .map(|(key, desc)| {
            if key.is_empty() {
                // Section header or empty line
                Line::from(Span::styled(
                    format!("{:^38}", desc),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(vec![
                    Span::styled(
                        format!("{:>18}", key),
                        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw("  "),
                    Span::styled(desc.to_string(), Style::default().fg(Color::White)),
                ])
            }
        })
        .collect();

    let help_text = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Help (F1 or Esc to close) ")
                .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                .style(Style::default().bg(Color::Black)),
        )
        .style(Style::default().bg(Color::Black));

    frame.render_widget(help_text, popup_area);
}
