//! Transport and global settings rendering.
//!
//! Displays the playback status, fundamental, export duration, master
//! volume and the status line.

use crate::app::App;
use crate::audio::PlaybackState;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

/// Renders the transport bar at the top of the screen.
///
/// # Arguments
///
/// * `frame` - The frame to render to
/// * `area` - The area to render in
/// * `app` - Application state
pub fn render_transport(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(" Transport ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(12), // Playback status
            Constraint::Length(18), // Fundamental
            Constraint::Length(16), // Duration
            Constraint::Length(14), // Volume
            Constraint::Min(20),    // Status message
        ])
        .split(inner);

    let play_status = match app.audio.playback_state() {
        PlaybackState::Playing => Span::styled(
            " [>] PLAY ",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        PlaybackState::Stopped => Span::styled(
            " [.] STOP ",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
    };
    frame.render_widget(Paragraph::new(Line::from(play_status)), chunks[0]);

    let settings = app.settings();
    let label_style = Style::default().fg(Color::DarkGray);
    let value_style = Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);

    let fields = [
        ("f0: ", format!("{:.0} Hz", settings.fundamental_frequency)),
        ("Dur: ", format!("{:.1} s", settings.duration)),
        ("Vol: ", format!("{:.0}%", settings.master_volume * 100.0)),
    ];
    for (chunk, (label, value)) in chunks[1..4].iter().zip(fields) {
        let widget = Paragraph::new(Line::from(vec![
            Span::styled(label, label_style),
            Span::styled(value, value_style),
        ]));
        frame.render_widget(widget, *chunk);
    }

    let status_line = if let Some((msg, _)) = &app.status_message {
        Line::from(Span::styled(
            msg.as_str(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::ITALIC),
        ))
    } else {
        let key_style = Style::default().fg(Color::Yellow);
        Line::from(vec![
            Span::styled("[", label_style),
            Span::styled("Space", key_style),
            Span::styled("]Play ", label_style),
            Span::styled("[", label_style),
            Span::styled("e", key_style),
            Span::styled("]Export ", label_style),
            Span::styled("[", label_style),
            Span::styled("?", key_style),
            Span::styled("]Help", label_style),
        ])
    };
    frame.render_widget(Paragraph::new(status_line), chunks[4]);
}
