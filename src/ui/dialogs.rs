//! Dialog overlay for adding a harmonic.

use crate::app::{AddField, App};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use super::centered_rect;

/// Builds an input line: label, typed text and a cursor when focused.
fn input_line<'a>(label: &'a str, value: &'a str, focused: bool) -> Line<'a> {
    let label_style = if focused {
        Style::default().fg(Color::White)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let mut spans = vec![
        Span::styled(label, label_style),
        Span::styled(
            value,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
    ];
    if focused {
        spans.push(Span::styled(
            "_",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::RAPID_BLINK),
        ));
    }
    Line::from(spans)
}

/// Renders the add-harmonic dialog overlay.
///
/// # Arguments
///
/// * `frame` - The frame to render to
/// * `app` - Application state
pub fn render_add_dialog(frame: &mut Frame, app: &App) {
    let dialog = &app.add_dialog;
    if !dialog.open {
        return;
    }

    let area = centered_rect(40, 30, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Add Harmonic ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Harmonic number
            Constraint::Length(1), // Amplitude
            Constraint::Length(1), // Spacer
            Constraint::Length(1), // Error
            Constraint::Min(1),    // Instructions
        ])
        .split(inner);

    frame.render_widget(
        Paragraph::new(input_line(
            "Harmonic (1-32): ",
            &dialog.id_input,
            dialog.field == AddField::Id,
        )),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(input_line(
            "Amplitude (0-1): ",
            &dialog.amplitude_input,
            dialog.field == AddField::Amplitude,
        )),
        chunks[1],
    );

    if let Some(error) = &dialog.error {
        frame.render_widget(
            Paragraph::new(Span::styled(
                error.as_str(),
                Style::default().fg(Color::Red),
            )),
            chunks[3],
        );
    }

    let key_style = Style::default().fg(Color::Yellow);
    let desc_style = Style::default().fg(Color::DarkGray);
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("[", desc_style),
            Span::styled("Tab", key_style),
            Span::styled("]Field ", desc_style),
            Span::styled("[", desc_style),
            Span::styled("Enter", key_style),
            Span::styled("]Add ", desc_style),
            Span::styled("[", desc_style),
            Span::styled("Esc", key_style),
            Span::styled("]Cancel", desc_style),
        ])),
        chunks[4],
    );
}
