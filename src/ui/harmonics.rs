//! Active harmonic list rendering.
//!
//! One row per active harmonic with its lock/mute/solo states, frequency,
//! configured amplitude and a meter of the audible amplitude.

use crate::app::App;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

/// Height reserved for the control hints at the bottom.
const CONTROLS_HEIGHT: u16 = 2;

/// Width of the audible-amplitude meter in cells.
const METER_WIDTH: usize = 8;

/// Returns a flag indicator: the letter in color when set, a dot otherwise.
#[inline]
fn indicator(set: bool, letter: &'static str, color: Color) -> Span<'static> {
    if set {
        Span::styled(
            letter,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(".", Style::default().fg(Color::DarkGray))
    }
}

/// Builds the meter string for an amplitude in [0, 1].
#[inline]
fn meter(amplitude: f32) -> String {
    let filled = (amplitude * METER_WIDTH as f32).round() as usize;
    let filled = filled.min(METER_WIDTH);
    format!("{}{}", "#".repeat(filled), "-".repeat(METER_WIDTH - filled))
}

/// Renders the harmonic list panel on the left side.
///
/// # Arguments
///
/// * `frame` - The frame to render to
/// * `area` - The area to render in
/// * `app` - Application state
/// * `focused` - Whether this panel is focused
pub fn render_harmonic_list(frame: &mut Frame, area: Rect, app: &App, focused: bool) {
    let block = Block::default()
        .title(format!(" Active ({}) ", app.harmonics().len()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused { Color::Cyan } else { Color::Gray }));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),                  // Harmonic list
            Constraint::Length(CONTROLS_HEIGHT), // Control hints
        ])
        .split(inner);

    let fundamental = app.settings().fundamental_frequency;
    let slots = app.slots();

    let items: Vec<ListItem> = slots
        .iter()
        .filter(|slot| slot.active)
        .map(|slot| {
            let harmonic = &slot.harmonic;
            let name_style = if harmonic.id == app.selected {
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD)
            } else if slot.effective > 0.0 {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Gray)
            };

            ListItem::new(Line::from(vec![
                indicator(harmonic.is_locked, "L", Color::Blue),
                indicator(harmonic.is_muted, "M", Color::Red),
                indicator(harmonic.is_soloed, "S", Color::Yellow),
                Span::raw(" "),
                Span::styled(format!("{:<4}", harmonic.id.to_string()), name_style),
                Span::styled(
                    format!("{:>7.1}Hz ", harmonic.frequency(fundamental)),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{:.2} ", harmonic.amplitude),
                    Style::default().fg(Color::White),
                ),
                Span::styled(meter(slot.effective), Style::default().fg(Color::Green)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .highlight_style(
            Style::default()
                .bg(Color::Rgb(40, 40, 40))
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    // Selection only shows when the cursor is on an active slot
    let mut state = ListState::default();
    state.select(app.harmonics().ids().position(|id| id == app.selected));

    frame.render_stateful_widget(list, chunks[0], &mut state);

    let key_style = Style::default().fg(Color::Yellow);
    let desc_style = Style::default().fg(Color::DarkGray);

    let line1 = Line::from(vec![
        Span::styled("[", desc_style),
        Span::styled("a", key_style),
        Span::styled("]Add ", desc_style),
        Span::styled("[", desc_style),
        Span::styled("x", key_style),
        Span::styled("]Del ", desc_style),
        Span::styled("[", desc_style),
        Span::styled("r", key_style),
        Span::styled("]Rand ", desc_style),
        Span::styled("[", desc_style),
        Span::styled("C", key_style),
        Span::styled("]Clear", desc_style),
    ]);

    let line2 = Line::from(vec![
        Span::styled("[", desc_style),
        Span::styled("l", key_style),
        Span::styled("]Lock ", desc_style),
        Span::styled("[", desc_style),
        Span::styled("m", key_style),
        Span::styled("]Mute ", desc_style),
        Span::styled("[", desc_style),
        Span::styled("s", key_style),
        Span::styled("]Solo", desc_style),
    ]);

    let controls = Paragraph::new(vec![line1, line2]);
    frame.render_widget(controls, chunks[1]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meter() {
        assert_eq!(meter(0.0), "--------");
        assert_eq!(meter(0.5), "####----");
        assert_eq!(meter(1.0), "########");
    }
}
