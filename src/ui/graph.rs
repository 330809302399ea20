//! Amplitude graph rendering.
//!
//! Draws one vertical bar per harmonic slot. The bar height is the effective
//! (audible) amplitude; when mute or solo suppresses part of a harmonic, the
//! configured level is drawn faded behind it.

use crate::app::App;
use crate::harmonics::{SlotView, MAX_HARMONICS};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

/// Rows below the bars: slot numbers and the cursor marker.
const LABEL_ROWS: u16 = 2;

/// Partial block glyphs, indexed by eighths of a cell.
const EIGHTHS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Bar color for a slot.
#[inline]
fn bar_color(slot: &SlotView, selected: bool) -> Color {
    if selected {
        Color::Cyan
    } else if slot.harmonic.is_muted {
        Color::Red
    } else if slot.harmonic.is_soloed {
        Color::Yellow
    } else if slot.harmonic.is_locked {
        Color::Blue
    } else {
        Color::Green
    }
}

/// Glyph for the cell `row` cells above the floor of a bar `value` tall.
#[inline]
fn cell_glyph(value: f32, row: u16, height: u16) -> char {
    let fill = (value * height as f32 - row as f32).clamp(0.0, 1.0);
    EIGHTHS[(fill * 8.0).round() as usize]
}

/// Renders the amplitude graph panel.
///
/// # Arguments
///
/// * `frame` - The frame to render to
/// * `area` - The area to render in
/// * `app` - Application state
/// * `focused` - Whether this panel is focused
pub fn render_amplitude_graph(frame: &mut Frame, area: Rect, app: &App, focused: bool) {
    let block = Block::default()
        .title(" Harmonics ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused { Color::Cyan } else { Color::Gray }));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height <= LABEL_ROWS || inner.width == 0 {
        return;
    }

    let slots = app.slots();
    let bar_height = inner.height - LABEL_ROWS;
    let column_width = (inner.width / MAX_HARMONICS as u16).max(1) as usize;
    let bar_width = if column_width > 2 {
        column_width - 1
    } else {
        column_width
    };
    let gap = " ".repeat(column_width - bar_width);

    let mut lines: Vec<Line> = Vec::with_capacity(inner.height as usize);

    for line_index in 0..bar_height {
        let row = bar_height - 1 - line_index;
        let mut spans: Vec<Span> = Vec::with_capacity(slots.len() * 2);

        for slot in &slots {
            let selected = slot.harmonic.id == app.selected;
            let effective = cell_glyph(slot.effective, row, bar_height);
            let span = if effective != ' ' {
                Span::styled(
                    effective.to_string().repeat(bar_width),
                    Style::default().fg(bar_color(slot, selected)),
                )
            } else if slot.active {
                // Suppressed by mute/solo: show the configured level faded
                let configured = cell_glyph(slot.harmonic.amplitude, row, bar_height);
                Span::styled(
                    configured.to_string().repeat(bar_width),
                    Style::default().fg(Color::DarkGray),
                )
            } else if selected && row == 0 {
                Span::styled("_".repeat(bar_width), Style::default().fg(Color::Cyan))
            } else {
                Span::raw(" ".repeat(bar_width))
            };
            spans.push(span);
            if !gap.is_empty() {
                spans.push(Span::raw(gap.clone()));
            }
        }
        lines.push(Line::from(spans));
    }

    // Slot numbers, right-aligned under each bar
    let label_spans: Vec<Span> = slots
        .iter()
        .map(|slot| {
            let number = slot.harmonic.id.get().to_string();
            let label = if number.len() > column_width {
                number[number.len() - column_width..].to_string()
            } else {
                format!("{:>width$}", number, width = bar_width)
                    + &" ".repeat(column_width - bar_width)
            };
            let style = if slot.harmonic.id == app.selected {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else if slot.active {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Span::styled(label, style)
        })
        .collect();
    lines.push(Line::from(label_spans));

    // Cursor marker under the selected slot
    let offset = (app.selected.get() as usize - 1) * column_width;
    let selected = app.harmonics().get(app.selected);
    lines.push(Line::from(vec![
        Span::raw(" ".repeat(offset)),
        Span::styled(
            format!("^ {} {:.2}", app.selected, selected.amplitude),
            Style::default().fg(Color::Cyan),
        ),
    ]));

    frame.render_widget(Paragraph::new(lines), inner);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_glyph_fills_from_the_floor() {
        // Half height over four rows: two full cells, then empty
        assert_eq!(cell_glyph(0.5, 0, 4), '█');
        assert_eq!(cell_glyph(0.5, 1, 4), '█');
        assert_eq!(cell_glyph(0.5, 2, 4), ' ');
        assert_eq!(cell_glyph(0.5, 3, 4), ' ');
    }

    #[test]
    fn test_cell_glyph_partial_cell() {
        assert_eq!(cell_glyph(0.125, 0, 2), '▂');
        assert_eq!(cell_glyph(0.0, 0, 2), ' ');
        assert_eq!(cell_glyph(1.0, 1, 2), '█');
    }
}
