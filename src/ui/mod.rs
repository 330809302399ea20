//! Terminal user interface components.
//!
//! This module provides the visual components for the synthesizer: the
//! transport bar, the active harmonic list and the amplitude graph, plus
//! the add dialog and help overlays.

mod controls;
mod dialogs;
mod graph;
mod harmonics;
mod help;

use crate::app::{App, FocusedPanel};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::Frame;

pub use controls::render_transport;
pub use dialogs::render_add_dialog;
pub use graph::render_amplitude_graph;
pub use harmonics::render_harmonic_list;
pub use help::render_help;

/// Height of the transport bar including borders.
const TRANSPORT_HEIGHT: u16 = 3;

/// Width of the harmonic list panel.
const LIST_WIDTH: u16 = 40;

/// Renders the main UI layout.
pub fn render(frame: &mut Frame, app: &App) {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(TRANSPORT_HEIGHT),
            Constraint::Min(8),
        ])
        .split(frame.area());

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(LIST_WIDTH), Constraint::Min(34)])
        .split(main_chunks[1]);

    render_transport(frame, main_chunks[0], app);
    render_harmonic_list(
        frame,
        content_chunks[0],
        app,
        app.focused_panel == FocusedPanel::List,
    );
    render_amplitude_graph(
        frame,
        content_chunks[1],
        app,
        app.focused_panel == FocusedPanel::Graph,
    );

    if app.show_help {
        render_help(frame, app.help_scroll);
    }
    render_add_dialog(frame, app);
}

/// Helper function to center a rectangle within another rectangle.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioEngine, SAMPLE_RATE};
    use crate::harmonics::{AudioSettings, HarmonicSet};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn app() -> App {
        App::new(
            AudioEngine::headless(SAMPLE_RATE, 0.75),
            HarmonicSet::default(),
            AudioSettings::default(),
        )
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_centered_rect() {
        let area = Rect::new(0, 0, 100, 50);
        let rect = centered_rect(50, 50, area);
        assert_eq!(rect.x, 25);
        assert_eq!(rect.width, 50);
        assert_eq!(rect.height, 25);
    }

    #[test]
    fn test_render_main_layout() {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        let app = app();
        terminal.draw(|frame| render(frame, &app)).unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("Transport"));
        assert!(text.contains("Active (1)"));
        assert!(text.contains("220.0Hz"));
        assert!(text.contains("STOP"));
    }

    #[test]
    fn test_render_overlays() {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        let mut app = app();
        app.open_add_dialog();
        terminal.draw(|frame| render(frame, &app)).unwrap();
        assert!(screen_text(&terminal).contains("Add Harmonic"));

        app.close_add_dialog();
        app.show_help = true;
        terminal.draw(|frame| render(frame, &app)).unwrap();
        assert!(screen_text(&terminal).contains("Keyboard Shortcuts"));
    }
}
