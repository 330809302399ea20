//! Help overlay rendering.
//!
//! Displays keyboard shortcuts in a modal overlay.

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use super::centered_rect;

/// Key binding entry for the help display.
struct KeyBinding {
    key: &'static str,
    description: &'static str,
}

const GENERAL_BINDINGS: &[KeyBinding] = &[
    KeyBinding {
        key: "?",
        description: "Toggle this help",
    },
    KeyBinding {
        key: "q / Esc",
        description: "Quit",
    },
    KeyBinding {
        key: "Ctrl+C",
        description: "Force quit",
    },
    KeyBinding {
        key: "Tab",
        description: "Switch between graph and list",
    },
    KeyBinding {
        key: "Space",
        description: "Play / Stop",
    },
    KeyBinding {
        key: "e",
        description: "Export WAV (playback must be stopped)",
    },
    KeyBinding {
        key: "u / Ctrl+Z",
        description: "Undo",
    },
    KeyBinding {
        key: "Ctrl+R / Ctrl+Y",
        description: "Redo",
    },
];

const GRAPH_BINDINGS: &[KeyBinding] = &[
    KeyBinding {
        key: "Left / Right",
        description: "Select slot",
    },
    KeyBinding {
        key: "Up / Down",
        description: "Raise / lower amplitude",
    },
    KeyBinding {
        key: "0-9",
        description: "Set amplitude (1-9 = 10-90%, 0 = 100%)",
    },
    KeyBinding {
        key: "Home / End",
        description: "First / last slot",
    },
];

const LIST_BINDINGS: &[KeyBinding] = &[
    KeyBinding {
        key: "Up / Down",
        description: "Select active harmonic",
    },
    KeyBinding {
        key: "Left / Right",
        description: "Lower / raise amplitude",
    },
];

const HARMONIC_BINDINGS: &[KeyBinding] = &[
    KeyBinding {
        key: "a",
        description: "Add harmonic",
    },
    KeyBinding {
        key: "x / Delete",
        description: "Remove selected harmonic",
    },
    KeyBinding {
        key: "m",
        description: "Toggle mute",
    },
    KeyBinding {
        key: "s",
        description: "Toggle solo",
    },
    KeyBinding {
        key: "l",
        description: "Toggle lock (blocks amplitude changes)",
    },
    KeyBinding {
        key: "r",
        description: "Randomize unlocked harmonics",
    },
    KeyBinding {
        key: "C",
        description: "Clear unlocked harmonics",
    },
];

const SETTINGS_BINDINGS: &[KeyBinding] = &[
    KeyBinding {
        key: "f / F",
        description: "Fundamental down / up",
    },
    KeyBinding {
        key: "d / D",
        description: "Export duration down / up",
    },
    KeyBinding {
        key: "v / V",
        description: "Master volume down / up",
    },
];

/// Renders the help overlay.
///
/// # Arguments
///
/// * `frame` - The frame to render to
/// * `scroll` - Vertical scroll offset
pub fn render_help(frame: &mut Frame, scroll: u16) {
    let area = centered_rect(60, 80, frame.area());

    // Clear the area behind the popup
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Help - Keyboard Shortcuts ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // Scrollable content
            Constraint::Length(1), // Fixed footer
        ])
        .split(inner);

    let section_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    let key_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(Color::White);

    let sections: [(&'static str, &[KeyBinding]); 5] = [
        ("General", GENERAL_BINDINGS),
        ("Graph", GRAPH_BINDINGS),
        ("List", LIST_BINDINGS),
        ("Harmonics", HARMONIC_BINDINGS),
        ("Settings", SETTINGS_BINDINGS),
    ];

    let mut lines: Vec<Line<'static>> = Vec::new();
    for (title, bindings) in sections {
        lines.push(Line::from(Span::styled(title, section_style)));
        for binding in bindings {
            lines.push(Line::from(vec![
                Span::styled(format!("{:17}", binding.key), key_style),
                Span::styled(binding.description, desc_style),
            ]));
        }
        lines.push(Line::from(""));
    }

    let help_text = Paragraph::new(lines).scroll((scroll, 0));
    frame.render_widget(help_text, chunks[0]);

    let footer = Paragraph::new(Line::from(Span::styled(
        "Scroll: Up/Down/j/k  |  Close: ?/Esc",
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )));
    frame.render_widget(footer, chunks[1]);
}
