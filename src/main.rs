//! additui - A terminal-based additive synthesizer.
//!
//! This application builds a sound from up to 32 harmonics of a fundamental
//! frequency, plays it live through the default audio device, and exports it
//! as a 16-bit mono WAV file.
//!
//! # Features
//!
//! - Amplitude graph and list views of all 32 harmonic slots
//! - Mute, solo and lock per harmonic
//! - Click-free live playback using rodio
//! - Offline WAV export with fades and peak normalization
//! - Undo/redo of harmonic edits
//!
//! # Usage
//!
//! ```bash
//! cargo run                                        # Start with the fundamental only
//! cargo run -- --harmonics 1:1.0,2:0.5,3:0.33      # Start from a harmonic list
//! cargo run -- --input tone.json --render out.wav  # Render without the TUI
//! ```
//!
//! Press `?` for help with keyboard shortcuts.

use additui::app::{
    App, FocusedPanel, AMPLITUDE_STEP, DURATION_STEP, FUNDAMENTAL_STEP, VOLUME_STEP,
};
use additui::audio::{export_to_wav, AudioEngine, SAMPLE_RATE};
use additui::harmonics::{
    parse_harmonic_list, AudioSettings, EngineInput, HarmonicId, HarmonicSet,
};
use additui::ui;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Command-line options for the application.
#[derive(Debug, Default)]
struct CliOptions {
    /// Engine input record to start from.
    input: Option<PathBuf>,
    /// Harmonic list (`id:amp,...`), replaces the input's harmonics.
    harmonics: Option<String>,
    fundamental: Option<f64>,
    duration: Option<f64>,
    volume: Option<f64>,
    /// Render to this path and exit instead of starting the TUI.
    render: Option<PathBuf>,
}

/// Prints an argument error and exits.
fn usage_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    eprintln!("Use --help for usage information");
    std::process::exit(1);
}

/// Reads the value following an option.
fn option_value<'a>(args: &'a [String], i: &mut usize, name: &str) -> &'a str {
    *i += 1;
    match args.get(*i) {
        Some(value) => value.as_str(),
        None => usage_error(&format!("{} requires a value", name)),
    }
}

/// Parses a numeric option value.
fn number(value: &str, name: &str) -> f64 {
    match value.parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => usage_error(&format!("{} expects a number, got '{}'", name, value)),
    }
}

impl CliOptions {
    /// Parses command-line arguments.
    ///
    /// Supports:
    /// - `--input <file>` / `-i <file>`: Load an engine input record (JSON)
    /// - `--harmonics <list>` / `-H <list>`: Harmonics as `id:amp,...`
    /// - `--fundamental <hz>`, `--duration <s>`, `--volume <0-1>`
    /// - `--render <path>` / `-r <path>`: Export a WAV file and exit
    /// - `--help` or `-h`: Print help and exit
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let mut options = Self::default();
        let mut i = 1;

        while i < args.len() {
            match args[i].as_str() {
                "--input" | "-i" => {
                    let value = option_value(&args, &mut i, "--input");
                    options.input = Some(PathBuf::from(value));
                }
                "--harmonics" | "-H" => {
                    options.harmonics =
                        Some(option_value(&args, &mut i, "--harmonics").to_string());
                }
                "--fundamental" | "-f" => {
                    let value = option_value(&args, &mut i, "--fundamental");
                    options.fundamental = Some(number(value, "--fundamental"));
                }
                "--duration" | "-d" => {
                    let value = option_value(&args, &mut i, "--duration");
                    options.duration = Some(number(value, "--duration"));
                }
                "--volume" | "-v" => {
                    let value = option_value(&args, &mut i, "--volume");
                    options.volume = Some(number(value, "--volume"));
                }
                "--render" | "-r" => {
                    let value = option_value(&args, &mut i, "--render");
                    options.render = Some(PathBuf::from(value));
                }
                "--help" | "-h" => {
                    eprintln!("additui - Terminal-based additive synthesizer");
                    eprintln!();
                    eprintln!(
                        "Usage: {} [OPTIONS]",
                        args.first().map_or("additui", String::as_str)
                    );
                    eprintln!();
                    eprintln!("Options:");
                    eprintln!("  -i, --input <FILE>        Load harmonics and settings from a JSON record");
                    eprintln!("  -H, --harmonics <LIST>    Harmonics as id:amplitude pairs, e.g. 1:1.0,3:0.5");
                    eprintln!("  -f, --fundamental <HZ>    Fundamental frequency (20-2000, default 220)");
                    eprintln!("  -d, --duration <SECONDS>  Export duration (0.1-10, default 2.0)");
                    eprintln!("  -v, --volume <0-1>        Master volume (default 0.75)");
                    eprintln!("  -r, --render <PATH>       Export a WAV file and exit without the TUI");
                    eprintln!("  -h, --help                Print this help message");
                    eprintln!();
                    eprintln!("Set RUST_LOG=debug to log engine activity to stderr.");
                    std::process::exit(0);
                }
                other => usage_error(&format!("Unknown option: {}", other)),
            }
            i += 1;
        }

        options
    }

    /// Builds the starting harmonic set and settings.
    fn engine_input(&self) -> Result<EngineInput> {
        let mut input = match &self.input {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                EngineInput::from_json(&json)
                    .with_context(|| format!("Failed to load {}", path.display()))?
            }
            None => EngineInput {
                harmonics: HarmonicSet::default(),
                settings: AudioSettings::default(),
            },
        };

        if let Some(list) = &self.harmonics {
            input.harmonics = parse_harmonic_list(list).context("Invalid --harmonics list")?;
        }
        if let Some(hz) = self.fundamental {
            input.settings.set_fundamental_frequency(hz);
        }
        if let Some(seconds) = self.duration {
            input.settings.set_duration(seconds);
        }
        if let Some(volume) = self.volume {
            input.settings.set_master_volume(volume);
        }
        Ok(input)
    }
}

/// Main entry point.
fn main() -> Result<()> {
    // Parse CLI options first (before any terminal setup)
    let cli = CliOptions::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let input = cli.engine_input()?;

    if let Some(path) = &cli.render {
        return render_headless(&input, path);
    }

    let audio = match AudioEngine::new(input.settings.master_volume) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::warn!("Audio output unavailable: {:#}", e);
            AudioEngine::headless(SAMPLE_RATE, input.settings.master_volume)
        }
    };

    let mut app = App::new(audio, input.harmonics, input.settings);
    if !app.audio.has_output() {
        app.set_status("No audio device: playback is silent, export still works");
    }

    let mut terminal = setup_terminal().context("Failed to setup terminal")?;

    // Run main loop
    let result = run_app(&mut terminal, &mut app);

    restore_terminal(&mut terminal).context("Failed to restore terminal")?;

    // Fade out and close the device before the process exits
    app.audio.dispose();

    result
}

/// Exports the input without opening a terminal UI.
fn render_headless(input: &EngineInput, path: &Path) -> Result<()> {
    let bytes = export_to_wav(&input.harmonics, &input.settings, SAMPLE_RATE, false, path)
        .with_context(|| format!("Failed to render {}", path.display()))?;
    eprintln!(
        "Rendered {:.1} s from {} harmonics to {} ({} bytes)",
        input.settings.duration,
        input.harmonics.len(),
        path.display(),
        bytes
    );
    Ok(())
}

/// Sets up the terminal for TUI rendering.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;
    Ok(terminal)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

/// Main application loop.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.clear_expired_status();

        terminal.draw(|frame| ui::render(frame, app))?;

        // Short timeout so expired status messages disappear promptly
        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key) = event::read()? {
                // Only handle key press events (not release)
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                if app.show_help {
                    handle_help_key(app, key.code);
                    continue;
                }

                if app.add_dialog.open {
                    handle_add_dialog_key(app, key.code);
                    continue;
                }

                if handle_key(app, key.code, key.modifiers)? {
                    return Ok(());
                }
            }
        }
    }
}

/// Handles keys while the help overlay is visible.
fn handle_help_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('?') | KeyCode::Esc => {
            app.show_help = false;
            app.help_scroll = 0;
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.help_scroll = app.help_scroll.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.help_scroll = app.help_scroll.saturating_add(1);
        }
        KeyCode::PageUp => {
            app.help_scroll = app.help_scroll.saturating_sub(10);
        }
        KeyCode::PageDown => {
            app.help_scroll = app.help_scroll.saturating_add(10);
        }
        KeyCode::Home => {
            app.help_scroll = 0;
        }
        _ => {}
    }
}

/// Handles keys while the add dialog is open.
fn handle_add_dialog_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Enter => app.confirm_add_dialog(),
        KeyCode::Esc => app.close_add_dialog(),
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            app.add_dialog_switch_field();
        }
        KeyCode::Backspace => app.add_dialog_backspace(),
        KeyCode::Char(c) => app.add_dialog_input(c),
        _ => {}
    }
}

/// Handles a key press in the main view.
///
/// # Returns
///
/// true if the app should quit
fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
    let ctrl = modifiers.contains(KeyModifiers::CONTROL);

    match code {
        // Quit
        KeyCode::Char('c') if ctrl => return Ok(true),
        KeyCode::Char('q') | KeyCode::Esc => return Ok(true),

        // Undo/Redo
        KeyCode::Char('z') if ctrl => {
            app.undo();
        }
        KeyCode::Char('r') | KeyCode::Char('y') if ctrl => {
            app.redo();
        }
        KeyCode::Char('u') => {
            app.undo();
        }

        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Tab => app.focused_panel = app.focused_panel.next(),

        // Transport and export
        KeyCode::Char(' ') => app.toggle_playback(),
        KeyCode::Char('e') => {
            // Failures are already on the status line
            let _ = app.export();
        }

        // Harmonic edits
        KeyCode::Char('a') => app.open_add_dialog(),
        KeyCode::Char('x') | KeyCode::Delete => app.remove_selected(),
        KeyCode::Char('m') => app.toggle_mute(),
        KeyCode::Char('s') => app.toggle_solo(),
        KeyCode::Char('l') => app.toggle_lock(),
        KeyCode::Char('r') => app.randomize(),
        KeyCode::Char('C') => app.clear_unlocked(),
        KeyCode::Char(c @ '0'..='9') => {
            let amplitude = match c.to_digit(10) {
                Some(0) | None => 1.0,
                Some(n) => n as f32 / 10.0,
            };
            app.set_selected_amplitude(amplitude);
        }

        // Settings
        KeyCode::Char('f') => app.adjust_fundamental(-FUNDAMENTAL_STEP),
        KeyCode::Char('F') => app.adjust_fundamental(FUNDAMENTAL_STEP),
        KeyCode::Char('d') => app.adjust_duration(-DURATION_STEP),
        KeyCode::Char('D') => app.adjust_duration(DURATION_STEP),
        KeyCode::Char('v') => app.adjust_volume(-VOLUME_STEP),
        KeyCode::Char('V') => app.adjust_volume(VOLUME_STEP),

        // Panel-specific navigation
        _ => match app.focused_panel {
            FocusedPanel::Graph => handle_graph_key(app, code),
            FocusedPanel::List => handle_list_key(app, code),
        },
    }

    Ok(false)
}

/// Navigation keys on the amplitude graph.
fn handle_graph_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Left => app.select_prev_slot(),
        KeyCode::Right => app.select_next_slot(),
        KeyCode::Up | KeyCode::Char('k') => {
            app.adjust_selected_amplitude(AMPLITUDE_STEP);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.adjust_selected_amplitude(-AMPLITUDE_STEP);
        }
        KeyCode::Home => app.selected = HarmonicId::FUNDAMENTAL,
        KeyCode::End => {
            if let Some(last) = HarmonicId::all().last() {
                app.selected = last;
            }
        }
        _ => {}
    }
}

/// Navigation keys on the harmonic list.
fn handle_list_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Up | KeyCode::Char('k') => app.select_prev_active(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next_active(),
        KeyCode::Left => {
            app.adjust_selected_amplitude(-AMPLITUDE_STEP);
        }
        KeyCode::Right => {
            app.adjust_selected_amplitude(AMPLITUDE_STEP);
        }
        _ => {}
    }
}
