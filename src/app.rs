//! Application state and event handling.
//!
//! This module defines the editor state that coordinates between the
//! harmonic set, the audio engine, and the TUI interface.

use crate::audio::{export_to_wav, AudioEngine, DEFAULT_EXPORT_FILENAME};
use crate::error::{self, SynthError};
use crate::harmonics::{display_slots, AudioSettings, HarmonicId, HarmonicSet, SlotView};
use crate::history::{HistoryManager, StateSnapshot};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// How long a status message stays on screen.
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// Amplitude change for one arrow key press.
pub const AMPLITUDE_STEP: f32 = 0.05;

/// Fundamental change for one `f`/`F` press, in Hz.
pub const FUNDAMENTAL_STEP: f64 = 5.0;

/// Duration change for one `d`/`D` press, in seconds.
pub const DURATION_STEP: f64 = 0.1;

/// Master volume change for one `v`/`V` press.
pub const VOLUME_STEP: f64 = 0.05;

/// Amplitude pre-filled in the add dialog.
const DEFAULT_NEW_AMPLITUDE: &str = "0.5";

/// Which panel currently has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusedPanel {
    /// The 32-slot amplitude graph: Left/Right picks a slot, Up/Down sets its level.
    #[default]
    Graph,
    /// The list of active harmonics: Up/Down moves between entries,
    /// Left/Right sets the level.
    List,
}

impl FocusedPanel {
    /// Cycles to the next panel.
    pub fn next(self) -> Self {
        match self {
            FocusedPanel::Graph => FocusedPanel::List,
            FocusedPanel::List => FocusedPanel::Graph,
        }
    }
}

/// Input field of the add dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddField {
    #[default]
    Id,
    Amplitude,
}

/// State for the add-harmonic dialog.
#[derive(Debug, Clone, Default)]
pub struct AddDialogState {
    /// Whether the dialog is open.
    pub open: bool,
    /// Harmonic number being typed.
    pub id_input: String,
    /// Amplitude being typed.
    pub amplitude_input: String,
    /// Field receiving keystrokes.
    pub field: AddField,
    /// Validation message from the last confirm attempt.
    pub error: Option<String>,
}

impl AddDialogState {
    fn focused_input(&mut self) -> &mut String {
        match self.field {
            AddField::Id => &mut self.id_input,
            AddField::Amplitude => &mut self.amplitude_input,
        }
    }

    /// Parses both fields.
    fn parse(&self) -> error::Result<(HarmonicId, f32)> {
        let id = self
            .id_input
            .trim()
            .parse::<u8>()
            .map_err(|_| SynthError::invalid("harmonic number must be 1-32"))
            .and_then(HarmonicId::new)?;
        let amplitude = self
            .amplitude_input
            .trim()
            .parse::<f32>()
            .map_err(|_| SynthError::invalid("amplitude must be a number between 0 and 1"))?;
        if !(0.0..=1.0).contains(&amplitude) {
            return Err(SynthError::invalid("amplitude must be a number between 0 and 1"));
        }
        Ok((id, amplitude))
    }
}

/// Main application state.
pub struct App {
    /// The harmonics being edited.
    harmonics: HarmonicSet,
    /// Global synthesis settings.
    settings: AudioSettings,
    /// Real-time engine.
    pub audio: AudioEngine,
    /// Undo/redo history of harmonic edits.
    history: HistoryManager,
    /// Slot under the cursor.
    pub selected: HarmonicId,
    /// Which panel has keyboard focus.
    pub focused_panel: FocusedPanel,
    /// Status message with the time it was set.
    pub status_message: Option<(String, Instant)>,
    /// Add-harmonic dialog.
    pub add_dialog: AddDialogState,
    /// Whether the help overlay is shown.
    pub show_help: bool,
    /// Scroll offset inside the help overlay.
    pub help_scroll: u16,
    /// Where `export` writes the WAV file.
    pub export_path: PathBuf,
    rng: StdRng,
}

impl App {
    /// Creates the editor around an engine.
    ///
    /// # Arguments
    ///
    /// * `audio` - Engine to drive (device-backed or headless)
    /// * `harmonics` - Initial harmonic set
    /// * `settings` - Initial settings
    pub fn new(audio: AudioEngine, harmonics: HarmonicSet, settings: AudioSettings) -> Self {
        let selected = harmonics.ids().next().unwrap_or(HarmonicId::FUNDAMENTAL);
        let app = Self {
            harmonics,
            settings,
            audio,
            history: HistoryManager::new(),
            selected,
            focused_panel: FocusedPanel::default(),
            status_message: None,
            add_dialog: AddDialogState::default(),
            show_help: false,
            help_scroll: 0,
            export_path: PathBuf::from(DEFAULT_EXPORT_FILENAME),
            rng: StdRng::from_entropy(),
        };
        app.audio.set_master_volume(app.settings.master_volume);
        app
    }

    /// Replaces the random source, e.g. with a seeded one.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn harmonics(&self) -> &HarmonicSet {
        &self.harmonics
    }

    pub fn settings(&self) -> &AudioSettings {
        &self.settings
    }

    /// All 32 slots resolved for the graph.
    pub fn slots(&self) -> Vec<SlotView> {
        display_slots(&self.harmonics)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Sets a status message to display.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    /// Clears expired status messages.
    pub fn clear_expired_status(&mut self) {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
            }
        }
    }

    // ==================== Selection ====================

    /// Moves the cursor one slot right on the graph.
    pub fn select_next_slot(&mut self) {
        if let Some(next) = self.selected.next() {
            self.selected = next;
        }
    }

    /// Moves the cursor one slot left on the graph.
    pub fn select_prev_slot(&mut self) {
        if let Some(prev) = self.selected.prev() {
            self.selected = prev;
        }
    }

    /// Moves to the next active harmonic, wrapping to the first.
    pub fn select_next_active(&mut self) {
        let next = self
            .harmonics
            .ids()
            .find(|&id| id > self.selected)
            .or_else(|| self.harmonics.ids().next());
        if let Some(id) = next {
            self.selected = id;
        }
    }

    /// Moves to the previous active harmonic, wrapping to the last.
    pub fn select_prev_active(&mut self) {
        let prev = self
            .harmonics
            .ids()
            .filter(|&id| id < self.selected)
            .last()
            .or_else(|| self.harmonics.ids().last());
        if let Some(id) = prev {
            self.selected = id;
        }
    }

    // ==================== Harmonic edits ====================

    /// Applies an edit to the harmonic set.
    ///
    /// The undo snapshot is taken before the edit runs and only recorded
    /// when the edit succeeded and changed something; the live graph is then
    /// reconciled.
    fn apply_edit(
        &mut self,
        description: &str,
        edit: impl FnOnce(&mut HarmonicSet) -> error::Result<bool>,
    ) -> error::Result<bool> {
        let snapshot = StateSnapshot::new(&self.harmonics, self.selected, description);
        let changed = edit(&mut self.harmonics)?;
        if changed {
            self.history.push_undo(snapshot);
            self.sync_audio();
        }
        Ok(changed)
    }

    /// Reports an edit error on the status line.
    fn report(&mut self, result: error::Result<bool>) -> bool {
        match result {
            Ok(changed) => changed,
            Err(e) => {
                tracing::debug!("Edit refused: {}", e);
                self.set_status(e.to_string());
                false
            }
        }
    }

    /// Sets the selected slot's amplitude.
    ///
    /// Inactive slots become active once the level passes the activation
    /// threshold. Locked harmonics refuse the write.
    pub fn set_selected_amplitude(&mut self, amplitude: f32) -> bool {
        let id = self.selected;
        let result = self.apply_edit("Set amplitude", |set| set.set_amplitude(id, amplitude));
        self.report(result)
    }

    /// Nudges the selected slot's amplitude.
    ///
    /// # Arguments
    ///
    /// * `delta` - Change in linear amplitude (clamped into [0, 1])
    pub fn adjust_selected_amplitude(&mut self, delta: f32) -> bool {
        let current = self.harmonics.get(self.selected).amplitude;
        let changed = self.set_selected_amplitude(current + delta);
        if changed {
            let amplitude = self.harmonics.get(self.selected).amplitude;
            self.set_status(format!("{}: {:.2}", self.selected, amplitude));
        }
        changed
    }

    /// Toggles mute on the selected harmonic.
    pub fn toggle_mute(&mut self) {
        let id = self.selected;
        let result = self.apply_edit("Toggle mute", |set| Ok(set.toggle_mute(id)));
        if self.report(result) {
            let state = if self.harmonics.get(id).is_muted { "muted" } else { "unmuted" };
            self.set_status(format!("{} {}", id, state));
        }
    }

    /// Toggles solo on the selected harmonic.
    pub fn toggle_solo(&mut self) {
        let id = self.selected;
        let result = self.apply_edit("Toggle solo", |set| Ok(set.toggle_solo(id)));
        if self.report(result) {
            let state = if self.harmonics.get(id).is_soloed { "soloed" } else { "unsoloed" };
            self.set_status(format!("{} {}", id, state));
        }
    }

    /// Toggles the lock on the selected harmonic.
    pub fn toggle_lock(&mut self) {
        let id = self.selected;
        let result = self.apply_edit("Toggle lock", |set| Ok(set.toggle_lock(id)));
        if self.report(result) {
            let state = if self.harmonics.get(id).is_locked { "locked" } else { "unlocked" };
            self.set_status(format!("{} {}", id, state));
        }
    }

    /// Removes the selected harmonic from the active set.
    pub fn remove_selected(&mut self) {
        let id = self.selected;
        let result = self.apply_edit("Remove harmonic", |set| Ok(set.remove(id).is_some()));
        if self.report(result) {
            self.set_status(format!("Removed {}", id));
        }
    }

    /// Randomizes every unlocked slot.
    pub fn randomize(&mut self) {
        let snapshot = StateSnapshot::new(&self.harmonics, self.selected, "Randomize");
        self.harmonics.randomize(&mut self.rng);
        self.history.push_undo(snapshot);
        self.sync_audio();
        self.set_status(format!("Randomized: {} harmonics active", self.harmonics.len()));
    }

    /// Removes every unlocked harmonic.
    pub fn clear_unlocked(&mut self) {
        let mut removed = 0;
        let result = self.apply_edit("Clear harmonics", |set| {
            removed = set.clear_unlocked();
            Ok(removed > 0)
        });
        if self.report(result) {
            self.set_status(format!("Cleared {} harmonics", removed));
        }
    }

    // ==================== Add dialog ====================

    /// Opens the add dialog, pre-filled with the first free slot.
    pub fn open_add_dialog(&mut self) {
        let free = HarmonicId::all().find(|&id| !self.harmonics.is_active(id));
        let Some(id) = free else {
            self.set_status("All 32 harmonics are already active");
            return;
        };
        self.add_dialog = AddDialogState {
            open: true,
            id_input: id.get().to_string(),
            amplitude_input: DEFAULT_NEW_AMPLITUDE.to_string(),
            field: AddField::Id,
            error: None,
        };
    }

    pub fn close_add_dialog(&mut self) {
        self.add_dialog = AddDialogState::default();
    }

    /// Moves keystrokes to the other dialog field.
    pub fn add_dialog_switch_field(&mut self) {
        self.add_dialog.field = match self.add_dialog.field {
            AddField::Id => AddField::Amplitude,
            AddField::Amplitude => AddField::Id,
        };
    }

    /// Types a character into the focused dialog field.
    pub fn add_dialog_input(&mut self, c: char) {
        let accepted = match self.add_dialog.field {
            AddField::Id => c.is_ascii_digit(),
            AddField::Amplitude => c.is_ascii_digit() || c == '.',
        };
        if accepted {
            self.add_dialog.focused_input().push(c);
            self.add_dialog.error = None;
        }
    }

    pub fn add_dialog_backspace(&mut self) {
        self.add_dialog.focused_input().pop();
        self.add_dialog.error = None;
    }

    /// Validates the dialog and adds the harmonic.
    ///
    /// Invalid input keeps the dialog open with the error shown inside it.
    pub fn confirm_add_dialog(&mut self) {
        let result = self.add_dialog.parse().and_then(|(id, amplitude)| {
            self.apply_edit("Add harmonic", |set| set.add(id, amplitude).map(|()| true))
                .map(|_| id)
        });
        match result {
            Ok(id) => {
                self.selected = id;
                self.close_add_dialog();
                self.set_status(format!("Added {}", id));
            }
            Err(e) => self.add_dialog.error = Some(e.to_string()),
        }
    }

    // ==================== History ====================

    /// Undoes the last harmonic edit.
    ///
    /// # Returns
    ///
    /// true if undo was successful, false if nothing to undo
    pub fn undo(&mut self) -> bool {
        let Some(prev_state) = self.history.pop_undo() else {
            self.set_status("Nothing to undo");
            return false;
        };
        let current = StateSnapshot::new(
            &self.harmonics,
            self.selected,
            prev_state.description.clone(),
        );
        self.history.push_redo(current);
        self.set_status(format!("Undo: {}", prev_state.description));
        self.restore(prev_state);
        true
    }

    /// Redoes the last undone edit.
    ///
    /// # Returns
    ///
    /// true if redo was successful, false if nothing to redo
    pub fn redo(&mut self) -> bool {
        let Some(next_state) = self.history.pop_redo() else {
            self.set_status("Nothing to redo");
            return false;
        };
        let current = StateSnapshot::new(
            &self.harmonics,
            self.selected,
            next_state.description.clone(),
        );
        self.history.push_undo_preserve_redo(current);
        self.set_status(format!("Redo: {}", next_state.description));
        self.restore(next_state);
        true
    }

    fn restore(&mut self, snapshot: StateSnapshot) {
        self.harmonics = snapshot.harmonics;
        self.selected = snapshot.selected;
        self.sync_audio();
    }

    // ==================== Settings ====================

    /// Nudges the fundamental; live oscillators glide to the new pitch.
    pub fn adjust_fundamental(&mut self, delta: f64) {
        self.settings
            .set_fundamental_frequency(self.settings.fundamental_frequency + delta);
        self.audio
            .set_fundamental_frequency(self.settings.fundamental_frequency);
        self.set_status(format!(
            "Fundamental: {:.0} Hz",
            self.settings.fundamental_frequency
        ));
    }

    /// Nudges the export duration.
    pub fn adjust_duration(&mut self, delta: f64) {
        self.settings.set_duration(self.settings.duration + delta);
        self.set_status(format!("Duration: {:.1} s", self.settings.duration));
    }

    /// Nudges the master volume.
    pub fn adjust_volume(&mut self, delta: f64) {
        self.settings
            .set_master_volume(self.settings.master_volume + delta);
        self.audio.set_master_volume(self.settings.master_volume);
        self.set_status(format!(
            "Volume: {:.0}%",
            self.settings.master_volume * 100.0
        ));
    }

    // ==================== Audio ====================

    /// Starts or stops live playback.
    pub fn toggle_playback(&mut self) {
        if self.audio.is_playing() {
            self.audio.stop();
            self.set_status("Stopped");
            return;
        }
        match self.audio.start(&self.harmonics, &self.settings) {
            Ok(()) => self.set_status("Playing"),
            Err(e) => self.set_status(e.to_string()),
        }
    }

    /// Pushes the current harmonic set to the live graph.
    ///
    /// Playback stops by itself once the last harmonic is gone.
    pub fn sync_audio(&mut self) {
        self.audio.reconcile(&self.harmonics, &self.settings);
        if self.audio.is_playing() && self.harmonics.is_empty() {
            self.audio.stop();
        }
    }

    /// Renders the set and writes it to `export_path`.
    ///
    /// Failures (playback running, nothing audible, I/O) go to the status line.
    pub fn export(&mut self) -> error::Result<usize> {
        let result = export_to_wav(
            &self.harmonics,
            &self.settings,
            self.audio.sample_rate(),
            self.audio.is_playing(),
            &self.export_path,
        );
        match &result {
            Ok(bytes) => {
                let message = format!(
                    "Exported {} ({} KB)",
                    self.export_path.display(),
                    bytes / 1024
                );
                self.set_status(message);
            }
            Err(SynthError::Io(e)) => {
                tracing::error!("Export failed: {}", e);
                self.set_status(format!("Export failed: {}", e));
            }
            Err(e) => self.set_status(e.to_string()),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SAMPLE_RATE;
    use tempfile::tempdir;

    fn id(n: u8) -> HarmonicId {
        HarmonicId::new(n).unwrap()
    }

    fn app() -> App {
        let audio = AudioEngine::headless(SAMPLE_RATE, 0.75);
        App::new(audio, HarmonicSet::default(), AudioSettings::default())
            .with_rng(StdRng::seed_from_u64(7))
    }

    fn status(app: &App) -> &str {
        app.status_message
            .as_ref()
            .map(|(m, _)| m.as_str())
            .unwrap_or("")
    }

    #[test]
    fn test_adjust_amplitude_activates_inactive_slot() {
        let mut app = app();
        app.selected = id(4);
        assert!(app.adjust_selected_amplitude(AMPLITUDE_STEP));
        assert!(app.harmonics().is_active(id(4)));
        assert!(app.can_undo());
    }

    #[test]
    fn test_locked_amplitude_is_refused() {
        let mut app = app();
        app.toggle_lock();
        assert!(!app.adjust_selected_amplitude(-AMPLITUDE_STEP));
        assert_eq!(app.harmonics().get(id(1)).amplitude, 1.0);
        assert_eq!(status(&app), "Harmonic 1 is locked");
    }

    #[test]
    fn test_noop_edit_does_not_record_history() {
        let mut app = app();
        // Already at full amplitude; raising it changes nothing.
        assert!(!app.adjust_selected_amplitude(AMPLITUDE_STEP));
        assert!(!app.can_undo());
    }

    #[test]
    fn test_undo_redo_restores_set_and_selection() {
        let mut app = app();
        app.selected = id(3);
        app.set_selected_amplitude(0.4);
        app.selected = id(1);
        app.remove_selected();
        assert!(app.harmonics().get_active(id(1)).is_none());

        assert!(app.undo());
        assert!(app.harmonics().is_active(id(1)));
        assert_eq!(app.selected, id(1));
        assert!(app.undo());
        assert!(!app.harmonics().is_active(id(3)));
        assert_eq!(app.selected, id(3));
        assert!(!app.undo());

        assert!(app.redo());
        assert_eq!(app.harmonics().get(id(3)).amplitude, 0.4);
        assert!(app.can_redo());
    }

    #[test]
    fn test_play_with_empty_set_reports() {
        let mut app = app();
        app.remove_selected();
        app.toggle_playback();
        assert!(!app.audio.is_playing());
        assert_eq!(status(&app), SynthError::EmptyActiveSet.to_string());
    }

    #[test]
    fn test_removing_last_harmonic_stops_playback() {
        let mut app = app();
        app.toggle_playback();
        assert!(app.audio.is_playing());
        app.remove_selected();
        assert!(!app.audio.is_playing());
    }

    #[test]
    fn test_add_dialog_flow() {
        let mut app = app();
        app.open_add_dialog();
        assert!(app.add_dialog.open);
        assert_eq!(app.add_dialog.id_input, "2");

        app.add_dialog_backspace();
        app.add_dialog_input('5');
        app.add_dialog_input('x');
        app.add_dialog_switch_field();
        app.add_dialog_backspace();
        app.add_dialog_backspace();
        app.add_dialog_backspace();
        app.add_dialog_input('0');
        app.add_dialog_input('.');
        app.add_dialog_input('3');
        app.confirm_add_dialog();

        assert!(!app.add_dialog.open);
        assert_eq!(app.selected, id(5));
        assert!((app.harmonics().get(id(5)).amplitude - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_add_dialog_rejects_duplicate_and_range() {
        let mut app = app();
        app.open_add_dialog();
        app.add_dialog.id_input = "1".to_string();
        app.confirm_add_dialog();
        assert!(app.add_dialog.open);
        assert_eq!(app.add_dialog.error.as_deref(), Some("Harmonic 1 already exists"));

        app.add_dialog.id_input = "33".to_string();
        app.confirm_add_dialog();
        assert!(app.add_dialog.error.is_some());
        assert_eq!(app.harmonics().len(), 1);
        assert!(!app.can_undo());
    }

    #[test]
    fn test_randomize_keeps_locked_and_can_be_undone() {
        let mut app = app();
        app.set_selected_amplitude(0.42);
        app.toggle_lock();
        app.randomize();
        let h1 = app.harmonics().get(id(1));
        assert!(h1.is_locked);
        assert_eq!(h1.amplitude, 0.42);

        app.undo();
        assert!(app.harmonics().get(id(1)).is_locked);
        assert_eq!(app.harmonics().len(), 1);
    }

    #[test]
    fn test_clear_keeps_locked() {
        let mut app = app();
        app.selected = id(2);
        app.set_selected_amplitude(0.5);
        app.toggle_lock();
        app.selected = id(3);
        app.set_selected_amplitude(0.5);
        app.clear_unlocked();
        let ids: Vec<u8> = app.harmonics().ids().map(HarmonicId::get).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_settings_clamp_and_reach_engine() {
        let mut app = app();
        for _ in 0..40 {
            app.adjust_volume(VOLUME_STEP);
        }
        assert_eq!(app.settings().master_volume, 1.0);
        let target = app.audio.with_graph(|g| g.master().target()).unwrap();
        assert_eq!(target, 1.0);

        app.adjust_fundamental(-1000.0);
        assert_eq!(app.settings().fundamental_frequency, 20.0);
        app.adjust_duration(-DURATION_STEP * 100.0);
        assert_eq!(app.settings().duration, 0.1);
    }

    #[test]
    fn test_export_refused_while_playing() {
        let dir = tempdir().unwrap();
        let mut app = app();
        app.export_path = dir.path().join("out.wav");
        app.toggle_playback();
        assert!(matches!(
            app.export(),
            Err(SynthError::ConcurrentExportConflict)
        ));
        assert!(app.audio.is_playing());
        assert!(!app.export_path.exists());

        app.toggle_playback();
        let bytes = app.export().unwrap();
        assert_eq!(bytes, 44 + 2 * 88200);
        assert!(app.export_path.exists());
    }

    #[test]
    fn test_select_active_wraps() {
        let mut app = app();
        app.selected = id(6);
        app.set_selected_amplitude(0.2);
        app.selected = id(1);
        app.select_next_active();
        assert_eq!(app.selected, id(6));
        app.select_next_active();
        assert_eq!(app.selected, id(1));
        app.select_prev_active();
        assert_eq!(app.selected, id(6));
    }
}
