//! additui - A terminal-based additive synthesizer.
//!
//! This library provides the harmonic model, the real-time oscillator graph
//! and the offline WAV renderer behind the editor app.

pub mod app;
pub mod audio;
pub mod error;
pub mod harmonics;
pub mod history;
pub mod ui;

// Re-export commonly used types
pub use app::{AddDialogState, App, FocusedPanel};
pub use audio::{engine::AudioEngine, export::export_to_wav};
pub use error::{Result, SynthError};
pub use harmonics::{AudioSettings, Harmonic, HarmonicId, HarmonicSet, MAX_HARMONICS};
