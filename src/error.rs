//! Error types for the synthesis engine.
//!
//! Every error here is recoverable: it is reported to the caller and leaves
//! the harmonic set and the live graph exactly as they were.

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, SynthError>;

/// Errors reported by the harmonic model, renderer, encoder and live engine.
#[derive(Error, Debug)]
pub enum SynthError {
    /// A value fell outside its allowed range (id, amplitude, duration, rate, frequency).
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The harmonic is already part of the active set.
    #[error("Harmonic {0} already exists")]
    DuplicateHarmonic(u8),

    /// Amplitude writes are refused while a harmonic is locked.
    #[error("Harmonic {0} is locked")]
    HarmonicLocked(u8),

    /// Playback was requested with no active harmonics.
    #[error("Add or activate some harmonics before playing")]
    EmptyActiveSet,

    /// Every harmonic resolves to zero effective amplitude.
    #[error("No audible sound to export: adjust amplitudes or mute/solo states")]
    NoAudibleSignal,

    /// Export was requested while live playback is running.
    #[error("Stop playback before exporting")]
    ConcurrentExportConflict,

    /// The WAV container could not be written.
    #[error("WAV encoding error: {0}")]
    Encode(#[from] hound::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SynthError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        SynthError::InvalidParameter(message.into())
    }
}
