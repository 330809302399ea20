//! Audio export functionality.
//!
//! Exports the harmonic set to a WAV file by rendering the configured
//! duration offline and encoding the result.

use crate::audio::{render, wav};
use crate::error::{Result, SynthError};
use crate::harmonics::{is_audible, AudioSettings, HarmonicSet};
use std::fs;
use std::path::Path;

/// Renders and encodes the set, refusing exports that cannot succeed.
///
/// # Arguments
///
/// * `harmonics` - The active harmonic set
/// * `settings` - Fundamental, duration and master volume
/// * `sample_rate` - Sample rate of the rendered file
/// * `is_playing` - Whether live playback is currently running
///
/// # Returns
///
/// The complete WAV file as bytes
///
/// # Errors
///
/// - `ConcurrentExportConflict` while playback is running (playback is left alone)
/// - `NoAudibleSignal` when every harmonic resolves to zero amplitude
/// - `InvalidParameter` for unusable settings
pub fn render_export(
    harmonics: &HarmonicSet,
    settings: &AudioSettings,
    sample_rate: u32,
    is_playing: bool,
) -> Result<Vec<u8>> {
    if is_playing {
        return Err(SynthError::ConcurrentExportConflict);
    }
    if !is_audible(harmonics) {
        return Err(SynthError::NoAudibleSignal);
    }
    settings.validate()?;

    let samples = render::render(harmonics, settings, sample_rate)?;
    tracing::debug!(
        "Rendered {} frames from {} harmonics",
        samples.len(),
        harmonics.len()
    );
    wav::encode(&samples, sample_rate)
}

/// Exports the set to a WAV file.
///
/// # Returns
///
/// Number of bytes written
///
/// # Errors
///
/// Everything [`render_export`] reports, plus I/O failures writing `output_path`.
pub fn export_to_wav<P: AsRef<Path>>(
    harmonics: &HarmonicSet,
    settings: &AudioSettings,
    sample_rate: u32,
    is_playing: bool,
    output_path: P,
) -> Result<usize> {
    let bytes = render_export(harmonics, settings, sample_rate, is_playing)?;
    fs::write(output_path.as_ref(), &bytes)?;
    tracing::info!(
        "Exported {} bytes to {}",
        bytes.len(),
        output_path.as_ref().display()
    );
    Ok(bytes.len())
}
