//! Global synthesis settings shared by every harmonic.

use crate::error::{Result, SynthError};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Fundamental frequency range offered by the editor (Hz).
pub const FUNDAMENTAL_RANGE: RangeInclusive<f64> = 20.0..=2000.0;

/// Export duration range offered by the editor (seconds).
pub const DURATION_RANGE: RangeInclusive<f64> = 0.1..=10.0;

/// Master volume range.
pub const VOLUME_RANGE: RangeInclusive<f64> = 0.0..=1.0;

/// Global parameters for live playback and offline rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Base frequency in Hz, multiplied by each harmonic id.
    pub fundamental_frequency: f64,

    /// Length of an offline render in seconds. Not used by live playback.
    pub duration: f64,

    /// Final linear gain applied after mixing (0.0-1.0).
    pub master_volume: f64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            fundamental_frequency: 220.0,
            duration: 2.0,
            master_volume: 0.75,
        }
    }
}

impl AudioSettings {
    /// Sets the fundamental, clamped to the editor range.
    pub fn set_fundamental_frequency(&mut self, hz: f64) {
        if hz.is_finite() {
            self.fundamental_frequency = clamp_to(hz, &FUNDAMENTAL_RANGE);
        }
    }

    /// Sets the export duration, clamped to the editor range.
    pub fn set_duration(&mut self, seconds: f64) {
        if seconds.is_finite() {
            self.duration = clamp_to(seconds, &DURATION_RANGE);
        }
    }

    /// Sets the master volume, clamped to `[0, 1]`.
    pub fn set_master_volume(&mut self, volume: f64) {
        if volume.is_finite() {
            self.master_volume = clamp_to(volume, &VOLUME_RANGE);
        }
    }

    /// Checks the values the engine relies on.
    ///
    /// Frequency and duration must be finite and positive; volume must lie
    /// in `[0, 1]`. Values outside the editor ranges are accepted here.
    pub fn validate(&self) -> Result<()> {
        if !(self.fundamental_frequency.is_finite() && self.fundamental_frequency > 0.0) {
            return Err(SynthError::invalid(format!(
                "fundamental frequency {} must be positive",
                self.fundamental_frequency
            )));
        }
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(SynthError::invalid(format!(
                "duration {} must be positive",
                self.duration
            )));
        }
        if !VOLUME_RANGE.contains(&self.master_volume) {
            return Err(SynthError::invalid(format!(
                "master volume {} outside 0..=1",
                self.master_volume
            )));
        }
        Ok(())
    }
}

#[inline]
fn clamp_to(value: f64, range: &RangeInclusive<f64>) -> f64 {
    value.clamp(*range.start(), *range.end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = AudioSettings::default();
        assert_eq!(settings.fundamental_frequency, 220.0);
        assert_eq!(settings.duration, 2.0);
        assert_eq!(settings.master_volume, 0.75);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_setters_clamp() {
        let mut settings = AudioSettings::default();
        settings.set_fundamental_frequency(5.0);
        assert_eq!(settings.fundamental_frequency, 20.0);
        settings.set_duration(60.0);
        assert_eq!(settings.duration, 10.0);
        settings.set_master_volume(1.5);
        assert_eq!(settings.master_volume, 1.0);
        settings.set_master_volume(f64::NAN);
        assert_eq!(settings.master_volume, 1.0);
    }

    #[test]
    fn test_validate_rejects_non_positive() {
        let settings = AudioSettings {
            duration: 0.0,
            ..AudioSettings::default()
        };
        assert!(settings.validate().is_err());

        let settings = AudioSettings {
            fundamental_frequency: -1.0,
            ..AudioSettings::default()
        };
        assert!(settings.validate().is_err());
    }
}
