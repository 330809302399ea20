//! A single sinusoidal partial.
//!
//! The harmonic's id doubles as its integer multiplier of the fundamental,
//! so a valid id is always in `1..=MAX_HARMONICS`.

use super::MAX_HARMONICS;
use crate::error::{Result, SynthError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a harmonic slot (1-32).
///
/// Ordering follows the partial number, so collections keyed by id iterate
/// from the fundamental upwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct HarmonicId(u8);

impl HarmonicId {
    /// The fundamental (harmonic 1).
    pub const FUNDAMENTAL: HarmonicId = HarmonicId(1);

    /// Creates an id, rejecting values outside `1..=32`.
    pub fn new(id: u8) -> Result<Self> {
        if (1..=MAX_HARMONICS).contains(&id) {
            Ok(Self(id))
        } else {
            Err(SynthError::invalid(format!(
                "harmonic id {} outside 1..={}",
                id, MAX_HARMONICS
            )))
        }
    }

    /// Returns the raw id value.
    pub fn get(self) -> u8 {
        self.0
    }

    /// Frequency multiplier relative to the fundamental.
    pub fn multiplier(self) -> f64 {
        self.0 as f64
    }

    /// Iterates over every slot from 1 to 32.
    pub fn all() -> impl Iterator<Item = HarmonicId> {
        (1..=MAX_HARMONICS).map(HarmonicId)
    }

    /// The next slot up, or None at the top.
    pub fn next(self) -> Option<HarmonicId> {
        HarmonicId::new(self.0 + 1).ok()
    }

    /// The next slot down, or None at the fundamental.
    pub fn prev(self) -> Option<HarmonicId> {
        HarmonicId::new(self.0.checked_sub(1)?).ok()
    }
}

impl TryFrom<u8> for HarmonicId {
    type Error = SynthError;

    fn try_from(value: u8) -> Result<Self> {
        HarmonicId::new(value)
    }
}

impl From<HarmonicId> for u8 {
    fn from(id: HarmonicId) -> u8 {
        id.0
    }
}

impl fmt::Display for HarmonicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H{}", self.0)
    }
}

/// One partial with its gain and editor flags.
///
/// Identity is by `id`; two records with the same id describe the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Harmonic {
    /// Slot and frequency multiplier.
    pub id: HarmonicId,

    /// Linear gain of this partial (0.0-1.0).
    pub amplitude: f32,

    /// Locked harmonics refuse every amplitude write and survive bulk edits.
    #[serde(default)]
    pub is_locked: bool,

    /// Muted harmonics are silent regardless of amplitude.
    #[serde(default)]
    pub is_muted: bool,

    /// When any audible harmonic is soloed, only soloed harmonics sound.
    #[serde(default)]
    pub is_soloed: bool,
}

impl Harmonic {
    /// Creates an unlocked, unmuted, unsoloed harmonic.
    ///
    /// The amplitude is clamped into `[0, 1]`; NaN is rejected.
    pub fn new(id: HarmonicId, amplitude: f32) -> Result<Self> {
        Ok(Self {
            id,
            amplitude: clamp_amplitude(amplitude)?,
            is_locked: false,
            is_muted: false,
            is_soloed: false,
        })
    }

    /// The default record of a slot that is not in the active set.
    pub fn inactive(id: HarmonicId) -> Self {
        Self {
            id,
            amplitude: 0.0,
            is_locked: false,
            is_muted: false,
            is_soloed: false,
        }
    }

    /// Oscillation frequency for a given fundamental.
    pub fn frequency(&self, fundamental: f64) -> f64 {
        fundamental * self.id.multiplier()
    }
}

/// Clamps an amplitude into `[0, 1]`, rejecting NaN.
pub fn clamp_amplitude(amplitude: f32) -> Result<f32> {
    if amplitude.is_nan() {
        return Err(SynthError::invalid("amplitude is NaN"));
    }
    Ok(amplitude.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_range() {
        assert!(HarmonicId::new(0).is_err());
        assert!(HarmonicId::new(33).is_err());
        assert_eq!(HarmonicId::new(1).unwrap(), HarmonicId::FUNDAMENTAL);
        assert_eq!(HarmonicId::new(32).unwrap().get(), 32);
        assert_eq!(HarmonicId::all().count(), 32);
    }

    #[test]
    fn test_id_neighbours() {
        let top = HarmonicId::new(32).unwrap();
        assert_eq!(top.next(), None);
        assert_eq!(top.prev().map(HarmonicId::get), Some(31));
        assert_eq!(HarmonicId::FUNDAMENTAL.prev(), None);
    }

    #[test]
    fn test_amplitude_clamped() {
        let id = HarmonicId::new(2).unwrap();
        assert_eq!(Harmonic::new(id, 1.7).unwrap().amplitude, 1.0);
        assert_eq!(Harmonic::new(id, -0.2).unwrap().amplitude, 0.0);
        assert!(Harmonic::new(id, f32::NAN).is_err());
    }

    #[test]
    fn test_frequency() {
        let h = Harmonic::new(HarmonicId::new(3).unwrap(), 0.5).unwrap();
        assert_eq!(h.frequency(220.0), 660.0);
    }

    #[test]
    fn test_id_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<HarmonicId>("7").is_ok());
        assert!(serde_json::from_str::<HarmonicId>("40").is_err());
    }
}
