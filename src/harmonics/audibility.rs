//! Mute/solo resolution.
//!
//! Live gain targets, graph display values, the export check and the offline
//! mix all resolve audibility through this module so they never disagree.

use super::harmonic::Harmonic;
use super::set::HarmonicSet;

/// Whether any harmonic claims solo priority.
///
/// Only a soloed harmonic that is unmuted and has a positive amplitude counts.
pub fn has_solo(set: &HarmonicSet) -> bool {
    set.iter()
        .any(|h| h.amplitude > 0.0 && h.is_soloed && !h.is_muted)
}

/// The amplitude a harmonic actually contributes, given the whole set.
pub fn effective_amplitude(harmonic: &Harmonic, set: &HarmonicSet) -> f32 {
    resolve(harmonic, has_solo(set))
}

/// Resolution with a precomputed solo flag, for callers iterating a set.
#[inline]
pub fn resolve(harmonic: &Harmonic, has_solo: bool) -> f32 {
    if harmonic.is_muted || (has_solo && !harmonic.is_soloed) {
        0.0
    } else {
        harmonic.amplitude
    }
}

/// The harmonics that contribute to the mix, paired with their amplitude.
pub fn audible_harmonics(set: &HarmonicSet) -> Vec<(Harmonic, f32)> {
    let solo = has_solo(set);
    set.iter()
        .map(|h| (*h, resolve(h, solo)))
        .filter(|(_, amplitude)| *amplitude > 0.0)
        .collect()
}

/// Whether the set produces any sound at all.
pub fn is_audible(set: &HarmonicSet) -> bool {
    let solo = has_solo(set);
    set.iter().any(|h| resolve(h, solo) > 0.0)
}

/// One bar of the amplitude graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotView {
    /// The slot's record (inactive default when not in the set).
    pub harmonic: Harmonic,
    /// Whether the slot is in the active set.
    pub active: bool,
    /// Amplitude after mute/solo resolution.
    pub effective: f32,
}

/// Resolves all 32 slots for display.
pub fn display_slots(set: &HarmonicSet) -> Vec<SlotView> {
    let solo = has_solo(set);
    set.slots()
        .map(|harmonic| SlotView {
            harmonic,
            active: set.is_active(harmonic.id),
            effective: resolve(&harmonic, solo),
        })
        .collect()
}
