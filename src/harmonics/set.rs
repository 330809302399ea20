//! The active harmonic set.
//!
//! A sparse map of the harmonics the user has activated, plus a defaulting
//! lookup that makes every slot 1-32 addressable. Slots missing from the map
//! behave exactly like `Harmonic::inactive`.

use super::harmonic::{clamp_amplitude, Harmonic, HarmonicId};
use super::ACTIVATION_THRESHOLD;
use crate::error::{Result, SynthError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Active harmonics keyed by id, iterated in ascending id order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Harmonic>", into = "Vec<Harmonic>")]
pub struct HarmonicSet {
    active: BTreeMap<HarmonicId, Harmonic>,
}

impl HarmonicSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            active: BTreeMap::new(),
        }
    }

    /// Builds a set from records. Later duplicates of an id are ignored.
    ///
    /// Amplitudes are clamped into `[0, 1]`.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if any amplitude is NaN.
    pub fn from_harmonics(harmonics: impl IntoIterator<Item = Harmonic>) -> Result<Self> {
        let mut active = BTreeMap::new();
        for harmonic in harmonics {
            let amplitude = clamp_amplitude(harmonic.amplitude)?;
            active.entry(harmonic.id).or_insert(Harmonic {
                amplitude,
                ..harmonic
            });
        }
        Ok(Self { active })
    }

    /// Returns the harmonic in a slot, or the inactive default.
    pub fn get(&self, id: HarmonicId) -> Harmonic {
        self.active
            .get(&id)
            .copied()
            .unwrap_or_else(|| Harmonic::inactive(id))
    }

    /// Returns the active entry for a slot, if any.
    pub fn get_active(&self, id: HarmonicId) -> Option<&Harmonic> {
        self.active.get(&id)
    }

    /// Whether a slot is in the active set.
    pub fn is_active(&self, id: HarmonicId) -> bool {
        self.active.contains_key(&id)
    }

    /// Active harmonics in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Harmonic> {
        self.active.values()
    }

    /// Ids of the active harmonics.
    pub fn ids(&self) -> impl Iterator<Item = HarmonicId> + '_ {
        self.active.keys().copied()
    }

    /// All 32 slots, with inactive defaults filled in.
    pub fn slots(&self) -> impl Iterator<Item = Harmonic> + '_ {
        HarmonicId::all().map(move |id| self.get(id))
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Adds a new harmonic at the given amplitude.
    ///
    /// # Errors
    ///
    /// `DuplicateHarmonic` if the slot is already active; the set is unchanged.
    pub fn add(&mut self, id: HarmonicId, amplitude: f32) -> Result<()> {
        if self.active.contains_key(&id) {
            return Err(SynthError::DuplicateHarmonic(id.get()));
        }
        let harmonic = Harmonic::new(id, amplitude)?;
        self.active.insert(id, harmonic);
        Ok(())
    }

    /// Writes an amplitude to a slot.
    ///
    /// The value is clamped into `[0, 1]`. An inactive slot is activated only
    /// when the amplitude exceeds [`ACTIVATION_THRESHOLD`].
    ///
    /// # Returns
    ///
    /// true if the set changed
    ///
    /// # Errors
    ///
    /// `HarmonicLocked` if the slot is locked. Locks block every amplitude
    /// write, whether it comes from a drag, a key press or typed input.
    pub fn set_amplitude(&mut self, id: HarmonicId, amplitude: f32) -> Result<bool> {
        let amplitude = clamp_amplitude(amplitude)?;
        match self.active.get_mut(&id) {
            Some(harmonic) if harmonic.is_locked => Err(SynthError::HarmonicLocked(id.get())),
            Some(harmonic) => {
                let changed = harmonic.amplitude != amplitude;
                harmonic.amplitude = amplitude;
                Ok(changed)
            }
            None if amplitude > ACTIVATION_THRESHOLD => {
                self.active.insert(id, Harmonic::new(id, amplitude)?);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Toggles mute on an active harmonic. Returns false for inactive slots.
    pub fn toggle_mute(&mut self, id: HarmonicId) -> bool {
        self.update_flag(id, |h| h.is_muted = !h.is_muted)
    }

    /// Toggles solo on an active harmonic. Returns false for inactive slots.
    pub fn toggle_solo(&mut self, id: HarmonicId) -> bool {
        self.update_flag(id, |h| h.is_soloed = !h.is_soloed)
    }

    /// Toggles the lock on an active harmonic. Returns false for inactive slots.
    pub fn toggle_lock(&mut self, id: HarmonicId) -> bool {
        self.update_flag(id, |h| h.is_locked = !h.is_locked)
    }

    fn update_flag(&mut self, id: HarmonicId, update: impl FnOnce(&mut Harmonic)) -> bool {
        match self.active.get_mut(&id) {
            Some(harmonic) => {
                update(harmonic);
                true
            }
            None => false,
        }
    }

    /// Removes a harmonic from the active set.
    pub fn remove(&mut self, id: HarmonicId) -> Option<Harmonic> {
        self.active.remove(&id)
    }

    /// Removes every harmonic that is not locked.
    ///
    /// # Returns
    ///
    /// Number of harmonics removed
    pub fn clear_unlocked(&mut self) -> usize {
        let before = self.active.len();
        self.active.retain(|_, h| h.is_locked);
        before - self.active.len()
    }

    /// Replaces every unlocked slot with a random amplitude.
    ///
    /// Locked harmonics keep all of their values. Previously active slots keep
    /// their mute flag; solo is reset. Slots whose new amplitude is at or
    /// below the activation threshold end up inactive.
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut next = BTreeMap::new();

        for id in HarmonicId::all() {
            let existing = self.active.get(&id);
            if let Some(locked) = existing.filter(|h| h.is_locked) {
                next.insert(id, *locked);
                continue;
            }

            let amplitude: f32 = rng.gen_range(0.0..1.0);
            if amplitude > ACTIVATION_THRESHOLD {
                next.insert(
                    id,
                    Harmonic {
                        id,
                        amplitude,
                        is_locked: false,
                        is_muted: existing.is_some_and(|h| h.is_muted),
                        is_soloed: false,
                    },
                );
            }
        }

        self.active = next;
    }
}

impl Default for HarmonicSet {
    /// The initial editor state: harmonic 1 at full amplitude.
    fn default() -> Self {
        let fundamental = Harmonic {
            id: HarmonicId::FUNDAMENTAL,
            amplitude: 1.0,
            is_locked: false,
            is_muted: false,
            is_soloed: false,
        };
        Self {
            active: BTreeMap::from([(fundamental.id, fundamental)]),
        }
    }
}

impl TryFrom<Vec<Harmonic>> for HarmonicSet {
    type Error = SynthError;

    fn try_from(harmonics: Vec<Harmonic>) -> Result<Self> {
        Self::from_harmonics(harmonics)
    }
}

impl From<HarmonicSet> for Vec<Harmonic> {
    fn from(set: HarmonicSet) -> Self {
        set.active.into_values().collect()
    }
}
