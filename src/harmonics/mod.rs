//! Harmonic data model.
//!
//! This module provides the types the editor mutates and the engine reads:
//! individual harmonics, the active set with its 32-slot defaulting lookup,
//! the global audio settings, mute/solo resolution, and the input record
//! the engine is handed.

mod audibility;
mod harmonic;
mod input;
mod set;
mod settings;

pub use audibility::{
    audible_harmonics, display_slots, effective_amplitude, has_solo, is_audible, resolve,
    SlotView,
};
pub use harmonic::{clamp_amplitude, Harmonic, HarmonicId};
pub use input::{parse_harmonic_list, EngineInput};
pub use set::HarmonicSet;
pub use settings::{AudioSettings, DURATION_RANGE, FUNDAMENTAL_RANGE, VOLUME_RANGE};

/// Number of harmonic slots above and including the fundamental.
pub const MAX_HARMONICS: u8 = 32;

/// Minimum amplitude that activates an inactive slot on write.
pub const ACTIVATION_THRESHOLD: f32 = 0.005;
