//! Audio engine for additive synthesis and export.
//!
//! This module provides real-time playback of the harmonic set via rodio
//! and offline rendering to WAV. It supports:
//! - A live oscillator graph with click-free ramped parameter changes
//! - Deferred release of removed voices
//! - Deterministic offline rendering with fades and peak normalization
//! - Canonical 16-bit mono WAV encoding

pub mod engine;
pub mod export;
pub mod graph;
pub mod param;
pub mod render;
pub mod wav;

pub use engine::{AudioEngine, PlaybackState, SAMPLE_RATE};
pub use export::{export_to_wav, render_export};
pub use graph::{LiveGraph, VoiceState};
pub use render::render;
pub use wav::{encode, DEFAULT_EXPORT_FILENAME, WAV_MIME_TYPE};
