//! Audio engine for real-time additive playback.
//!
//! Provides a high-level controller over the [`LiveGraph`], streaming it to
//! the default output device through rodio. The controller only schedules
//! ramps against the graph's clock; the device thread renders the graph and
//! drives that clock forward.

use super::graph::{LiveGraph, RAMP_SECONDS, RELEASE_MARGIN_SECONDS};
use crate::error::{Result, SynthError};
use crate::harmonics::{AudioSettings, HarmonicSet};
use anyhow::Context;
use rodio::{OutputStream, OutputStreamHandle, Source};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Sample rate for live synthesis and export (44.1 kHz standard).
pub const SAMPLE_RATE: u32 = 44100;

/// Frames rendered per device callback block.
/// Smaller = lower latency but higher CPU usage.
const BUFFER_SIZE: usize = 256;

/// Represents the current playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Voices are silent (or fading to silence).
    Stopped,
    /// Voices follow their harmonics' effective amplitudes.
    Playing,
}

/// Audio source that renders the live graph for rodio.
struct GraphSource {
    graph: Arc<Mutex<LiveGraph>>,
    buf: Vec<f32>,
    buf_pos: usize,
    sample_rate: u32,
}

impl GraphSource {
    fn new(graph: Arc<Mutex<LiveGraph>>, sample_rate: u32) -> Self {
        Self {
            graph,
            buf: vec![0.0; BUFFER_SIZE],
            buf_pos: BUFFER_SIZE, // Start at end to trigger first render
            sample_rate,
        }
    }
}

impl Iterator for GraphSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.buf_pos >= BUFFER_SIZE {
            if let Ok(mut graph) = self.graph.lock() {
                graph.render(&mut self.buf);
            } else {
                self.buf.fill(0.0);
            }
            self.buf_pos = 0;
        }

        let sample = self.buf[self.buf_pos];
        self.buf_pos += 1;
        Some(sample)
    }
}

impl Source for GraphSource {
    fn current_frame_len(&self) -> Option<usize> {
        None // Continuous stream
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None // Infinite stream
    }
}

/// Keeps the output device open for as long as it lives.
struct Output {
    _stream: OutputStream,
    _stream_handle: OutputStreamHandle,
}

/// Real-time controller for the oscillator graph.
///
/// Owns the graph exclusively. Every mutation is a ramp scheduled on the
/// graph clock, so callers never block on the audio thread beyond a short
/// lock.
pub struct AudioEngine {
    graph: Arc<Mutex<LiveGraph>>,
    /// None for a headless engine.
    output: Option<Output>,
    playback_state: PlaybackState,
    disposed: bool,
}

impl AudioEngine {
    /// Opens the default output device and starts streaming the graph.
    ///
    /// # Arguments
    ///
    /// * `master_volume` - Initial master gain
    ///
    /// # Errors
    ///
    /// Returns error if audio output cannot be initialized
    pub fn new(master_volume: f64) -> anyhow::Result<Self> {
        let graph = Arc::new(Mutex::new(LiveGraph::new(SAMPLE_RATE, master_volume)));

        let (stream, stream_handle) =
            OutputStream::try_default().context("Failed to open audio output")?;

        let source = GraphSource::new(Arc::clone(&graph), SAMPLE_RATE);
        stream_handle
            .play_raw(source)
            .context("Failed to start audio playback")?;

        tracing::info!("Audio output opened at {} Hz", SAMPLE_RATE);

        Ok(Self {
            graph,
            output: Some(Output {
                _stream: stream,
                _stream_handle: stream_handle,
            }),
            playback_state: PlaybackState::Stopped,
            disposed: false,
        })
    }

    /// Creates an engine with no output device.
    ///
    /// The graph clock only moves when driven with [`AudioEngine::advance`].
    pub fn headless(sample_rate: u32, master_volume: f64) -> Self {
        Self {
            graph: Arc::new(Mutex::new(LiveGraph::new(sample_rate, master_volume))),
            output: None,
            playback_state: PlaybackState::Stopped,
            disposed: false,
        }
    }

    /// Whether an output device is attached.
    pub fn has_output(&self) -> bool {
        self.output.is_some()
    }

    pub fn sample_rate(&self) -> u32 {
        self.with_graph(|g| g.sample_rate()).unwrap_or(SAMPLE_RATE)
    }

    /// Returns the current playback state.
    pub fn playback_state(&self) -> PlaybackState {
        self.playback_state
    }

    /// Returns whether audio is currently playing.
    pub fn is_playing(&self) -> bool {
        self.playback_state == PlaybackState::Playing
    }

    /// Starts playback of the harmonic set.
    ///
    /// # Errors
    ///
    /// `EmptyActiveSet` if the set has no harmonics; the engine stays stopped.
    pub fn start(&mut self, harmonics: &HarmonicSet, settings: &AudioSettings) -> Result<()> {
        if harmonics.is_empty() {
            return Err(SynthError::EmptyActiveSet);
        }
        if let Ok(mut graph) = self.graph.lock() {
            graph.set_master_volume(settings.master_volume);
            graph.reconcile(harmonics, settings, true);
        }
        self.playback_state = PlaybackState::Playing;
        tracing::info!("Playback started with {} harmonics", harmonics.len());
        Ok(())
    }

    /// Ramps every voice to silence. Voices stay allocated until the next
    /// reconcile removes them or the engine is disposed.
    pub fn stop(&mut self) {
        if let Ok(mut graph) = self.graph.lock() {
            graph.silence();
        }
        self.playback_state = PlaybackState::Stopped;
        tracing::info!("Playback stopped");
    }

    /// Reconciles the live graph with the current harmonic set.
    pub fn reconcile(&self, harmonics: &HarmonicSet, settings: &AudioSettings) {
        let playing = self.is_playing();
        if let Ok(mut graph) = self.graph.lock() {
            graph.reconcile(harmonics, settings, playing);
        }
    }

    /// Glides every live oscillator to the new fundamental.
    pub fn set_fundamental_frequency(&self, hz: f64) {
        if let Ok(mut graph) = self.graph.lock() {
            graph.set_fundamental_frequency(hz);
        }
    }

    /// Ramps the master gain.
    pub fn set_master_volume(&self, volume: f64) {
        if let Ok(mut graph) = self.graph.lock() {
            graph.set_master_volume(volume);
        }
    }

    /// Advances a headless engine's clock. No-op when a device drives the clock.
    pub fn advance(&self, frames: u64) {
        if self.output.is_some() {
            return;
        }
        if let Ok(mut graph) = self.graph.lock() {
            graph.advance(frames);
        }
    }

    /// Runs a closure against the graph, e.g. for inspection.
    pub fn with_graph<R>(&self, f: impl FnOnce(&LiveGraph) -> R) -> Option<R> {
        self.graph.lock().ok().map(|graph| f(&graph))
    }

    /// Fades everything out, waits out the release window, then releases all
    /// voices and closes the output device. Safe to call more than once.
    ///
    /// # Returns
    ///
    /// Number of voices still sounding when they were released
    pub fn dispose(&mut self) -> usize {
        if self.disposed {
            return 0;
        }
        self.disposed = true;
        self.playback_state = PlaybackState::Stopped;

        let release_frames = match self.graph.lock() {
            Ok(mut graph) => {
                graph.fade_out_all();
                graph.release_frames()
            }
            Err(_) => 0,
        };

        if self.output.is_some() {
            std::thread::sleep(Duration::from_secs_f64(
                RAMP_SECONDS + RELEASE_MARGIN_SECONDS,
            ));
        }

        let mut cut = 0;
        if let Ok(mut graph) = self.graph.lock() {
            if self.output.is_none() {
                graph.advance(release_frames);
            }
            cut = graph.audible_voice_count();
            if cut > 0 {
                tracing::warn!("{} voices still sounding at dispose", cut);
            }
            let released = graph.release_all();
            tracing::debug!("Disposed audio graph, {} voices released", released);
        }

        self.output = None;
        cut
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::graph::VoiceState;
    use crate::harmonics::HarmonicId;

    fn id(n: u8) -> HarmonicId {
        HarmonicId::new(n).unwrap()
    }

    fn engine() -> AudioEngine {
        AudioEngine::headless(SAMPLE_RATE, 0.75)
    }

    #[test]
    fn test_start_rejects_empty_set() {
        let mut engine = engine();
        let result = engine.start(&HarmonicSet::new(), &AudioSettings::default());
        assert!(matches!(result, Err(SynthError::EmptyActiveSet)));
        assert_eq!(engine.playback_state(), PlaybackState::Stopped);
        assert_eq!(engine.with_graph(|g| g.voice_count()), Some(0));
    }

    #[test]
    fn test_start_and_stop() {
        let mut engine = engine();
        let set = HarmonicSet::default();
        engine.start(&set, &AudioSettings::default()).unwrap();
        assert!(engine.is_playing());
        engine.advance(1000);
        let gain = engine.with_graph(|g| g.voice(id(1)).unwrap().gain().target());
        assert_eq!(gain, Some(1.0));

        engine.stop();
        assert!(!engine.is_playing());
        let state = engine.with_graph(|g| {
            let voice = g.voice(id(1)).unwrap();
            (voice.state(), voice.gain().target())
        });
        assert_eq!(state, Some((VoiceState::Live, 0.0)));
    }

    #[test]
    fn test_reconcile_adds_and_removes_while_playing() {
        let mut engine = engine();
        let settings = AudioSettings::default();
        let mut set = HarmonicSet::default();
        engine.start(&set, &settings).unwrap();

        set.add(id(3), 0.5).unwrap();
        engine.reconcile(&set, &settings);
        assert_eq!(
            engine.with_graph(|g| g.voice(id(3)).unwrap().frequency().target()),
            Some(660.0)
        );

        set.remove(id(3));
        engine.reconcile(&set, &settings);
        let release = engine.with_graph(|g| g.release_frames()).unwrap();
        engine.advance(release - 1);
        assert_eq!(engine.with_graph(|g| g.voice(id(3)).is_some()), Some(true));
        engine.advance(1);
        assert_eq!(engine.with_graph(|g| g.voice(id(3)).is_some()), Some(false));
    }

    #[test]
    fn test_master_volume_ramps() {
        let engine = engine();
        engine.set_master_volume(0.2);
        let (now_value, target) = engine
            .with_graph(|g| (g.master().value_at(g.now()), g.master().target()))
            .unwrap();
        assert_eq!(now_value, 0.75);
        assert_eq!(target, 0.2);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let mut engine = engine();
        let mut set = HarmonicSet::default();
        set.add(id(2), 0.3).unwrap();
        engine.start(&set, &AudioSettings::default()).unwrap();

        engine.dispose();
        assert_eq!(engine.with_graph(|g| g.voice_count()), Some(0));
        assert!(!engine.is_playing());
        assert_eq!(engine.dispose(), 0);

        let mut idle = self::engine();
        assert_eq!(idle.dispose(), 0);
    }

    #[test]
    fn test_dispose_fades_before_release() {
        let mut engine = engine();
        let mut set = HarmonicSet::default();
        set.add(id(3), 0.5).unwrap();
        engine.start(&set, &AudioSettings::default()).unwrap();
        engine.advance(1000);
        assert_eq!(engine.with_graph(|g| g.audible_voice_count()), Some(2));

        let (started, release) = engine
            .with_graph(|g| (g.now(), g.release_frames()))
            .unwrap();
        assert_eq!(engine.dispose(), 0);

        let now = engine.with_graph(|g| g.now()).unwrap();
        assert!(now >= started + release);
        assert_eq!(engine.with_graph(|g| g.voice_count()), Some(0));
    }
}
