//! The live oscillator graph.
//!
//! One sine voice per harmonic id, each with its own gain, all summed into a
//! shared master gain. The graph keeps its own sample clock: every parameter
//! change is scheduled as a ramp on that clock, and a removed voice is only
//! released once the clock has passed its release deadline.

use super::param::Param;
use crate::harmonics::{has_solo, resolve, AudioSettings, HarmonicId, HarmonicSet};
use std::collections::BTreeMap;
use std::f64::consts::TAU;

/// Length of every gain and frequency transition (seconds).
pub const RAMP_SECONDS: f64 = 0.01;

/// Extra time a fading voice is kept after its ramp has finished (seconds).
pub const RELEASE_MARGIN_SECONDS: f64 = 0.05;

/// Frames rendered per step when advancing the clock without an output device.
const ADVANCE_BLOCK: usize = 256;

/// Lifecycle of a voice in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    /// Oscillating and following its harmonic's gain target.
    Live,
    /// Gain is ramping to zero; the voice is released once the clock reaches `release_at`.
    Fading { release_at: u64 },
}

/// A sine oscillator and its gain stage.
#[derive(Debug, Clone)]
pub struct Voice {
    id: HarmonicId,
    /// Phase in cycles, kept in `[0, 1)`.
    phase: f64,
    frequency: Param,
    gain: Param,
    state: VoiceState,
}

impl Voice {
    /// A new voice starts silent at phase zero.
    fn new(id: HarmonicId, frequency: f64) -> Self {
        Self {
            id,
            phase: 0.0,
            frequency: Param::new(frequency),
            gain: Param::new(0.0),
            state: VoiceState::Live,
        }
    }

    pub fn id(&self) -> HarmonicId {
        self.id
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn gain(&self) -> &Param {
        &self.gain
    }

    pub fn frequency(&self) -> &Param {
        &self.frequency
    }

    #[inline]
    fn next_sample(&mut self, frame: u64, sample_rate: f64) -> f64 {
        let out = (TAU * self.phase).sin() * self.gain.value_at(frame);
        self.phase += self.frequency.value_at(frame) / sample_rate;
        self.phase -= self.phase.floor();
        out
    }
}

/// The device-independent audio graph.
///
/// Voices live in an arena keyed by harmonic id. They are created lazily by
/// [`LiveGraph::reconcile`] and destroyed only by the clock passing their
/// release deadline or by [`LiveGraph::release_all`].
#[derive(Debug, Clone)]
pub struct LiveGraph {
    sample_rate: u32,
    /// Frames rendered since the graph was opened.
    clock: u64,
    master: Param,
    voices: BTreeMap<HarmonicId, Voice>,
    ramp_frames: u64,
    release_frames: u64,
}

impl LiveGraph {
    /// Opens an empty graph.
    ///
    /// # Arguments
    ///
    /// * `sample_rate` - Rate at which the graph will be rendered
    /// * `master_volume` - Initial master gain
    pub fn new(sample_rate: u32, master_volume: f64) -> Self {
        let rate = sample_rate as f64;
        let ramp_frames = (RAMP_SECONDS * rate).round() as u64;
        let release_frames = ((RAMP_SECONDS + RELEASE_MARGIN_SECONDS) * rate).round() as u64;
        Self {
            sample_rate,
            clock: 0,
            master: Param::new(master_volume),
            voices: BTreeMap::new(),
            ramp_frames,
            release_frames,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Current position of the sample clock.
    pub fn now(&self) -> u64 {
        self.clock
    }

    /// Length of a parameter ramp in frames.
    pub fn ramp_frames(&self) -> u64 {
        self.ramp_frames
    }

    /// Delay between starting a fade-out and releasing the voice, in frames.
    pub fn release_frames(&self) -> u64 {
        self.release_frames
    }

    pub fn master(&self) -> &Param {
        &self.master
    }

    pub fn voice(&self, id: HarmonicId) -> Option<&Voice> {
        self.voices.get(&id)
    }

    pub fn voices(&self) -> impl Iterator<Item = &Voice> {
        self.voices.values()
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    /// Voices whose gain is above zero at the current clock.
    pub fn audible_voice_count(&self) -> usize {
        let now = self.clock;
        self.voices
            .values()
            .filter(|voice| voice.gain.value_at(now) > 0.0)
            .count()
    }

    /// Brings the graph in line with the harmonic set.
    ///
    /// Every active harmonic gets a voice ramping towards its effective
    /// amplitude (or towards zero when `playing` is false). Voices whose
    /// harmonic is gone start fading and are scheduled for release. A fading
    /// voice whose harmonic has come back is revived instead of released.
    ///
    /// While stopped no new voices are created.
    pub fn reconcile(&mut self, harmonics: &HarmonicSet, settings: &AudioSettings, playing: bool) {
        let now = self.clock;
        let ramp = self.ramp_frames;
        let solo = has_solo(harmonics);

        for harmonic in harmonics.iter() {
            let target = if playing {
                resolve(harmonic, solo) as f64
            } else {
                0.0
            };
            let frequency = harmonic.frequency(settings.fundamental_frequency);

            match self.voices.get_mut(&harmonic.id) {
                Some(voice) => {
                    if voice.state != VoiceState::Live {
                        tracing::debug!("Reviving fading voice {}", harmonic.id);
                        voice.state = VoiceState::Live;
                    }
                    if voice.frequency.target() != frequency {
                        voice.frequency.ramp_to(frequency, now, ramp);
                    }
                    voice.gain.ramp_to(target, now, ramp);
                }
                None if playing => {
                    tracing::debug!("Creating voice {} at {:.2} Hz", harmonic.id, frequency);
                    let mut voice = Voice::new(harmonic.id, frequency);
                    voice.gain.ramp_to(target, now, ramp);
                    self.voices.insert(harmonic.id, voice);
                }
                None => {}
            }
        }

        let release_at = now + self.release_frames;
        for voice in self.voices.values_mut() {
            if voice.state == VoiceState::Live && !harmonics.is_active(voice.id) {
                voice.gain.ramp_to(0.0, now, ramp);
                voice.state = VoiceState::Fading { release_at };
            }
        }
    }

    /// Ramps every voice to `hz * id`.
    pub fn set_fundamental_frequency(&mut self, hz: f64) {
        let now = self.clock;
        for voice in self.voices.values_mut() {
            voice.frequency.ramp_to(hz * voice.id.multiplier(), now, self.ramp_frames);
        }
    }

    /// Ramps the master gain to `volume`.
    pub fn set_master_volume(&mut self, volume: f64) {
        self.master.ramp_to(volume, self.clock, self.ramp_frames);
    }

    /// Ramps every voice to silence without releasing anything.
    pub fn silence(&mut self) {
        let now = self.clock;
        for voice in self.voices.values_mut() {
            voice.gain.ramp_to(0.0, now, self.ramp_frames);
        }
    }

    /// Fades every voice out and schedules all of them for release.
    pub fn fade_out_all(&mut self) {
        let now = self.clock;
        let release_at = now + self.release_frames;
        for voice in self.voices.values_mut() {
            voice.gain.ramp_to(0.0, now, self.ramp_frames);
            voice.state = match voice.state {
                VoiceState::Fading { release_at: earlier } => VoiceState::Fading {
                    release_at: earlier.min(release_at),
                },
                VoiceState::Live => VoiceState::Fading { release_at },
            };
        }
    }

    /// Stops and drops every voice immediately.
    ///
    /// # Returns
    ///
    /// Number of voices released
    pub fn release_all(&mut self) -> usize {
        let count = self.voices.len();
        self.voices.clear();
        count
    }

    /// Renders the next block of mono output and advances the clock.
    pub fn render(&mut self, out: &mut [f32]) {
        let rate = self.sample_rate as f64;
        for sample in out.iter_mut() {
            let frame = self.clock;
            let mix: f64 = self
                .voices
                .values_mut()
                .map(|voice| voice.next_sample(frame, rate))
                .sum();
            *sample = (mix * self.master.value_at(frame)).clamp(-1.0, 1.0) as f32;
            self.clock += 1;
        }
        self.settle();
    }

    /// Advances the clock by rendering and discarding `frames` frames.
    pub fn advance(&mut self, frames: u64) {
        let mut scratch = [0.0f32; ADVANCE_BLOCK];
        let mut remaining = frames;
        while remaining > 0 {
            let block = remaining.min(ADVANCE_BLOCK as u64) as usize;
            self.render(&mut scratch[..block]);
            remaining -= block as u64;
        }
    }

    /// Folds finished ramps and releases voices past their deadline.
    fn settle(&mut self) {
        let now = self.clock;
        self.master.settle(now);
        for voice in self.voices.values_mut() {
            voice.gain.settle(now);
            voice.frequency.settle(now);
        }
        self.voices.retain(|id, voice| match voice.state {
            VoiceState::Fading { release_at } if now >= release_at => {
                tracing::debug!("Releasing voice {}", id);
                false
            }
            _ => true,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 44100;

    fn id(n: u8) -> HarmonicId {
        HarmonicId::new(n).unwrap()
    }

    fn graph() -> LiveGraph {
        LiveGraph::new(RATE, 1.0)
    }

    #[test]
    fn test_window_lengths() {
        let graph = graph();
        assert_eq!(graph.ramp_frames(), 441);
        assert_eq!(graph.release_frames(), 2646);
    }

    #[test]
    fn test_added_harmonic_ramps_in() {
        let mut graph = graph();
        let settings = AudioSettings::default();
        let mut set = HarmonicSet::default();
        graph.reconcile(&set, &settings, true);
        graph.advance(1000);

        set.add(id(3), 0.5).unwrap();
        graph.reconcile(&set, &settings, true);
        let start = graph.now();
        let ramp = graph.ramp_frames();

        let voice = graph.voice(id(3)).unwrap();
        assert_eq!(voice.frequency().target(), 660.0);
        assert_eq!(voice.state(), VoiceState::Live);
        assert_eq!(voice.gain().value_at(start), 0.0);
        assert_eq!(voice.gain().value_at(start + ramp), 0.5);

        let slope = 0.5 / ramp as f64;
        for frame in start..start + ramp {
            let step = voice.gain().value_at(frame + 1) - voice.gain().value_at(frame);
            assert!(step >= 0.0 && step <= slope + 1e-12);
        }
    }

    #[test]
    fn test_removed_harmonic_released_after_deadline() {
        let mut graph = graph();
        let settings = AudioSettings::default();
        let mut set = HarmonicSet::default();
        set.add(id(2), 0.8).unwrap();
        graph.reconcile(&set, &settings, true);
        graph.advance(2000);

        set.remove(id(2));
        graph.reconcile(&set, &settings, true);
        let removed_at = graph.now();
        let release_at = removed_at + graph.release_frames();
        assert_eq!(
            graph.voice(id(2)).unwrap().state(),
            VoiceState::Fading { release_at }
        );

        graph.advance(graph.ramp_frames());
        let voice = graph.voice(id(2)).expect("kept through the ramp");
        assert_eq!(voice.gain().value_at(graph.now()), 0.0);

        graph.advance(release_at - graph.now() - 1);
        assert!(graph.voice(id(2)).is_some());

        graph.advance(1);
        assert!(graph.voice(id(2)).is_none());
        assert!(graph.voice(id(1)).is_some());
    }

    #[test]
    fn test_re_added_voice_is_not_released() {
        let mut graph = graph();
        let settings = AudioSettings::default();
        let mut set = HarmonicSet::default();
        set.add(id(4), 0.4).unwrap();
        graph.reconcile(&set, &settings, true);

        set.remove(id(4));
        graph.reconcile(&set, &settings, true);
        graph.advance(100);

        set.add(id(4), 0.4).unwrap();
        graph.reconcile(&set, &settings, true);
        graph.advance(graph.release_frames() * 2);

        let voice = graph.voice(id(4)).unwrap();
        assert_eq!(voice.state(), VoiceState::Live);
        assert_eq!(voice.gain().value_at(graph.now()), 0.4f32 as f64);
    }

    #[test]
    fn test_stopped_reconcile_forces_silence() {
        let mut graph = graph();
        let settings = AudioSettings::default();
        let mut set = HarmonicSet::default();
        graph.reconcile(&set, &settings, true);
        graph.advance(1000);

        set.add(id(5), 0.5).unwrap();
        graph.reconcile(&set, &settings, false);
        assert!(graph.voice(id(5)).is_none());
        assert_eq!(graph.voice(id(1)).unwrap().gain().target(), 0.0);
    }

    #[test]
    fn test_solo_targets() {
        let mut graph = graph();
        let mut set = HarmonicSet::default();
        set.add(id(2), 0.5).unwrap();
        set.toggle_solo(id(2));
        graph.reconcile(&set, &AudioSettings::default(), true);
        assert_eq!(graph.voice(id(1)).unwrap().gain().target(), 0.0);
        assert_eq!(graph.voice(id(2)).unwrap().gain().target(), 0.5);
    }

    #[test]
    fn test_fundamental_glides() {
        let mut graph = graph();
        let mut set = HarmonicSet::default();
        set.add(id(2), 0.5).unwrap();
        graph.reconcile(&set, &AudioSettings::default(), true);
        graph.advance(500);

        graph.set_fundamental_frequency(110.0);
        let now = graph.now();
        let voice = graph.voice(id(2)).unwrap();
        assert_eq!(voice.frequency().value_at(now), 440.0);
        assert_eq!(voice.frequency().value_at(now + graph.ramp_frames()), 220.0);
    }

    #[test]
    fn test_render_is_click_free_on_entry() {
        let mut graph = graph();
        graph.reconcile(&HarmonicSet::default(), &AudioSettings::default(), true);
        let mut block = [0.0f32; 64];
        graph.render(&mut block);
        assert_eq!(block[0], 0.0);
        for pair in block.windows(2) {
            assert!((pair[1] - pair[0]).abs() < 0.05);
        }
    }

    #[test]
    fn test_fade_out_all_then_release() {
        let mut graph = graph();
        let mut set = HarmonicSet::default();
        set.add(id(2), 0.5).unwrap();
        graph.reconcile(&set, &AudioSettings::default(), true);
        graph.advance(graph.ramp_frames());
        assert_eq!(graph.audible_voice_count(), 2);

        graph.fade_out_all();
        graph.advance(graph.ramp_frames());
        assert_eq!(graph.audible_voice_count(), 0);
        assert_eq!(graph.voice_count(), 2);

        graph.advance(graph.release_frames() - graph.ramp_frames());
        assert_eq!(graph.voice_count(), 0);
        assert_eq!(graph.release_all(), 0);
    }
}
