//! Offline rendering of a fixed-duration mono buffer.
//!
//! The render is a pure function of the harmonic set, the settings and the
//! sample rate. Frames are computed independently in parallel, so the output
//! is identical to a sequential render.

use crate::error::{Result, SynthError};
use crate::harmonics::{audible_harmonics, AudioSettings, HarmonicSet};
use rayon::prelude::*;
use std::f64::consts::TAU;

/// Length of the linear fade applied at both ends of a render (seconds).
pub const FADE_SECONDS: f64 = 0.005;

/// Renders shorter than this many milliseconds get no fade envelope.
const MIN_FADED_DURATION_MS: f64 = 10.0;

/// Peak level the normalizer scales down to.
pub const NORMALIZE_CEILING: f32 = 0.98;

/// Renders the harmonic set to mono linear PCM in `[-1, 1]`.
///
/// # Arguments
///
/// * `harmonics` - The active harmonics; mute/solo resolution is applied here
/// * `settings` - Fundamental, duration and master volume
/// * `sample_rate` - Output sample rate in Hz
///
/// # Returns
///
/// `floor(sample_rate * duration)` samples. A set with nothing audible
/// renders silence.
///
/// # Errors
///
/// `InvalidParameter` if the duration and sample rate yield no frames.
pub fn render(
    harmonics: &HarmonicSet,
    settings: &AudioSettings,
    sample_rate: u32,
) -> Result<Vec<f32>> {
    let duration = settings.duration;
    let rate = sample_rate as f64;
    let frames = (rate * duration).floor();
    if !(frames.is_finite() && frames >= 1.0) {
        return Err(SynthError::invalid(format!(
            "{} s at {} Hz yields no frames",
            settings.duration, sample_rate
        )));
    }
    let num_frames = frames as usize;

    let partials: Vec<(f64, f64)> = audible_harmonics(harmonics)
        .into_iter()
        .map(|(h, amplitude)| {
            (
                h.frequency(settings.fundamental_frequency),
                amplitude as f64,
            )
        })
        .collect();

    let envelope = Envelope::new(num_frames, rate, duration);
    let volume = settings.master_volume;

    let mut samples = vec![0.0f32; num_frames];
    samples.par_iter_mut().enumerate().for_each(|(i, sample)| {
        let t = i as f64 / rate;
        let mix: f64 = partials
            .iter()
            .map(|&(frequency, amplitude)| amplitude * (TAU * frequency * t).sin())
            .sum();
        *sample = (mix * envelope.at(i) * volume) as f32;
    });

    normalize(&mut samples);
    Ok(samples)
}

/// Scales the buffer down so its peak sits at [`NORMALIZE_CEILING`].
///
/// Buffers already within the ceiling are left untouched.
///
/// # Returns
///
/// The gain that was applied (1.0 when untouched)
pub fn normalize(samples: &mut [f32]) -> f32 {
    let peak = peak(samples);
    if peak <= NORMALIZE_CEILING {
        return 1.0;
    }
    let gain = NORMALIZE_CEILING / peak;
    samples.par_iter_mut().for_each(|s| *s *= gain);
    gain
}

/// Largest absolute sample value.
pub fn peak(samples: &[f32]) -> f32 {
    samples
        .par_iter()
        .map(|s| s.abs())
        .reduce(|| 0.0, f32::max)
}

/// Linear fade-in/fade-out over the first and last 5 ms.
#[derive(Debug, Clone, Copy)]
struct Envelope {
    num_frames: usize,
    fade_frames: usize,
}

impl Envelope {
    fn new(num_frames: usize, rate: f64, duration: f64) -> Self {
        let fade_frames = if duration * 1000.0 > MIN_FADED_DURATION_MS {
            (rate * FADE_SECONDS).floor() as usize
        } else {
            0
        };
        Self {
            num_frames,
            fade_frames,
        }
    }

    #[inline]
    fn at(&self, i: usize) -> f64 {
        if self.fade_frames == 0 {
            return 1.0;
        }
        let fade = self.fade_frames as f64;
        if i < self.fade_frames {
            i as f64 / fade
        } else if i >= self.num_frames.saturating_sub(self.fade_frames) {
            // Last frame lands exactly on zero.
            (self.num_frames - 1 - i) as f64 / fade
        } else {
            1.0
        }
    }
}
