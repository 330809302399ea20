//! Parameter automation.
//!
//! Each mutable audio parameter carries at most one pending linear ramp.
//! Scheduling a new ramp cancels the pending one and starts from wherever
//! the old ramp had reached, so the latest request always wins and the
//! value never jumps.

/// A linear transition scheduled on the graph's sample clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ramp {
    /// Value at `start_frame`.
    pub from: f64,
    /// Value at and after `start_frame + frames`.
    pub to: f64,
    /// Clock frame at which the ramp begins.
    pub start_frame: u64,
    /// Length of the ramp in frames.
    pub frames: u64,
}

impl Ramp {
    /// Frame at which the ramp reaches its target.
    pub fn end_frame(&self) -> u64 {
        self.start_frame + self.frames
    }

    fn value_at(&self, frame: u64) -> f64 {
        if frame >= self.end_frame() {
            return self.to;
        }
        if frame <= self.start_frame {
            return self.from;
        }
        let progress = (frame - self.start_frame) as f64 / self.frames as f64;
        self.from + (self.to - self.from) * progress
    }
}

/// An automatable parameter value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Param {
    value: f64,
    ramp: Option<Ramp>,
}

impl Param {
    /// Creates a parameter resting at `value`.
    pub fn new(value: f64) -> Self {
        Self { value, ramp: None }
    }

    /// Value at a clock frame.
    #[inline]
    pub fn value_at(&self, frame: u64) -> f64 {
        match &self.ramp {
            Some(ramp) => ramp.value_at(frame),
            None => self.value,
        }
    }

    /// The value the parameter is heading to.
    pub fn target(&self) -> f64 {
        self.ramp.map_or(self.value, |r| r.to)
    }

    /// The pending ramp, if any.
    pub fn ramp(&self) -> Option<&Ramp> {
        self.ramp.as_ref()
    }

    /// Schedules a linear ramp to `target`, replacing any pending ramp.
    ///
    /// The ramp starts at the value the parameter has at `now`.
    pub fn ramp_to(&mut self, target: f64, now: u64, frames: u64) {
        let from = self.value_at(now);
        self.value = from;
        self.ramp = Some(Ramp {
            from,
            to: target,
            start_frame: now,
            frames,
        });
    }

    /// Folds a finished ramp into the resting value.
    pub fn settle(&mut self, now: u64) {
        if let Some(ramp) = self.ramp {
            if now >= ramp.end_frame() {
                self.value = ramp.to;
                self.ramp = None;
            }
        }
    }

    /// Whether the parameter is resting (no ramp in flight) at `now`.
    pub fn is_settled(&self, now: u64) -> bool {
        self.ramp.map_or(true, |r| now >= r.end_frame())
    }
}
