//! Delay-then-accrue regeneration timer.

use crate::config::RegenTuning;

/// Regeneration timer for one stat.
///
/// While `delay` is positive it counts down and nothing accrues. Once it
/// reaches zero the stat accrues `rate` per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegenTrack {
    tuning: RegenTuning,
    delay: f32,
}

impl RegenTrack {
    /// Creates a track with no pending delay.
    #[must_use]
    pub const fn new(tuning: RegenTuning) -> Self {
        Self { tuning, delay: 0.0 }
    }

    /// Remaining delay before regeneration resumes.
    #[must_use]
    pub const fn delay(&self) -> f32 {
        self.delay
    }

    /// Regeneration rate per second.
    #[must_use]
    pub const fn rate(&self) -> f32 {
        self.tuning.rate
    }

    /// Resets the delay after a spend; heavy spends use the long delay.
    pub fn suppress(&mut self, heavy: bool) {
        self.delay = if heavy {
            self.tuning.long_delay
        } else {
            self.tuning.short_delay
        };
    }

    /// Advances the timer and returns the amount regenerated this step.
    pub fn step(&mut self, dt: f32) -> f32 {
        if self.delay > 0.0 {
            self.delay = (self.delay - dt).max(0.0);
            return 0.0;
        }
        self.tuning.rate * dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_blocks_regen() {
        let mut track = RegenTrack::new(RegenTuning::new(10.0, 0.5, 2.0));
        assert!((track.step(0.1) - 1.0).abs() < 1e-6);

        track.suppress(false);
        assert_eq!(track.step(0.25), 0.0);
        assert_eq!(track.step(0.25), 0.0);
        assert!((track.step(0.1) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_heavy_spend_uses_long_delay() {
        let mut track = RegenTrack::new(RegenTuning::new(10.0, 0.5, 2.0));
        track.suppress(true);
        assert!((track.delay() - 2.0).abs() < f32::EPSILON);
    }
}
