//! Impulses and posture of a combatant.
//!
//! The combat core does not integrate movement. It accumulates impulses for
//! the host physics to drain and tracks the launched/knocked-down posture so
//! gating and presentation can react to it.

use brawl_common::Vec2;
use serde::{Deserialize, Serialize};

/// Body posture driven by launch and knockdown hits.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Posture {
    /// On foot.
    #[default]
    Standing,
    /// Airborne after a launch.
    Launched {
        /// Seconds until landing.
        remaining: f32,
    },
    /// On the ground after a knockdown.
    KnockedDown {
        /// Seconds until getting up.
        remaining: f32,
    },
}

impl Posture {
    /// True unless standing.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        !matches!(self, Self::Standing)
    }
}

/// Pending impulse and posture state.
#[derive(Debug, Clone, Default)]
pub struct Motion {
    impulse: Vec2,
    posture: Posture,
    heavy_receiver: bool,
}

impl Motion {
    /// Creates motion state. Without a heavy receiver, launch and knockdown
    /// only push; they never change posture.
    #[must_use]
    pub fn new(heavy_receiver: bool) -> Self {
        Self {
            heavy_receiver,
            ..Default::default()
        }
    }

    /// True if launch and knockdown can drive posture.
    #[must_use]
    pub fn has_heavy_receiver(&self) -> bool {
        self.heavy_receiver
    }

    /// Current posture.
    #[must_use]
    pub fn posture(&self) -> Posture {
        self.posture
    }

    /// Impulse accumulated since the last drain.
    #[must_use]
    pub fn pending_impulse(&self) -> Vec2 {
        self.impulse
    }

    /// Adds an impulse.
    pub fn push(&mut self, impulse: Vec2) {
        self.impulse += impulse;
    }

    /// Drains the accumulated impulse.
    pub fn take_impulse(&mut self) -> Vec2 {
        std::mem::take(&mut self.impulse)
    }

    /// Enters the launched posture.
    pub fn launch(&mut self, hang_time: f32) {
        self.posture = Posture::Launched {
            remaining: hang_time,
        };
    }

    /// Enters the knocked-down posture.
    pub fn knock_down(&mut self, time: f32) {
        self.posture = Posture::KnockedDown { remaining: time };
    }

    /// Advances posture timers. Returns true when the posture ended this step.
    pub fn tick(&mut self, dt: f32) -> bool {
        let remaining = match &mut self.posture {
            Posture::Standing => return false,
            Posture::Launched { remaining } | Posture::KnockedDown { remaining } => {
                *remaining -= dt;
                *remaining
            },
        };
        if remaining <= 0.0 {
            self.posture = Posture::Standing;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impulses_accumulate_and_drain() {
        let mut m = Motion::new(true);
        m.push(Vec2::X);
        m.push(Vec2::Y * 2.0);
        assert_eq!(m.take_impulse(), Vec2::new(1.0, 2.0));
        assert_eq!(m.pending_impulse(), Vec2::ZERO);
    }

    #[test]
    fn test_posture_recovers() {
        let mut m = Motion::new(true);
        m.launch(0.5);
        assert!(m.posture().is_disabled());
        assert!(!m.tick(0.25));
        assert!(m.tick(0.25));
        assert_eq!(m.posture(), Posture::Standing);
    }
}
