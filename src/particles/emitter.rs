//! Continuous-rate emission scheduling.

use std::fmt;

use super::config::EmissionConfig;
use crate::math::Vec3;

/// Stable identifier of a registered particle effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(pub u32);

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Effect({})", self.0)
    }
}

/// A continuous emitter: `rate` particles per second at `origin`.
#[derive(Debug, Clone)]
pub struct Emitter {
    id: EffectId,
    origin: Vec3,
    config: EmissionConfig,
    interval: f32,
    timer: f32,
}

impl Emitter {
    /// Returns `None` for a non-positive rate.
    pub fn new(id: EffectId, origin: Vec3, config: EmissionConfig, rate: f32) -> Option<Self> {
        if !(rate > 0.0 && rate.is_finite()) {
            return None;
        }
        Some(Self {
            id,
            origin,
            config,
            interval: rate.recip(),
            timer: 0.0,
        })
    }

    pub fn id(&self) -> EffectId {
        self.id
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn config(&self) -> &EmissionConfig {
        &self.config
    }

    /// Advance the timer by `dt` and return how many particles are due.
    ///
    /// The fractional remainder stays in the timer for the next step.
    pub fn advance(&mut self, dt: f32) -> usize {
        if !(dt > 0.0 && dt.is_finite()) {
            return 0;
        }
        self.timer += dt;
        if self.timer < self.interval {
            return 0;
        }
        let due = (self.timer / self.interval).floor();
        self.timer -= due * self.interval;
        // Guard against the subtraction landing a hair below zero.
        self.timer = self.timer.max(0.0);
        due as usize
    }
}
