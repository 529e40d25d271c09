//! Fixed-capacity particle arena.
//!
//! Slots are allocated once when the pool is created and recycled forever.
//! Emission activates the lowest-indexed inactive slot (first fit); death
//! clears the active flag and zeroes the fields the renderer reads.

use rand::Rng;

use super::config::{Color, EmissionConfig, EmitterShape, MotionParams};
use crate::math::{self, Vec3, ZERO, uniform};

/// Fraction of `spread` used to jitter the spawn position on each axis.
const POSITION_JITTER: f32 = 0.1;

/// One reusable particle record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleSlot {
    pub active: bool,
    pub position: Vec3,
    pub velocity: Vec3,
    pub age: f32,
    pub lifetime: f32,
    pub size: f32,
    pub color: Color,
    pub opacity: f32,
    pub motion: MotionParams,
}

impl ParticleSlot {
    /// An inactive slot: zero position, zero opacity.
    pub fn dead() -> Self {
        Self {
            active: false,
            position: ZERO,
            velocity: ZERO,
            age: 0.0,
            lifetime: 0.0,
            size: 0.0,
            color: Color::WHITE,
            opacity: 0.0,
            motion: MotionParams::default(),
        }
    }

    /// Overwrite every field with a fresh particle from `config`.
    pub fn spawn(&mut self, origin: Vec3, config: &EmissionConfig, rng: &mut impl Rng) {
        let jitter = config.spread * POSITION_JITTER;
        let offset = [
            uniform(rng, -jitter, jitter),
            uniform(rng, -jitter, jitter),
            uniform(rng, -jitter, jitter),
        ];

        *self = Self {
            active: true,
            position: math::add(origin, offset),
            velocity: initial_velocity(config, rng),
            age: 0.0,
            lifetime: config.life.sample(rng),
            size: config.size.sample(rng),
            color: config.sample_color(rng),
            opacity: if config.motion.fade.fade_in { 0.0 } else { 1.0 },
            motion: config.motion,
        };
    }
}

/// Derive the launch velocity from the emitter shape.
fn initial_velocity(config: &EmissionConfig, rng: &mut impl Rng) -> Vec3 {
    let base = config.speed;
    let spread = config.spread;
    match config.shape {
        EmitterShape::Sphere => {
            let speed = base * uniform(rng, 0.5, 1.0);
            math::scale(math::random_unit_vector(rng), speed)
        }
        EmitterShape::Cone => {
            let angle = uniform(rng, 0.0, std::f32::consts::TAU);
            let radius = uniform(rng, 0.0, spread);
            [angle.cos() * radius, uniform(rng, 0.0, base), angle.sin() * radius]
        }
        EmitterShape::Box => {
            let half = spread / 2.0;
            [
                uniform(rng, -half, half) * base,
                uniform(rng, -half, half) * base,
                uniform(rng, -half, half) * base,
            ]
        }
        EmitterShape::Plane => {
            let half = spread / 2.0;
            [uniform(rng, -half, half) * base, 0.0, uniform(rng, -half, half) * base]
        }
    }
}

/// The slot table.
pub struct ParticlePool {
    slots: Vec<ParticleSlot>,
    active_count: usize,
    /// Every slot below this index is active.
    first_free: usize,
}

impl ParticlePool {
    /// Create a pool with `capacity` dead slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![ParticleSlot::dead(); capacity],
            active_count: 0,
            first_free: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    pub fn slots(&self) -> &[ParticleSlot] {
        &self.slots
    }

    /// Visit every slot in index order. Active slots for which `keep`
    /// returns false are retired in place.
    ///
    /// Returns the number of slots retired.
    pub(crate) fn update_slots(&mut self, mut keep: impl FnMut(usize, &mut ParticleSlot) -> bool) -> usize {
        let mut retired = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if !keep(index, slot) && slot.active {
                *slot = ParticleSlot::dead();
                self.active_count -= 1;
                self.first_free = self.first_free.min(index);
                retired += 1;
            }
        }
        retired
    }

    /// Emit into a specific slot.
    ///
    /// An active slot is overwritten in place. Out-of-range indices are ignored.
    pub fn emit(&mut self, slot_index: usize, origin: Vec3, config: &EmissionConfig, rng: &mut impl Rng) {
        let Some(slot) = self.slots.get_mut(slot_index) else {
            return;
        };
        if !slot.active {
            self.active_count += 1;
        }
        slot.spawn(origin, config, rng);
        if slot_index == self.first_free {
            self.advance_first_free();
        }
    }

    /// Emit into the lowest-indexed inactive slot.
    ///
    /// Returns the slot used, or `None` when the pool is full.
    pub fn emit_first_fit(
        &mut self,
        origin: Vec3,
        config: &EmissionConfig,
        rng: &mut impl Rng,
    ) -> Option<usize> {
        let index = self.first_free;
        if index >= self.slots.len() {
            return None;
        }
        self.emit(index, origin, config, rng);
        Some(index)
    }

    /// Deactivate a slot and zero what the renderer reads.
    pub fn retire(&mut self, slot_index: usize) {
        if let Some(slot) = self.slots.get_mut(slot_index) {
            if slot.active {
                self.active_count -= 1;
            }
            *slot = ParticleSlot::dead();
            self.first_free = self.first_free.min(slot_index);
        }
    }

    /// Deactivate every slot.
    pub fn clear(&mut self) {
        self.slots.fill(ParticleSlot::dead());
        self.active_count = 0;
        self.first_free = 0;
    }

    fn advance_first_free(&mut self) {
        while self.first_free < self.slots.len() && self.slots[self.first_free].active {
            self.first_free += 1;
        }
    }
}
