//! Particle effects: a shared slot pool, emitters and the physics step.
//!
//! Every effect draws from the same fixed-capacity pool in first-fit order.
//! When the pool is full further emission is dropped and counted; nothing
//! is queued for later.

mod buffer;
mod config;
mod emitter;
mod integrator;
mod pool;

pub use buffer::ParticleBuffer;
pub use config::{
    Color, ColorSpec, EmissionConfig, EmissionMode, EmissionOptions, EmitterShape, FadeMode,
    GravitySpec, MIN_LIFETIME, MotionParams, ValueRange,
};
pub use emitter::{EffectId, Emitter};
pub use integrator::fade_opacity;
pub use pool::{ParticlePool, ParticleSlot};

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::math::Vec3;

/// Pool, registered effects and output buffer for one scene.
pub struct ParticleSystem {
    pool: ParticlePool,
    buffer: ParticleBuffer,
    emitters: Vec<Emitter>,
    rng: StdRng,
    next_effect_id: u32,
    dropped: u64,
}

impl ParticleSystem {
    /// Create a system with `capacity` slots and a deterministic seed.
    pub fn new(capacity: usize, seed: u64) -> Self {
        Self {
            pool: ParticlePool::new(capacity),
            buffer: ParticleBuffer::new(capacity),
            emitters: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
            next_effect_id: 0,
            dropped: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    pub fn active_count(&self) -> usize {
        self.pool.active_count()
    }

    /// Particles requested while the pool was full.
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    /// Number of registered continuous effects.
    pub fn effect_count(&self) -> usize {
        self.emitters.len()
    }

    /// True while any particle is alive or any effect is registered.
    pub fn is_busy(&self) -> bool {
        self.pool.active_count() > 0 || !self.emitters.is_empty()
    }

    pub fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    pub fn buffer(&self) -> &ParticleBuffer {
        &self.buffer
    }

    /// Hand out the id the next effect will be registered under.
    pub fn reserve_effect_id(&mut self) -> EffectId {
        let id = EffectId(self.next_effect_id);
        self.next_effect_id = self.next_effect_id.wrapping_add(1);
        id
    }

    /// Emit according to `config`.
    ///
    /// A burst fills up to `min(count, free slots)` immediately and returns
    /// `None`. A continuous config registers an effect and returns its id.
    pub fn emit(&mut self, origin: Vec3, config: &EmissionConfig) -> Option<EffectId> {
        let id = self.reserve_effect_id();
        self.emit_as(id, origin, config).then_some(id)
    }

    /// Like [`emit`](Self::emit) with a previously reserved id.
    ///
    /// Returns true when a continuous effect was registered.
    pub fn emit_as(&mut self, id: EffectId, origin: Vec3, config: &EmissionConfig) -> bool {
        match config.mode {
            EmissionMode::Burst { count } => {
                let count = (count as usize).min(self.pool.capacity());
                self.spawn(origin, config, count);
                false
            }
            EmissionMode::Continuous { rate } => {
                match Emitter::new(id, origin, config.clone(), rate) {
                    Some(emitter) => {
                        self.emitters.push(emitter);
                        true
                    }
                    None => false,
                }
            }
            EmissionMode::Idle => false,
        }
    }

    /// Unregister a continuous effect. Its live particles run out their lifetimes.
    pub fn stop_effect(&mut self, id: EffectId) -> bool {
        let before = self.emitters.len();
        self.emitters.retain(|e| e.id() != id);
        self.emitters.len() != before
    }

    /// Run continuous emission, then integrate every active slot.
    pub fn tick(&mut self, dt: f32) -> &ParticleBuffer {
        let mut emitters = std::mem::take(&mut self.emitters);
        for emitter in &mut emitters {
            let due = emitter.advance(dt);
            if due > 0 {
                self.spawn(emitter.origin(), emitter.config(), due);
            }
        }
        self.emitters = emitters;

        integrator::integrate(&mut self.pool, &mut self.buffer, dt, &mut self.rng);
        &self.buffer
    }

    /// Retire every particle and unregister every effect.
    pub fn clear(&mut self) {
        self.pool.clear();
        self.emitters.clear();
        self.buffer.reset();
    }

    fn spawn(&mut self, origin: Vec3, config: &EmissionConfig, count: usize) {
        for emitted in 0..count {
            match self.pool.emit_first_fit(origin, config, &mut self.rng) {
                Some(index) => self.buffer.write(index, &self.pool.slots()[index]),
                None => {
                    self.dropped += (count - emitted) as u64;
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn burst(count: u32, life: f32) -> EmissionConfig {
        EmissionOptions {
            burst_count: count,
            spread: 1.5,
            life: ValueRange::new(life * 0.5, life),
            ..EmissionOptions::default()
        }
        .into()
    }

    #[test]
    fn test_burst_fills_and_drains() {
        let mut system = ParticleSystem::new(200, 42);
        let config = burst(200, 2.0);
        let origin = [3.0, 1.0, -2.0];

        assert_eq!(system.emit(origin, &config), None);
        assert_eq!(system.active_count(), 200);

        let limit = config.spread * 0.1;
        for slot in system.pool().slots() {
            for axis in 0..3 {
                assert!((slot.position[axis] - origin[axis]).abs() <= limit);
            }
        }

        let dt = 1.0 / 60.0;
        let mut elapsed = 0.0;
        while elapsed <= config.life.max + dt {
            system.tick(dt);
            elapsed += dt;
        }
        assert_eq!(system.active_count(), 0);
        assert!(!system.is_busy());
    }

    #[test]
    fn test_burst_larger_than_capacity() {
        let mut system = ParticleSystem::new(10, 1);
        system.emit([0.0; 3], &burst(50, 1.0));
        assert_eq!(system.active_count(), 10);

        // A second burst while full is dropped entirely.
        system.emit([0.0; 3], &burst(5, 1.0));
        assert_eq!(system.active_count(), 10);
        assert_eq!(system.dropped_count(), 5);
    }

    #[test]
    fn test_continuous_rate_saturates_capacity() {
        let mut system = ParticleSystem::new(5, 7);
        let config: EmissionConfig = EmissionOptions {
            rate: 10.0,
            life: ValueRange::new(5.0, 5.0),
            ..EmissionOptions::default()
        }
        .into();
        let id = system.emit([0.0; 3], &config);
        assert!(id.is_some());

        let mut peak = 0;
        for frame in 0..60 {
            system.tick(1.0 / 60.0);
            let active = system.active_count();
            assert!(active <= 5);
            if peak == 5 {
                assert_eq!(active, 5, "dropped below capacity at frame {frame}");
            }
            peak = peak.max(active);
        }
        assert_eq!(system.active_count(), 5);
        assert!(system.dropped_count() > 0);
    }

    #[test]
    fn test_zero_capacity_is_noop() {
        let mut system = ParticleSystem::new(0, 3);
        system.emit([0.0; 3], &burst(10, 1.0));
        let buffer = system.tick(0.1);
        assert!(buffer.is_empty());
        assert_eq!(system.active_count(), 0);
    }

    #[test]
    fn test_idle_config_registers_nothing() {
        let mut system = ParticleSystem::new(4, 3);
        let config: EmissionConfig = EmissionOptions {
            rate: -3.0,
            ..EmissionOptions::default()
        }
        .into();
        assert_eq!(system.emit([0.0; 3], &config), None);
        system.tick(1.0);
        assert_eq!(system.active_count(), 0);
        assert_eq!(system.effect_count(), 0);
    }

    #[test]
    fn test_stop_effect() {
        let mut system = ParticleSystem::new(16, 9);
        let config: EmissionConfig = EmissionOptions {
            rate: 30.0,
            life: ValueRange::new(0.2, 0.2),
            ..EmissionOptions::default()
        }
        .into();
        let id = system.emit([0.0; 3], &config).unwrap();
        system.tick(0.1);
        assert!(system.active_count() > 0);

        assert!(system.stop_effect(id));
        assert!(!system.stop_effect(id));
        for _ in 0..30 {
            system.tick(1.0 / 60.0);
        }
        assert_eq!(system.active_count(), 0);
    }

    #[test]
    fn test_effects_share_pool_first_fit() {
        let mut system = ParticleSystem::new(3, 5);
        system.emit([0.0; 3], &burst(2, 1.0));
        system.emit([10.0, 0.0, 0.0], &burst(2, 1.0));
        assert_eq!(system.active_count(), 3);
        assert_eq!(system.dropped_count(), 1);
        assert!(system.pool().slots()[2].position[0] > 5.0);
    }

    #[test]
    fn test_clear_keeps_buffer_allocation() {
        let mut system = ParticleSystem::new(16, 5);
        system.emit([1.0, 2.0, 3.0], &burst(16, 1.0));
        system.tick(0.1);
        let positions = system.buffer().positions().as_ptr();

        system.clear();
        assert_eq!(system.active_count(), 0);
        assert_eq!(system.buffer().positions().as_ptr(), positions);
        assert_eq!(system.buffer().len(), 16);
        assert!(system.buffer().positions().iter().all(|&v| v == 0.0));
        assert!(system.buffer().opacities().iter().all(|&v| v == 0.0));
    }
}
