//! Per-frame particle physics.
//!
//! Explicit Euler over every active slot: position from the old velocity,
//! then velocity from gravity plus an independent turbulence sample per axis.
//! Particles whose age reaches their lifetime are retired before their
//! opacity is computed, and the render buffer is rewritten for every slot.

use rand::Rng;

use super::buffer::ParticleBuffer;
use super::config::FadeMode;
use super::pool::ParticlePool;
use crate::math::{self, uniform};

/// Share of a particle's life spent fading in or out.
const FADE_WINDOW: f32 = 0.2;

/// Opacity for a particle at `age` of `lifetime`, always in `[0, 1]`.
pub fn fade_opacity(age: f32, lifetime: f32, fade: FadeMode) -> f32 {
    if lifetime <= 0.0 {
        return 0.0;
    }
    let progress = age / lifetime;
    let remaining = 1.0 - progress;

    if fade.fade_in && remaining > 1.0 - FADE_WINDOW {
        (progress / FADE_WINDOW).clamp(0.0, 1.0)
    } else if fade.fade_out && remaining < FADE_WINDOW {
        (remaining / FADE_WINDOW).clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// Advance every active slot by `dt` seconds and refresh `buffer`.
///
/// Returns the number of particles that died during this step.
pub fn integrate(
    pool: &mut ParticlePool,
    buffer: &mut ParticleBuffer,
    dt: f32,
    rng: &mut impl Rng,
) -> usize {
    let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

    pool.update_slots(|index, slot| {
        if !slot.active {
            buffer.clear(index);
            return false;
        }

        slot.position = math::add(slot.position, math::scale(slot.velocity, dt));

        let mut accel = slot.motion.gravity;
        let turbulence = slot.motion.turbulence;
        if turbulence > 0.0 {
            for component in accel.iter_mut() {
                *component += uniform(rng, -turbulence, turbulence);
            }
        }
        slot.velocity = math::add(slot.velocity, math::scale(accel, dt));

        slot.age += dt;
        if slot.age >= slot.lifetime {
            buffer.clear(index);
            return false;
        }

        slot.opacity = fade_opacity(slot.age, slot.lifetime, slot.motion.fade);
        buffer.write(index, slot);
        true
    })
}
