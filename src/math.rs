//! Small vector and sampling helpers shared by the particle and layout code.
//!
//! Vectors are plain `[f32; 3]` so they can be copied straight into the
//! flat buffers handed to the renderer.

use rand::Rng;

pub type Vec3 = [f32; 3];

pub const ZERO: Vec3 = [0.0, 0.0, 0.0];

#[inline]
pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn scale(v: Vec3, s: f32) -> Vec3 {
    [v[0] * s, v[1] * s, v[2] * s]
}

#[inline]
pub fn length(v: Vec3) -> f32 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

/// Unit vector in the direction of `v`, or zero for (near) zero-length input.
#[inline]
pub fn normalize_or_zero(v: Vec3) -> Vec3 {
    let len_sq = v[0] * v[0] + v[1] * v[1] + v[2] * v[2];
    if len_sq <= 1e-12 {
        return ZERO;
    }
    scale(v, len_sq.sqrt().recip())
}

/// Sample uniformly from `[lo, hi)`.
///
/// Unlike `Rng::random_range` this never panics on an empty range; `lo == hi`
/// simply returns `lo`.
#[inline]
pub fn uniform(rng: &mut impl Rng, lo: f32, hi: f32) -> f32 {
    lo + rng.random::<f32>() * (hi - lo)
}

/// Uniformly distributed unit vector on the sphere.
pub fn random_unit_vector(rng: &mut impl Rng) -> Vec3 {
    let z = uniform(rng, -1.0, 1.0);
    let theta = uniform(rng, 0.0, std::f32::consts::TAU);
    let r = (1.0 - z * z).max(0.0).sqrt();
    [r * theta.cos(), r * theta.sin(), z]
}
