//! Emission descriptors.
//!
//! `EmissionOptions` is the loosely-typed shape the dashboard sends over the
//! wasm boundary. Converting it into an `EmissionConfig` applies every clamp
//! and default, so the simulation only ever sees a well-formed descriptor.

use rand::Rng;
use serde::Deserialize;

use crate::math::{Vec3, uniform};

/// Shortest lifetime a particle may be given, in seconds.
pub const MIN_LIFETIME: f32 = 0.001;

/// Initial velocity distribution of an emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmitterShape {
    #[default]
    Sphere,
    Cone,
    Box,
    Plane,
}

/// Inclusive `[min, max]` range sampled once per emitted particle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ValueRange {
    pub min: f32,
    pub max: f32,
}

impl ValueRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Raise `min` to `floor` and an inverted `max` to `min`.
    pub fn sanitized(self, floor: f32) -> Self {
        let min = if self.min.is_finite() { self.min.max(floor) } else { floor };
        let max = if self.max.is_finite() { self.max.max(min) } else { min };
        Self { min, max }
    }

    /// `min + U(0,1) * (max - min)`.
    #[inline]
    pub fn sample(&self, rng: &mut impl Rng) -> f32 {
        uniform(rng, self.min, self.max)
    }
}

/// Linear RGB color with channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color(pub [f32; 3]);

impl Color {
    pub const WHITE: Color = Color([1.0, 1.0, 1.0]);

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .ok()
                .map(|v| v as f32 / 255.0)
        };
        Some(Self([channel(0)?, channel(2)?, channel(4)?]))
    }

    pub fn from_rgb(rgb: [f32; 3]) -> Option<Self> {
        if rgb.iter().all(|c| c.is_finite()) {
            Some(Self(rgb.map(|c| c.clamp(0.0, 1.0))))
        } else {
            None
        }
    }
}

/// A color as written by the front end: hex string or `[r, g, b]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ColorSpec {
    Hex(String),
    Rgb([f32; 3]),
}

impl ColorSpec {
    fn resolve(&self) -> Option<Color> {
        match self {
            ColorSpec::Hex(hex) => Color::from_hex(hex),
            ColorSpec::Rgb(rgb) => Color::from_rgb(*rgb),
        }
    }
}

/// Gravity as a full vector or as a vertical acceleration.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum GravitySpec {
    Vector(Vec3),
    Vertical(f32),
}

impl GravitySpec {
    fn resolve(self) -> Vec3 {
        let v = match self {
            GravitySpec::Vector(v) => v,
            GravitySpec::Vertical(y) => [0.0, y, 0.0],
        };
        v.map(|c| if c.is_finite() { c } else { 0.0 })
    }
}

/// Raw emission options, deserialized from the dashboard.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmissionOptions {
    pub rate: f32,
    pub burst_count: u32,
    pub spread: f32,
    pub speed: f32,
    pub shape: EmitterShape,
    pub size: ValueRange,
    pub life: ValueRange,
    pub colors: Vec<ColorSpec>,
    pub gravity: GravitySpec,
    pub turbulence: f32,
    pub fade_in: bool,
    pub fade_out: bool,
}

impl Default for EmissionOptions {
    fn default() -> Self {
        Self {
            rate: 0.0,
            burst_count: 0,
            spread: 1.0,
            speed: 1.0,
            shape: EmitterShape::Sphere,
            size: ValueRange::new(0.05, 0.1),
            life: ValueRange::new(1.0, 2.0),
            colors: Vec::new(),
            gravity: GravitySpec::Vector([0.0, -1.0, 0.0]),
            turbulence: 0.0,
            fade_in: false,
            fade_out: true,
        }
    }
}

/// How a configuration produces particles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EmissionMode {
    /// `rate` particles per second while the effect is registered.
    Continuous { rate: f32 },
    /// `count` particles at once, then nothing.
    Burst { count: u32 },
    /// Emits nothing (`rate <= 0` and no burst).
    Idle,
}

/// Opacity ramps applied over a particle's life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FadeMode {
    pub fade_in: bool,
    pub fade_out: bool,
}

/// Per-particle motion parameters, copied into each slot on emission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionParams {
    pub gravity: Vec3,
    pub turbulence: f32,
    pub fade: FadeMode,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            gravity: [0.0, 0.0, 0.0],
            turbulence: 0.0,
            fade: FadeMode::default(),
        }
    }
}

/// Sanitized, immutable emission descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionConfig {
    pub mode: EmissionMode,
    pub spread: f32,
    pub speed: f32,
    pub shape: EmitterShape,
    pub size: ValueRange,
    pub life: ValueRange,
    /// Never empty.
    pub colors: Vec<Color>,
    pub motion: MotionParams,
}

impl EmissionConfig {
    /// Pick one of the configured colors.
    pub fn sample_color(&self, rng: &mut impl Rng) -> Color {
        match self.colors.len() {
            0 => Color::WHITE,
            1 => self.colors[0],
            n => self.colors[rng.random_range(0..n)],
        }
    }
}

impl Default for EmissionConfig {
    fn default() -> Self {
        EmissionOptions::default().into()
    }
}

fn non_negative(name: &str, value: f32) -> f32 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        log::warn!("emission option `{name}` = {value} clamped to 0");
        0.0
    }
}

impl From<EmissionOptions> for EmissionConfig {
    fn from(options: EmissionOptions) -> Self {
        let rate = non_negative("rate", options.rate);
        let mode = if options.burst_count > 0 {
            EmissionMode::Burst {
                count: options.burst_count,
            }
        } else if rate > 0.0 {
            EmissionMode::Continuous { rate }
        } else {
            EmissionMode::Idle
        };

        if options.life.max < options.life.min {
            log::debug!(
                "life range {}..{} inverted, using max = min",
                options.life.min,
                options.life.max
            );
        }

        let mut colors: Vec<Color> = options.colors.iter().filter_map(ColorSpec::resolve).collect();
        if colors.len() < options.colors.len() {
            log::warn!(
                "skipped {} unparsable particle colors",
                options.colors.len() - colors.len()
            );
        }
        if colors.is_empty() {
            colors.push(Color::WHITE);
        }

        Self {
            mode,
            spread: non_negative("spread", options.spread),
            speed: non_negative("speed", options.speed),
            shape: options.shape,
            size: options.size.sanitized(0.0),
            life: options.life.sanitized(MIN_LIFETIME),
            colors,
            motion: MotionParams {
                gravity: options.gravity.resolve(),
                turbulence: non_negative("turbulence", options.turbulence),
                fade: FadeMode {
                    fade_in: options.fade_in,
                    fade_out: options.fade_out,
                },
            },
        }
    }
}
