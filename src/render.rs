//! Hand-off to the external scene renderer.
//!
//! The simulation never draws. After every step it passes its buffers to a
//! [`RenderBridge`]; the dashboard's renderer decides what to do with them.

use js_sys::{Array, Float32Array, Function};
use wasm_bindgen::JsValue;

use crate::layout::NodePositions;
use crate::particles::ParticleBuffer;

/// Receiver of per-frame simulation output.
pub trait RenderBridge {
    /// Called once per simulation step with every particle slot.
    fn present_particles(&mut self, particles: &ParticleBuffer);

    /// Called when a layout run finishes and its positions are published.
    fn present_layout(&mut self, positions: &NodePositions);
}

/// Discards everything. For hosts that read the buffers themselves.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBridge;

impl RenderBridge for NullBridge {
    fn present_particles(&mut self, _particles: &ParticleBuffer) {}

    fn present_layout(&mut self, _positions: &NodePositions) {}
}

/// Forwards output to JavaScript callbacks.
///
/// `on_particles(positions, colors, sizes, opacities)` receives zero-copy
/// Float32Array views; `on_layout(ids, coords)` receives a Uint32Array of node
/// ids and a Float32Array of `[x, y, z, ...]`.
#[derive(Default)]
pub struct JsRenderBridge {
    on_particles: Option<Function>,
    on_layout: Option<Function>,
}

impl JsRenderBridge {
    pub fn new(on_particles: Option<Function>, on_layout: Option<Function>) -> Self {
        Self {
            on_particles,
            on_layout,
        }
    }

    fn call(callback: &Function, args: &Array, what: &str) {
        if let Err(err) = callback.apply(&JsValue::NULL, args) {
            log::warn!("{what} callback threw: {err:?}");
        }
    }
}

impl RenderBridge for JsRenderBridge {
    fn present_particles(&mut self, particles: &ParticleBuffer) {
        let Some(callback) = &self.on_particles else {
            return;
        };
        // SAFETY: the views alias wasm memory and are invalidated by any Rust
        // allocation. They are handed to the callback and not kept here; the
        // callback must upload or copy them before returning.
        let (positions, colors, sizes, opacities) = unsafe {
            (
                Float32Array::view(particles.positions()),
                Float32Array::view(particles.colors()),
                Float32Array::view(particles.sizes()),
                Float32Array::view(particles.opacities()),
            )
        };
        let args = Array::of4(&positions, &colors, &sizes, &opacities);
        Self::call(callback, &args, "particle render");
    }

    fn present_layout(&mut self, positions: &NodePositions) {
        let Some(callback) = &self.on_layout else {
            return;
        };
        let ids: Vec<u32> = positions.ids().iter().map(|id| id.raw()).collect();
        let ids = js_sys::Uint32Array::from(&ids[..]);
        let coords = Float32Array::from(positions.coords());
        let args = Array::of2(&ids, &coords);
        Self::call(callback, &args, "layout render");
    }
}
