//! Scene construction settings and decoding of dashboard option objects.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::JsValue;

use crate::error::{Result, SceneError};
use crate::graph::{GraphEdge, GraphNode};
use crate::layout::ForceLayoutConfig;

/// Default particle pool size.
pub const DEFAULT_CAPACITY: usize = 2_000;

/// Graphs up to this many nodes are laid out within a single frame at the default budget.
pub const SYNC_LAYOUT_NODE_LIMIT: usize = 64;

/// Layout runs whose whole budget costs at most this many pairwise force
/// evaluations (`iterations * nodes^2`) finish within a single frame.
/// Sized for [`SYNC_LAYOUT_NODE_LIMIT`] nodes at the default 50 iterations.
pub const SYNC_LAYOUT_WORK_LIMIT: u64 = (SYNC_LAYOUT_NODE_LIMIT * SYNC_LAYOUT_NODE_LIMIT * 50) as u64;

/// Iterations per frame for runs above [`SYNC_LAYOUT_WORK_LIMIT`].
pub const SLICED_ITERATIONS_PER_TICK: u32 = 5;

/// Fixed settings of one scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneConfig {
    /// Particle pool capacity.
    pub capacity: usize,
    /// Seed for particle sampling and layout seeding.
    pub seed: u64,
    /// Initial layout tunables.
    pub layout: ForceLayoutConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            seed: 0,
            layout: ForceLayoutConfig::default(),
        }
    }
}

/// A network topology as sent by the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Decode a JS value with serde, treating `undefined`/`null` as `T::default()`.
pub fn decode<T>(value: JsValue, what: &'static str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(|err| SceneError::invalid(what, err))
}
