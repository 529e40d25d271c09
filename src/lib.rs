//! CulturalOS Scene - WASM Module
//!
//! Simulation core behind the dashboard's ambient visuals: particle effects
//! fired by cultural events and a 3D force-directed layout of the network
//! graph. It is compiled to WebAssembly and exposes a JavaScript-friendly API
//! via wasm-bindgen. Nothing here draws; output goes to the host's renderer.
//!
//! # Architecture
//!
//! - `particles`: fixed-capacity particle pool, emitters and physics step
//! - `graph`: layout graph on petgraph's StableGraph with SoA positions
//! - `layout`: force-directed solver, resumable across frames
//! - `spatial`: R-tree over laid-out nodes for picking
//! - `scheduler`: frame timing state machine
//! - `scene`: request queue and per-frame orchestration
//! - `render`: hand-off of buffers to the renderer

use js_sys::{Float32Array, Function};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub mod config;
pub mod error;
pub mod graph;
pub mod layout;
pub mod logging;
pub mod math;
pub mod particles;
pub mod render;
pub mod scene;
pub mod scheduler;
pub mod spatial;

use config::{GraphData, SceneConfig};
use graph::NodeId;
use layout::ForceLayoutConfig;
use particles::{EffectId, EmissionConfig, EmissionOptions};
use render::JsRenderBridge;
use scene::Scene;

/// Initialize the WASM module: console logging and the panic hook.
#[wasm_bindgen(start)]
pub fn init() {
    logging::init(log::LevelFilter::Info);
}

fn random_seed() -> u64 {
    (js_sys::Math::random() * u32::MAX as f64) as u64
}

/// One dashboard visualization: particles plus the network layout.
///
/// Methods other than `frame` and `tick` only queue work; it takes effect on
/// the next frame.
#[wasm_bindgen]
pub struct DashboardScene {
    scene: Scene,
    bridge: JsRenderBridge,
}

#[wasm_bindgen]
impl DashboardScene {
    /// Create a scene with `capacity` particle slots.
    ///
    /// Without a seed, one is drawn from `Math.random()`.
    #[wasm_bindgen(constructor)]
    pub fn new(capacity: usize, seed: Option<u32>) -> Self {
        let seed = seed.map(u64::from).unwrap_or_else(random_seed);
        Self {
            scene: Scene::new(SceneConfig {
                capacity,
                seed,
                ..SceneConfig::default()
            }),
            bridge: JsRenderBridge::default(),
        }
    }

    /// Register the renderer callbacks.
    ///
    /// `onParticles(positions, colors, sizes, opacities)` runs every frame
    /// with zero-copy views; `onLayout(ids, coords)` runs when a layout is
    /// published. Either may be omitted.
    #[wasm_bindgen(js_name = setRenderCallbacks)]
    pub fn set_render_callbacks(&mut self, on_particles: Option<Function>, on_layout: Option<Function>) {
        self.bridge = JsRenderBridge::new(on_particles, on_layout);
    }

    // =========================================================================
    // Particle Effects
    // =========================================================================

    /// Queue an emission at `(x, y, z)`.
    ///
    /// Returns the effect id, usable with `stopEffect` for continuous
    /// effects, or None if the options could not be read.
    pub fn emit(&mut self, x: f32, y: f32, z: f32, options: JsValue) -> Option<u32> {
        match config::decode::<EmissionOptions>(options, "emission options") {
            Ok(options) => {
                let config = EmissionConfig::from(options);
                Some(self.scene.request_emit([x, y, z], config).0)
            }
            Err(err) => {
                log::warn!("{err}");
                None
            }
        }
    }

    /// Queue removal of a continuous effect.
    #[wasm_bindgen(js_name = stopEffect)]
    pub fn stop_effect(&mut self, effect_id: u32) {
        self.scene.request_stop_effect(EffectId(effect_id));
    }

    /// Queue removal of every particle and effect.
    #[wasm_bindgen(js_name = clearParticles)]
    pub fn clear_particles(&mut self) {
        self.scene.request_clear_particles();
    }

    #[wasm_bindgen(js_name = activeParticleCount)]
    pub fn active_particle_count(&self) -> usize {
        self.scene.particles().active_count()
    }

    /// Particles that could not be emitted because the pool was full.
    #[wasm_bindgen(js_name = droppedParticleCount)]
    pub fn dropped_particle_count(&self) -> f64 {
        self.scene.particles().dropped_count() as f64
    }

    pub fn capacity(&self) -> usize {
        self.scene.particles().capacity()
    }

    // =========================================================================
    // Particle Buffer Access (Zero-Copy)
    // =========================================================================

    /// Get a zero-copy view of particle positions `[x, y, z, ...]`.
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    /// Use immediately for GPU upload, do not store.
    #[wasm_bindgen(js_name = getParticlePositionsView)]
    pub fn get_particle_positions_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.scene.particles().buffer().positions()) }
    }

    /// Get a zero-copy view of particle colors `[r, g, b, ...]`.
    #[wasm_bindgen(js_name = getParticleColorsView)]
    pub fn get_particle_colors_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.scene.particles().buffer().colors()) }
    }

    /// Get a zero-copy view of particle sizes.
    #[wasm_bindgen(js_name = getParticleSizesView)]
    pub fn get_particle_sizes_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.scene.particles().buffer().sizes()) }
    }

    /// Get a zero-copy view of particle opacities. Inactive slots are 0.
    #[wasm_bindgen(js_name = getParticleOpacitiesView)]
    pub fn get_particle_opacities_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.scene.particles().buffer().opacities()) }
    }

    /// Get a pointer to the particle positions buffer.
    ///
    /// Used for creating views after WASM memory growth.
    #[wasm_bindgen(js_name = particlePositionsPtr)]
    pub fn particle_positions_ptr(&self) -> *const f32 {
        self.scene.particles().buffer().positions().as_ptr()
    }

    /// Number of particle slots in every buffer.
    #[wasm_bindgen(js_name = particleSlotCount)]
    pub fn particle_slot_count(&self) -> usize {
        self.scene.particles().buffer().len()
    }

    // =========================================================================
    // Graph Layout
    // =========================================================================

    /// Queue a new topology `{ nodes: [{ id, position? }], edges: [{ fromId, toId, strength }] }`.
    ///
    /// Returns false if the object could not be read.
    #[wasm_bindgen(js_name = setGraph)]
    pub fn set_graph(&mut self, graph: JsValue) -> bool {
        match config::decode::<GraphData>(graph, "graph") {
            Ok(GraphData { nodes, edges }) => {
                self.scene.request_graph(nodes, edges);
                true
            }
            Err(err) => {
                log::warn!("{err}");
                false
            }
        }
    }

    /// Queue new solver tunables `{ kRep, kAtt, stepSize, damping, iterations }`.
    ///
    /// They apply to the next topology. Returns false if the object could not be read.
    #[wasm_bindgen(js_name = setLayoutOptions)]
    pub fn set_layout_options(&mut self, options: JsValue) -> bool {
        match config::decode::<ForceLayoutConfig>(options, "layout options") {
            Ok(config) => {
                self.scene.request_layout_config(config);
                true
            }
            Err(err) => {
                log::warn!("{err}");
                false
            }
        }
    }

    /// True while a layout run has iterations left.
    #[wasm_bindgen(js_name = isLayoutPending)]
    pub fn is_layout_pending(&self) -> bool {
        self.scene.is_layout_pending()
    }

    /// Node ids of the published layout, in the order of `nodePositions`.
    #[wasm_bindgen(js_name = nodeIds)]
    pub fn node_ids(&self) -> Vec<u32> {
        self.scene.layout().ids().iter().map(|id| id.raw()).collect()
    }

    /// Copy of the published positions `[x, y, z, ...]`.
    #[wasm_bindgen(js_name = nodePositions)]
    pub fn node_positions(&self) -> Vec<f32> {
        self.scene.layout().coords().to_vec()
    }

    /// Published position of one node as `[x, y, z]`.
    #[wasm_bindgen(js_name = getNodePosition)]
    pub fn get_node_position(&self, node_id: u32) -> Option<Vec<f32>> {
        self.scene.layout().get(NodeId(node_id)).map(|p| p.to_vec())
    }

    // =========================================================================
    // Spatial Queries
    // =========================================================================

    /// Find the nearest node to a point.
    ///
    /// Returns the node ID, or None if no layout has been published.
    #[wasm_bindgen(js_name = findNearestNode)]
    pub fn find_nearest_node(&self, x: f32, y: f32, z: f32) -> Option<u32> {
        self.scene.find_nearest_node([x, y, z]).map(NodeId::raw)
    }

    /// Find the nearest node within a maximum distance.
    #[wasm_bindgen(js_name = findNearestNodeWithin)]
    pub fn find_nearest_node_within(&self, x: f32, y: f32, z: f32, max_distance: f32) -> Option<u32> {
        self.scene
            .find_nearest_node_within([x, y, z], max_distance)
            .map(NodeId::raw)
    }

    /// Find all nodes within a radius.
    #[wasm_bindgen(js_name = findNodesInRadius)]
    pub fn find_nodes_in_radius(&self, x: f32, y: f32, z: f32, radius: f32) -> Vec<u32> {
        self.scene
            .find_nodes_in_radius([x, y, z], radius)
            .into_iter()
            .map(NodeId::raw)
            .collect()
    }

    /// Bounds of the published layout as `[minX, minY, minZ, maxX, maxY, maxZ]`.
    #[wasm_bindgen(js_name = getLayoutBounds)]
    pub fn get_layout_bounds(&self) -> Option<Vec<f32>> {
        self.scene
            .layout_bounds()
            .map(|(min, max)| min.into_iter().chain(max).collect())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Mark the visualization visible or hidden.
    #[wasm_bindgen(js_name = setVisible)]
    pub fn set_visible(&mut self, visible: bool) {
        self.scene.set_visible(visible);
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.scene.is_running()
    }

    pub fn start(&mut self) -> bool {
        self.scene.start()
    }

    /// Stop immediately. Queued requests are dropped.
    pub fn stop(&mut self) {
        self.scene.stop();
    }

    /// Stop for good. The scene ignores every later call.
    pub fn dispose(&mut self) {
        self.scene.dispose();
        self.bridge = JsRenderBridge::default();
    }

    /// Handle a `requestAnimationFrame` callback.
    ///
    /// Returns true if another callback should be requested.
    pub fn frame(&mut self, now_ms: f64) -> bool {
        self.scene.frame(now_ms, &mut self.bridge)
    }

    /// Advance by `dt` seconds without the scheduler, for hosts with their own loop.
    pub fn tick(&mut self, dt: f32) {
        let dt = if dt.is_finite() { dt.clamp(0.0, scheduler::MAX_FRAME_DT) } else { 0.0 };
        self.scene.step(dt, &mut self.bridge);
    }
}

#[derive(Serialize)]
struct PlacedNode {
    id: u32,
    position: [f32; 3],
}

/// Lay out a graph synchronously and return `[{ id, position: [x, y, z] }]`.
///
/// Runs the whole iteration budget in one call; prefer `DashboardScene.setGraph`
/// for graphs beyond a few dozen nodes.
#[wasm_bindgen(js_name = solveLayout)]
pub fn solve_layout(graph: JsValue, options: JsValue, seed: u32) -> Result<JsValue, JsValue> {
    let GraphData { nodes, edges } =
        config::decode(graph, "graph").map_err(|err| JsValue::from_str(&err.to_string()))?;
    let layout_config: ForceLayoutConfig = config::decode(options, "layout options")
        .map_err(|err| JsValue::from_str(&err.to_string()))?;

    let mut rng = StdRng::seed_from_u64(u64::from(seed));
    let positions = layout::solve(&nodes, &edges, &layout_config, &mut rng);
    let placed: Vec<PlacedNode> = positions
        .iter()
        .map(|(id, position)| PlacedNode {
            id: id.raw(),
            position,
        })
        .collect();
    serde_wasm_bindgen::to_value(&placed).map_err(|err| JsValue::from_str(&err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphEdge, GraphNode};
    use crate::layout::NodePositions;
    use crate::particles::{ParticleBuffer, ValueRange};
    use crate::render::RenderBridge;

    #[derive(Default)]
    struct CountingBridge {
        frames: usize,
        peak_active: usize,
        layouts: usize,
    }

    impl RenderBridge for CountingBridge {
        fn present_particles(&mut self, particles: &ParticleBuffer) {
            self.frames += 1;
            let active = particles.opacities().iter().filter(|&&o| o > 0.0).count();
            self.peak_active = self.peak_active.max(active);
        }

        fn present_layout(&mut self, _positions: &NodePositions) {
            self.layouts += 1;
        }
    }

    /// A dashboard session: the network view opens, an event fires a burst and
    /// a continuous effect, the topology grows, then the view closes.
    #[test]
    fn test_dashboard_session() {
        let mut scene = Scene::new(SceneConfig {
            capacity: 300,
            seed: 42,
            ..SceneConfig::default()
        });
        let mut bridge = CountingBridge::default();
        scene.set_visible(true);

        let nodes: Vec<GraphNode> = (0..8u32).map(GraphNode::new).collect();
        let edges: Vec<GraphEdge> = (1..8u32).map(|i| GraphEdge::new(0, i, 0.8)).collect();
        scene.request_graph(nodes.clone(), edges.clone());

        let burst: EmissionConfig = serde_json::from_str::<EmissionOptions>(
            r##"{ "burstCount": 120, "colors": ["#ffcc00", [0.2, 0.4, 1.0]], "life": { "min": 0.5, "max": 1.0 } }"##,
        )
        .unwrap()
        .into();
        scene.request_emit([0.0, 2.0, 0.0], burst);

        let stream: EmissionConfig = EmissionOptions {
            rate: 30.0,
            shape: particles::EmitterShape::Cone,
            life: ValueRange::new(0.5, 0.5),
            ..EmissionOptions::default()
        }
        .into();
        let stream_id = scene.request_emit([0.0; 3], stream);

        let mut now = 1000.0;
        for _ in 0..30 {
            assert!(scene.frame(now, &mut bridge));
            now += 1000.0 / 60.0;
        }
        assert_eq!(bridge.layouts, 1);
        assert_eq!(scene.layout().len(), 8);
        assert!(bridge.peak_active >= 120);
        assert!(scene.particles().active_count() <= 300);

        // Picking reads the published layout.
        let hub = scene.layout().get(NodeId(0)).unwrap();
        assert_eq!(scene.find_nearest_node(hub), Some(NodeId(0)));

        let mut grown = nodes;
        grown.push(GraphNode::new(8));
        let mut grown_edges = edges;
        grown_edges.push(GraphEdge::new(7, 8, 1.0));
        scene.request_graph(grown, grown_edges);
        scene.request_stop_effect(stream_id);
        scene.frame(now, &mut bridge);
        assert_eq!(bridge.layouts, 2);
        assert_eq!(scene.layout().len(), 9);
        assert_eq!(scene.particles().effect_count(), 0);

        scene.set_visible(false);
        let mut frames = 0;
        while scene.frame(now, &mut bridge) {
            now += 1000.0 / 60.0;
            frames += 1;
            assert!(frames < 600, "scene never went idle");
        }
        assert_eq!(scene.particles().active_count(), 0);
        assert!(!scene.is_running());
    }

    #[test]
    fn test_solve_layout_matches_time_sliced_scene() {
        let nodes: Vec<GraphNode> = (0..80u32).map(GraphNode::new).collect();
        let edges: Vec<GraphEdge> = (1..80u32).map(|i| GraphEdge::new((i - 1) / 3, i, 1.0)).collect();

        let options = ForceLayoutConfig::default();
        let mut rng = StdRng::seed_from_u64(7);
        let direct = layout::solve(&nodes, &edges, &options, &mut rng);

        let mut rng = StdRng::seed_from_u64(7);
        let mut run = layout::LayoutRun::new(&nodes, &edges, None, options, &mut rng);
        let mut slices = 0;
        while !run.step(config::SLICED_ITERATIONS_PER_TICK) {
            slices += 1;
        }
        assert_eq!(slices + 1, 10);
        assert_eq!(run.positions(), direct);
        assert!(direct.coords().iter().all(|c| c.is_finite()));
    }
}
