//! Per-frame orchestration of particles and graph layout.
//!
//! All simulation state is owned here and only changes inside [`Scene::step`].
//! Callers outside the frame callback (UI handlers) enqueue requests, which
//! are applied in order at the start of the next step. Stopping the scene
//! drops every queued request.

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::VecDeque;

use crate::config::{SLICED_ITERATIONS_PER_TICK, SYNC_LAYOUT_WORK_LIMIT, SceneConfig};
use crate::graph::{GraphEdge, GraphNode, NodeId};
use crate::layout::{ForceLayoutConfig, LayoutRun, NodePositions};
use crate::math::Vec3;
use crate::particles::{EffectId, EmissionConfig, ParticleSystem};
use crate::render::RenderBridge;
use crate::scheduler::FrameScheduler;
use crate::spatial::SpatialIndex;

/// Seed offset separating the layout stream from the particle stream.
const LAYOUT_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Pairwise force evaluations for the whole budget of `run`.
fn layout_work(run: &LayoutRun) -> u64 {
    let n = run.graph().node_count() as u64;
    n * n * u64::from(run.config().iterations)
}

/// A deferred change, applied at the start of the next step.
#[derive(Debug, Clone)]
pub enum SceneRequest {
    Emit {
        id: EffectId,
        origin: Vec3,
        config: EmissionConfig,
    },
    StopEffect(EffectId),
    ClearParticles,
    SetGraph {
        nodes: Vec<GraphNode>,
        edges: Vec<GraphEdge>,
    },
    SetLayoutConfig(ForceLayoutConfig),
}

pub struct Scene {
    particles: ParticleSystem,
    layout_config: ForceLayoutConfig,
    layout_run: Option<LayoutRun>,
    layout: NodePositions,
    spatial: SpatialIndex,
    layout_rng: StdRng,
    scheduler: FrameScheduler,
    requests: VecDeque<SceneRequest>,
    visible: bool,
}

impl Scene {
    pub fn new(config: SceneConfig) -> Self {
        Self {
            particles: ParticleSystem::new(config.capacity, config.seed),
            layout_config: config.layout.sanitized(),
            layout_run: None,
            layout: NodePositions::default(),
            spatial: SpatialIndex::new(),
            layout_rng: StdRng::seed_from_u64(config.seed ^ LAYOUT_SEED_SALT),
            scheduler: FrameScheduler::new(),
            requests: VecDeque::new(),
            visible: false,
        }
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Queue an emission. The returned id can later stop a continuous effect.
    pub fn request_emit(&mut self, origin: Vec3, config: EmissionConfig) -> EffectId {
        let id = self.particles.reserve_effect_id();
        self.enqueue(SceneRequest::Emit { id, origin, config });
        id
    }

    pub fn request_stop_effect(&mut self, id: EffectId) {
        self.enqueue(SceneRequest::StopEffect(id));
    }

    pub fn request_clear_particles(&mut self) {
        self.enqueue(SceneRequest::ClearParticles);
    }

    /// Queue a new topology; it replaces the current one and starts a layout run.
    pub fn request_graph(&mut self, nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) {
        self.enqueue(SceneRequest::SetGraph { nodes, edges });
    }

    /// Queue new layout tunables, used from the next topology on.
    pub fn request_layout_config(&mut self, config: ForceLayoutConfig) {
        self.enqueue(SceneRequest::SetLayoutConfig(config));
    }

    pub fn pending_requests(&self) -> usize {
        self.requests.len()
    }

    fn enqueue(&mut self, request: SceneRequest) {
        if self.scheduler.is_disposed() {
            log::debug!("scene disposed, ignoring {request:?}");
            return;
        }
        self.requests.push_back(request);
        self.scheduler.start();
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Mark the visualization visible or hidden. Visible scenes keep ticking.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        if visible {
            self.scheduler.start();
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Start the scheduler. Returns true if it was stopped.
    pub fn start(&mut self) -> bool {
        self.scheduler.start()
    }

    /// Stop immediately and drop every queued request.
    pub fn stop(&mut self) {
        if !self.requests.is_empty() {
            log::debug!("dropping {} queued scene requests", self.requests.len());
            self.requests.clear();
        }
        self.scheduler.stop();
    }

    /// Stop for good. Later requests and starts are ignored.
    pub fn dispose(&mut self) {
        self.stop();
        self.scheduler.dispose();
        self.layout_run = None;
        self.particles.clear();
        log::debug!("scene disposed");
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    // =========================================================================
    // Frame loop
    // =========================================================================

    /// Handle one display callback at `now_ms`.
    ///
    /// Returns true if the host should schedule another callback.
    pub fn frame(&mut self, now_ms: f64, bridge: &mut impl RenderBridge) -> bool {
        let Some(dt) = self.scheduler.begin_frame(now_ms) else {
            return false;
        };
        self.step(dt, bridge);

        let keep_running = self.visible
            || self.particles.is_busy()
            || self.layout_run.is_some()
            || !self.requests.is_empty();
        if !keep_running {
            self.scheduler.stop();
        }
        keep_running
    }

    /// Advance the simulation by `dt` seconds, independent of the scheduler.
    ///
    /// Does nothing once the scene is disposed.
    pub fn step(&mut self, dt: f32, bridge: &mut impl RenderBridge) {
        if self.scheduler.is_disposed() {
            return;
        }
        while let Some(request) = self.requests.pop_front() {
            self.apply(request);
        }

        let buffer = self.particles.tick(dt);
        bridge.present_particles(buffer);

        if let Some(run) = self.layout_run.as_mut() {
            let budget = if layout_work(run) <= SYNC_LAYOUT_WORK_LIMIT {
                run.remaining()
            } else {
                SLICED_ITERATIONS_PER_TICK
            };
            if run.step(budget) {
                self.layout = run.positions();
                self.spatial.rebuild(&self.layout);
                self.layout_run = None;
                log::debug!("layout published for {} nodes", self.layout.len());
                bridge.present_layout(&self.layout);
            }
        }
    }

    fn apply(&mut self, request: SceneRequest) {
        match request {
            SceneRequest::Emit { id, origin, config } => {
                self.particles.emit_as(id, origin, &config);
            }
            SceneRequest::StopEffect(id) => {
                self.particles.stop_effect(id);
            }
            SceneRequest::ClearParticles => self.particles.clear(),
            SceneRequest::SetGraph { nodes, edges } => {
                // Seed from the newest positions, including a run still in flight.
                let previous = match &self.layout_run {
                    Some(run) => run.positions(),
                    None => self.layout.clone(),
                };
                let run = LayoutRun::new(
                    &nodes,
                    &edges,
                    Some(&previous),
                    self.layout_config,
                    &mut self.layout_rng,
                );
                log::debug!(
                    "layout run started: {} nodes, {} edges, {} iterations",
                    run.graph().node_count(),
                    run.graph().edge_count(),
                    run.remaining()
                );
                self.layout_run = Some(run);
            }
            SceneRequest::SetLayoutConfig(config) => {
                self.layout_config = config.sanitized();
            }
        }
    }

    // =========================================================================
    // Read access
    // =========================================================================

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    /// Most recently published layout.
    pub fn layout(&self) -> &NodePositions {
        &self.layout
    }

    pub fn layout_config(&self) -> &ForceLayoutConfig {
        &self.layout_config
    }

    /// True while a layout run has iterations left.
    pub fn is_layout_pending(&self) -> bool {
        self.layout_run.is_some()
    }

    pub fn find_nearest_node(&self, point: Vec3) -> Option<NodeId> {
        self.spatial.nearest(point)
    }

    pub fn find_nearest_node_within(&self, point: Vec3, max_distance: f32) -> Option<NodeId> {
        self.spatial.nearest_within(point, max_distance)
    }

    pub fn find_nodes_in_radius(&self, point: Vec3, radius: f32) -> Vec<NodeId> {
        self.spatial.in_radius(point, radius)
    }

    /// Bounding box of the published layout as (min corner, max corner).
    pub fn layout_bounds(&self) -> Option<(Vec3, Vec3)> {
        self.layout.bounds()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(SceneConfig::default())
    }
}
