//! Force-directed 3D layout.
//!
//! Each iteration computes, for every node, inverse-square repulsion from
//! every other node plus linear spring attraction along its edges, then moves
//! the node by `force * step_size` and scales the result by `damping`:
//!
//! ```text
//! repulsion(n)  = Σ_{m≠n} normalize(p_n - p_m) * k_rep / max(|p_n - p_m|, ε)²
//! attraction(n) = Σ_{edge(n,m)} (p_m - p_n) * k_att * strength
//! p_n'          = (p_n + (repulsion + attraction) * step_size) * damping
//! ```
//!
//! All forces of one iteration are computed from the positions at the start
//! of that iteration.
//!
//! # Scaling
//!
//! The pairwise repulsion makes one iteration O(n²), so a full solve is
//! O(iterations × n²). This is meant for network views of tens of nodes.
//! Larger graphs are still solved correctly but should be run a few
//! iterations per frame through [`LayoutRun::step`]. A spatial partition
//! (grid or Barnes-Hut) would change this contract and is not used.
//!
//! Runs always stop after exactly `iterations` iterations; there is no
//! convergence test, so the work per run is bounded regardless of topology.

use rand::Rng;
use serde::Deserialize;
use std::collections::HashSet;

use super::positions::NodePositions;
use crate::graph::{GraphEdge, GraphNode, LayoutGraph};
use crate::math::{self, Vec3, ZERO, uniform};

/// Minimum distance used in the repulsion denominator.
pub const REPULSION_EPSILON: f32 = 0.1;

/// Edge length of the cube new nodes are seeded in, centred on the origin.
pub const SEED_EXTENT: f32 = 10.0;

/// Solver tunables.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForceLayoutConfig {
    /// Repulsion constant (default: 10.0).
    #[serde(alias = "k_rep")]
    pub k_rep: f32,
    /// Spring constant (default: 0.1).
    #[serde(alias = "k_att")]
    pub k_att: f32,
    /// Integration step (default: 0.01).
    #[serde(alias = "step_size")]
    pub step_size: f32,
    /// Per-iteration position decay (default: 0.99).
    pub damping: f32,
    /// Fixed iteration budget per run (default: 50).
    pub iterations: u32,
}

impl Default for ForceLayoutConfig {
    fn default() -> Self {
        Self {
            k_rep: 10.0,
            k_att: 0.1,
            step_size: 0.01,
            damping: 0.99,
            iterations: 50,
        }
    }
}

impl ForceLayoutConfig {
    /// Replace out-of-range values instead of rejecting them.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let non_negative = |name: &str, value: f32, fallback: f32| {
            if !value.is_finite() {
                log::warn!("layout option `{name}` = {value} replaced by {fallback}");
                fallback
            } else if value < 0.0 {
                log::warn!("layout option `{name}` = {value} clamped to 0");
                0.0
            } else {
                value
            }
        };
        Self {
            k_rep: non_negative("kRep", self.k_rep, defaults.k_rep),
            k_att: non_negative("kAtt", self.k_att, defaults.k_att),
            step_size: non_negative("stepSize", self.step_size, defaults.step_size),
            damping: non_negative("damping", self.damping, defaults.damping).min(1.0),
            iterations: self.iterations,
        }
    }
}

/// Starting position for every node.
///
/// Explicit positions win, then the node's position in `previous`, then a
/// uniform sample inside the seed cube.
fn seed_position(node: &GraphNode, previous: Option<&NodePositions>, rng: &mut impl Rng) -> Vec3 {
    if let Some(p) = node.position.filter(|p| p.iter().all(|c| c.is_finite())) {
        return p;
    }
    if let Some(p) = previous.and_then(|prev| prev.get(node.id)) {
        return p;
    }
    let half = SEED_EXTENT / 2.0;
    [
        uniform(rng, -half, half),
        uniform(rng, -half, half),
        uniform(rng, -half, half),
    ]
}

/// One layout pass over one topology, resumable across frames.
pub struct LayoutRun {
    graph: LayoutGraph,
    springs: Vec<(usize, usize, f32)>,
    config: ForceLayoutConfig,
    remaining: u32,
    forces: Vec<Vec3>,
}

impl LayoutRun {
    /// Build the graph and seed positions. No iterations are run yet.
    ///
    /// Duplicate node ids keep their first occurrence; edges whose endpoints
    /// are not in `nodes` are dropped.
    pub fn new(
        nodes: &[GraphNode],
        edges: &[GraphEdge],
        previous: Option<&NodePositions>,
        config: ForceLayoutConfig,
        rng: &mut impl Rng,
    ) -> Self {
        let config = config.sanitized();
        let mut graph = LayoutGraph::with_capacity(nodes.len(), edges.len());

        let mut seen = HashSet::with_capacity(nodes.len());
        for node in nodes {
            if !seen.insert(node.id) {
                log::warn!("duplicate {} ignored", node.id);
                continue;
            }
            let seed = seed_position(node, previous, rng);
            graph.add_node(node.id, seed);
        }

        let dropped = edges.iter().filter(|edge| !graph.add_edge(edge)).count();
        if dropped > 0 {
            log::warn!("dropped {dropped} edges referencing unknown nodes");
        }

        // Zero- and one-node graphs have nothing to resolve.
        let remaining = if graph.node_count() < 2 { 0 } else { config.iterations };

        Self {
            springs: graph.springs(),
            forces: vec![ZERO; graph.node_count()],
            graph,
            config,
            remaining,
        }
    }

    pub fn graph(&self) -> &LayoutGraph {
        &self.graph
    }

    pub fn config(&self) -> &ForceLayoutConfig {
        &self.config
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_finished(&self) -> bool {
        self.remaining == 0
    }

    /// Run up to `max_iterations` iterations. Returns true once the budget is spent.
    pub fn step(&mut self, max_iterations: u32) -> bool {
        let count = max_iterations.min(self.remaining);
        for _ in 0..count {
            self.iterate();
        }
        self.remaining -= count;
        self.is_finished()
    }

    /// Run the remaining budget.
    pub fn finish(&mut self) -> NodePositions {
        self.step(self.remaining);
        self.positions()
    }

    /// Snapshot of the current positions.
    pub fn positions(&self) -> NodePositions {
        NodePositions::from_graph(&self.graph)
    }

    fn iterate(&mut self) {
        let n = self.graph.node_count();
        let ForceLayoutConfig {
            k_rep,
            k_att,
            step_size,
            damping,
            ..
        } = self.config;

        self.forces.fill(ZERO);

        for i in 0..n {
            let p_i = self.graph.position_at(i);
            for j in (i + 1)..n {
                let delta = math::sub(p_i, self.graph.position_at(j));
                let distance = math::length(delta).max(REPULSION_EPSILON);
                let push = math::scale(math::normalize_or_zero(delta), k_rep / (distance * distance));
                self.forces[i] = math::add(self.forces[i], push);
                self.forces[j] = math::sub(self.forces[j], push);
            }
        }

        for &(a, b, strength) in &self.springs {
            let pull = math::scale(
                math::sub(self.graph.position_at(b), self.graph.position_at(a)),
                k_att * strength,
            );
            self.forces[a] = math::add(self.forces[a], pull);
            self.forces[b] = math::sub(self.forces[b], pull);
        }

        for i in 0..n {
            let moved = math::add(self.graph.position_at(i), math::scale(self.forces[i], step_size));
            self.graph.set_position_at(i, math::scale(moved, damping));
        }
    }
}

/// Lay out a graph synchronously with the full iteration budget.
pub fn solve(
    nodes: &[GraphNode],
    edges: &[GraphEdge],
    config: &ForceLayoutConfig,
    rng: &mut impl Rng,
) -> NodePositions {
    LayoutRun::new(nodes, edges, None, *config, rng).finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn distance(positions: &NodePositions, a: u32, b: u32) -> f32 {
        let pa = positions.get(NodeId(a)).unwrap();
        let pb = positions.get(NodeId(b)).unwrap();
        math::length(math::sub(pa, pb))
    }

    #[test]
    fn test_empty_graph() {
        let mut rng = StdRng::seed_from_u64(1);
        let positions = solve(&[], &[], &ForceLayoutConfig::default(), &mut rng);
        assert!(positions.is_empty());
    }

    #[test]
    fn test_single_node_unchanged() {
        let mut rng = StdRng::seed_from_u64(1);
        let nodes = [GraphNode::at(3, [1.0, 2.0, 3.0])];
        let positions = solve(&nodes, &[], &ForceLayoutConfig::default(), &mut rng);
        assert_eq!(positions.get(NodeId(3)), Some([1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_two_nodes_contract_monotonically() {
        let mut rng = StdRng::seed_from_u64(1);
        let nodes = [GraphNode::at(0, [-5.0, 0.0, 0.0]), GraphNode::at(1, [5.0, 0.0, 0.0])];
        let edges = [GraphEdge::new(0, 1, 1.0)];
        let mut run = LayoutRun::new(&nodes, &edges, None, ForceLayoutConfig::default(), &mut rng);

        let mut last = distance(&run.positions(), 0, 1);
        assert_eq!(last, 10.0);
        let mut iterations = 0;
        while !run.step(1) {
            let d = distance(&run.positions(), 0, 1);
            assert!(d <= last, "distance grew from {last} to {d} at iteration {iterations}");
            last = d;
            iterations += 1;
        }
        let d = distance(&run.positions(), 0, 1);
        assert!(d <= last);
        assert_eq!(iterations + 1, 50);
        assert!(d < 10.0);
    }

    #[test]
    fn test_fixed_seed_is_deterministic() {
        let nodes: Vec<GraphNode> = (0..12u32).map(GraphNode::new).collect();
        let edges: Vec<GraphEdge> = (1..12u32).map(|i| GraphEdge::new(i - 1, i, 0.8)).collect();
        let config = ForceLayoutConfig::default();

        let a = solve(&nodes, &edges, &config, &mut StdRng::seed_from_u64(99));
        let b = solve(&nodes, &edges, &config, &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn test_seeds_inside_box() {
        let nodes: Vec<GraphNode> = (0..50u32).map(GraphNode::new).collect();
        let config = ForceLayoutConfig {
            iterations: 0,
            ..ForceLayoutConfig::default()
        };
        let positions = solve(&nodes, &[], &config, &mut StdRng::seed_from_u64(5));
        for (_, p) in positions.iter() {
            assert!(p.iter().all(|c| c.abs() <= SEED_EXTENT / 2.0));
        }
    }

    #[test]
    fn test_previous_positions_are_kept_as_seeds() {
        let mut rng = StdRng::seed_from_u64(2);
        let config = ForceLayoutConfig {
            iterations: 0,
            ..ForceLayoutConfig::default()
        };
        let first = solve(&[GraphNode::new(1), GraphNode::new(2)], &[], &config, &mut rng);

        let nodes = [GraphNode::new(1), GraphNode::new(2), GraphNode::new(3)];
        let second = LayoutRun::new(&nodes, &[], Some(&first), config, &mut rng).finish();

        assert_eq!(second.get(NodeId(1)), first.get(NodeId(1)));
        assert_eq!(second.get(NodeId(2)), first.get(NodeId(2)));
        assert!(second.get(NodeId(3)).is_some());
    }

    #[test]
    fn test_coincident_nodes_stay_finite() {
        let mut rng = StdRng::seed_from_u64(3);
        let nodes = [GraphNode::at(0, [1.0, 1.0, 1.0]), GraphNode::at(1, [1.0, 1.0, 1.0])];
        let positions = solve(&nodes, &[GraphEdge::new(0, 1, 1.0)], &ForceLayoutConfig::default(), &mut rng);
        for (_, p) in positions.iter() {
            assert!(p.iter().all(|c| c.is_finite()));
        }
    }

    #[test]
    fn test_unknown_edges_and_duplicates_are_dropped() {
        let mut rng = StdRng::seed_from_u64(4);
        let nodes = [GraphNode::new(0), GraphNode::new(1), GraphNode::at(1, [9.0; 3])];
        let edges = [GraphEdge::new(0, 1, 1.0), GraphEdge::new(1, 42, 1.0)];
        let run = LayoutRun::new(&nodes, &edges, None, ForceLayoutConfig::default(), &mut rng);
        assert_eq!(run.graph().node_count(), 2);
        assert_eq!(run.graph().edge_count(), 1);
        assert_ne!(run.graph().position(NodeId(1)), Some([9.0; 3]));
    }

    #[test]
    fn test_time_sliced_run_matches_full_solve() {
        let nodes: Vec<GraphNode> = (0..20u32).map(GraphNode::new).collect();
        let edges: Vec<GraphEdge> = (1..20u32).map(|i| GraphEdge::new(0, i, 1.0)).collect();
        let config = ForceLayoutConfig::default();

        let full = solve(&nodes, &edges, &config, &mut StdRng::seed_from_u64(8));

        let mut run = LayoutRun::new(&nodes, &edges, None, config, &mut StdRng::seed_from_u64(8));
        let mut slices = 0;
        while !run.step(7) {
            slices += 1;
        }
        assert_eq!(slices, 7);
        assert_eq!(run.positions(), full);
    }

    #[test]
    fn test_config_sanitized() {
        let config: ForceLayoutConfig =
            serde_json::from_str(r#"{ "k_rep": -1.0, "kAtt": 0.5, "damping": 4.0, "iterations": 10 }"#).unwrap();
        let config = config.sanitized();
        assert_eq!(config.k_rep, 0.0);
        assert_eq!(config.k_att, 0.5);
        assert_eq!(config.damping, 1.0);
        assert_eq!(config.step_size, 0.01);
        assert_eq!(config.iterations, 10);
    }
}
