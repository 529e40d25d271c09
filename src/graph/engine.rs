//! LayoutGraph - topology and positions for one network view.
//!
//! The topology lives in petgraph's StableGraph; positions are kept in
//! separate x/y/z arrays (SoA) indexed by the petgraph node index so the
//! solver and the renderer can walk them linearly.
//!
//! A LayoutGraph is built once per topology and replaced wholesale when the
//! dashboard sends new graph data. It is never patched node by node.

use petgraph::Undirected;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use std::collections::HashMap;

use super::edge::GraphEdge;
use super::node::NodeId;
use crate::math::Vec3;

/// Graph topology plus SoA position buffers.
pub struct LayoutGraph {
    /// Nodes store their stable NodeId, edges store clamped strength.
    graph: StableGraph<NodeId, f32, Undirected>,

    /// Map from stable NodeId to petgraph NodeIndex
    node_id_to_index: HashMap<NodeId, NodeIndex>,

    /// X positions (SoA layout)
    pos_x: Vec<f32>,

    /// Y positions (SoA layout)
    pos_y: Vec<f32>,

    /// Z positions (SoA layout)
    pos_z: Vec<f32>,
}

impl LayoutGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    /// Create a graph with pre-allocated capacity.
    pub fn with_capacity(node_capacity: usize, edge_capacity: usize) -> Self {
        Self {
            graph: StableGraph::with_capacity(node_capacity, edge_capacity),
            node_id_to_index: HashMap::with_capacity(node_capacity),
            pos_x: Vec::with_capacity(node_capacity),
            pos_y: Vec::with_capacity(node_capacity),
            pos_z: Vec::with_capacity(node_capacity),
        }
    }

    // =========================================================================
    // Node Operations
    // =========================================================================

    /// Add a node at the specified position.
    ///
    /// Returns false (and changes nothing) if the id is already present.
    pub fn add_node(&mut self, id: NodeId, position: Vec3) -> bool {
        if self.node_id_to_index.contains_key(&id) {
            return false;
        }
        let index = self.graph.add_node(id);
        self.node_id_to_index.insert(id, index);

        self.pos_x.push(position[0]);
        self.pos_y.push(position[1]);
        self.pos_z.push(position[2]);
        true
    }

    /// Get the number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Node ids in slot order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_indices().filter_map(|i| self.graph.node_weight(i).copied())
    }

    /// Slot of a node in the position buffers.
    pub fn slot_of(&self, id: NodeId) -> Option<usize> {
        self.node_id_to_index.get(&id).map(|index| index.index())
    }

    /// Get a node's position.
    pub fn position(&self, id: NodeId) -> Option<Vec3> {
        self.slot_of(id).map(|i| self.position_at(i))
    }

    /// Position of the node in slot `i`.
    #[inline]
    pub fn position_at(&self, i: usize) -> Vec3 {
        [self.pos_x[i], self.pos_y[i], self.pos_z[i]]
    }

    /// Overwrite the position of the node in slot `i`.
    #[inline]
    pub fn set_position_at(&mut self, i: usize, position: Vec3) {
        self.pos_x[i] = position[0];
        self.pos_y[i] = position[1];
        self.pos_z[i] = position[2];
    }

    // =========================================================================
    // Edge Operations
    // =========================================================================

    /// Add an edge between two existing nodes.
    ///
    /// Returns false when either endpoint is unknown.
    pub fn add_edge(&mut self, edge: &GraphEdge) -> bool {
        let (Some(&source), Some(&target)) = (
            self.node_id_to_index.get(&edge.from_id),
            self.node_id_to_index.get(&edge.to_id),
        ) else {
            return false;
        };
        self.graph.add_edge(source, target, edge.clamped_strength());
        true
    }

    /// Get the number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Edges as `(slot_a, slot_b, strength)`, self-loops skipped.
    pub fn springs(&self) -> Vec<(usize, usize, f32)> {
        self.graph
            .edge_references()
            .filter(|e| e.source() != e.target())
            .map(|e| (e.source().index(), e.target().index(), *e.weight()))
            .collect()
    }
}

impl Default for LayoutGraph {
    fn default() -> Self {
        Self::new()
    }
}
