//! Published layout result: node id → position.

use std::collections::HashMap;

use crate::graph::{LayoutGraph, NodeId};
use crate::math::Vec3;

/// Positions of every node of one topology.
///
/// Stored as parallel id and flat `[x, y, z, ...]` arrays for upload, plus a
/// lookup table. A new topology produces a new `NodePositions`; an existing
/// one is never patched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePositions {
    ids: Vec<NodeId>,
    coords: Vec<f32>,
    lookup: HashMap<NodeId, usize>,
}

impl NodePositions {
    /// Snapshot the current positions of `graph`.
    pub fn from_graph(graph: &LayoutGraph) -> Self {
        let ids: Vec<NodeId> = graph.node_ids().collect();
        let mut coords = Vec::with_capacity(ids.len() * 3);
        let mut lookup = HashMap::with_capacity(ids.len());
        for (slot, &id) in ids.iter().enumerate() {
            coords.extend_from_slice(&graph.position_at(slot));
            lookup.insert(id, slot);
        }
        Self { ids, coords, lookup }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<Vec3> {
        self.lookup.get(&id).map(|&slot| self.at(slot))
    }

    /// Node ids, in the same order as [`coords`](Self::coords).
    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    /// `[x0, y0, z0, x1, y1, z1, ...]`
    pub fn coords(&self) -> &[f32] {
        &self.coords
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, Vec3)> + '_ {
        self.ids.iter().enumerate().map(|(slot, &id)| (id, self.at(slot)))
    }

    /// Bounding box as (min corner, max corner), or None when empty.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        if self.is_empty() {
            return None;
        }
        let mut min = [f32::INFINITY; 3];
        let mut max = [f32::NEG_INFINITY; 3];
        for (_, p) in self.iter() {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        Some((min, max))
    }

    #[inline]
    fn at(&self, slot: usize) -> Vec3 {
        let i = slot * 3;
        [self.coords[i], self.coords[i + 1], self.coords[i + 2]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_preserves_order() {
        let mut graph = LayoutGraph::new();
        graph.add_node(NodeId(5), [1.0, 2.0, 3.0]);
        graph.add_node(NodeId(2), [4.0, 5.0, 6.0]);

        let positions = NodePositions::from_graph(&graph);
        assert_eq!(positions.len(), 2);
        assert_eq!(positions.ids(), &[NodeId(5), NodeId(2)]);
        assert_eq!(positions.coords(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(positions.get(NodeId(2)), Some([4.0, 5.0, 6.0]));
        assert_eq!(positions.get(NodeId(9)), None);
    }

    #[test]
    fn test_bounds() {
        assert_eq!(NodePositions::default().bounds(), None);

        let mut graph = LayoutGraph::new();
        graph.add_node(NodeId(0), [-10.0, -5.0, 1.0]);
        graph.add_node(NodeId(1), [10.0, 5.0, -1.0]);
        let positions = NodePositions::from_graph(&graph);
        assert_eq!(positions.bounds(), Some(([-10.0, -5.0, -1.0], [10.0, 5.0, 1.0])));
    }
}
