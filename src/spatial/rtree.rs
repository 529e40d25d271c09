//! R-tree over published node positions, using the rstar crate.
//!
//! Used for picking in the 3D network view:
//! - Nearest node to a point
//! - Nearest node within a pick radius
//! - All nodes within a radius

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::graph::NodeId;
use crate::layout::NodePositions;
use crate::math::Vec3;

/// A node position with its id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodePoint {
    pub id: NodeId,
    pub position: Vec3,
}

impl RTreeObject for NodePoint {
    type Envelope = AABB<[f32; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for NodePoint {
    fn distance_2(&self, point: &[f32; 3]) -> f32 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        let dz = self.position[2] - point[2];
        dx * dx + dy * dy + dz * dz
    }
}

/// Spatial index for one published layout.
///
/// Bulk-loaded whenever a layout is published; there are no incremental
/// updates because layouts are replaced wholesale.
pub struct SpatialIndex {
    tree: RTree<NodePoint>,
}

impl SpatialIndex {
    /// Create a new empty spatial index.
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Find the nearest node to a point.
    pub fn nearest(&self, point: Vec3) -> Option<NodeId> {
        self.tree.nearest_neighbor(&point).map(|p| p.id)
    }

    /// Find the nearest node within a maximum distance.
    pub fn nearest_within(&self, point: Vec3, max_distance: f32) -> Option<NodeId> {
        let max_distance_sq = max_distance * max_distance;
        self.tree
            .nearest_neighbor(&point)
            .filter(|p| p.distance_2(&point) <= max_distance_sq)
            .map(|p| p.id)
    }

    /// Find all nodes within a radius of a point.
    pub fn in_radius(&self, point: Vec3, radius: f32) -> Vec<NodeId> {
        self.tree
            .locate_within_distance(point, radius * radius)
            .map(|p| p.id)
            .collect()
    }

    /// Replace the index contents with `positions`.
    pub fn rebuild(&mut self, positions: &NodePositions) {
        let points: Vec<_> = positions
            .iter()
            .map(|(id, position)| NodePoint { id, position })
            .collect();
        self.tree = RTree::bulk_load(points);
    }

    /// Get the number of nodes in the index.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::LayoutGraph;

    fn index_of(points: &[(u32, Vec3)]) -> SpatialIndex {
        let mut graph = LayoutGraph::new();
        for &(id, p) in points {
            graph.add_node(NodeId(id), p);
        }
        let mut index = SpatialIndex::new();
        index.rebuild(&NodePositions::from_graph(&graph));
        index
    }

    #[test]
    fn test_nearest() {
        let index = index_of(&[
            (0, [0.0, 0.0, 0.0]),
            (1, [10.0, 10.0, 10.0]),
            (2, [5.0, 5.0, 5.0]),
        ]);

        assert_eq!(index.nearest([0.0, 0.0, 0.0]), Some(NodeId(0)));
        assert_eq!(index.nearest([6.0, 6.0, 6.0]), Some(NodeId(2)));
        assert_eq!(index.nearest([11.0, 11.0, 11.0]), Some(NodeId(1)));
    }

    #[test]
    fn test_nearest_within() {
        let index = index_of(&[(0, [0.0, 0.0, 0.0]), (1, [10.0, 0.0, 0.0])]);

        assert_eq!(index.nearest_within([0.0, 0.0, 1.0], 5.0), Some(NodeId(0)));
        assert_eq!(index.nearest_within([5.0, 0.0, 0.0], 1.0), None);
        assert_eq!(index.nearest_within([0.0, 4.0, 0.0], 4.5), Some(NodeId(0)));
    }

    #[test]
    fn test_in_radius() {
        let index = index_of(&[
            (0, [0.0, 0.0, 0.0]),
            (1, [0.0, 0.0, 3.0]),
            (2, [10.0, 0.0, 0.0]),
        ]);

        let found = index.in_radius([0.0, 0.0, 0.0], 5.0);
        assert_eq!(found.len(), 2);
        assert!(found.contains(&NodeId(0)));
        assert!(found.contains(&NodeId(1)));
    }

    #[test]
    fn test_rebuild_replaces_contents() {
        let mut index = index_of(&[(0, [0.0; 3])]);
        assert_eq!(index.len(), 1);

        index.rebuild(&NodePositions::default());
        assert!(index.is_empty());
        assert_eq!(index.nearest([0.0; 3]), None);
    }
}
