//! Node type and related structures.
//!
//! Nodes are the vertices of a network view. Each node has:
//! - A stable identifier chosen by the dashboard (survives re-layout)
//! - An optional position hint in graph space

use serde::Deserialize;
use std::fmt;

use crate::math::Vec3;

/// Stable node identifier.
///
/// The dashboard maps its own keys onto these; the same id across two
/// topologies means "the same node", which keeps incremental layouts stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new NodeId from a raw u32.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw u32 value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

impl From<u32> for NodeId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<NodeId> for u32 {
    #[inline]
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// A node as supplied by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    /// Explicit starting position. Overrides any previous layout position.
    #[serde(default)]
    pub position: Option<Vec3>,
}

impl GraphNode {
    pub fn new(id: u32) -> Self {
        Self {
            id: NodeId(id),
            position: None,
        }
    }

    pub fn at(id: u32, position: Vec3) -> Self {
        Self {
            id: NodeId(id),
            position: Some(position),
        }
    }
}
