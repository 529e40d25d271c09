//! Edge type.
//!
//! Edges are undirected springs between two nodes. Each edge has:
//! - Endpoint node IDs
//! - A strength in `[0, 1]` scaling its attraction

use serde::Deserialize;

use super::node::NodeId;

fn default_strength() -> f32 {
    1.0
}

/// An edge as supplied by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    #[serde(alias = "from")]
    pub from_id: NodeId,
    #[serde(alias = "to")]
    pub to_id: NodeId,
    #[serde(default = "default_strength")]
    pub strength: f32,
}

impl GraphEdge {
    pub fn new(from: u32, to: u32, strength: f32) -> Self {
        Self {
            from_id: NodeId(from),
            to_id: NodeId(to),
            strength,
        }
    }

    /// Strength clamped to `[0, 1]`; non-finite values count as 0.
    #[inline]
    pub fn clamped_strength(&self) -> f32 {
        if self.strength.is_finite() {
            self.strength.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}
