//! Graph data structures.
//!
//! Dashboard-facing node and edge records, and the petgraph-backed
//! `LayoutGraph` the force solver works on, with Structure of Arrays (SoA)
//! position buffers for cache-friendly iteration.

mod edge;
mod engine;
mod node;

pub use edge::GraphEdge;
pub use engine::LayoutGraph;
pub use node::{GraphNode, NodeId};
