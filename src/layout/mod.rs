//! Layout algorithms for the network view.
//!
//! This module computes 3D node positions on the CPU. Results are published
//! as `NodePositions` snapshots that the renderer uploads as-is.

pub mod force;
mod positions;

pub use force::{ForceLayoutConfig, LayoutRun, solve};
pub use positions::NodePositions;
