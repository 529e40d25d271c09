//! Spatial indexing for picking nodes in the 3D network view.
//!
//! This module provides an R-tree based spatial index for nearest-neighbor
//! and radius queries on published node positions.

mod rtree;

pub use rtree::SpatialIndex;
