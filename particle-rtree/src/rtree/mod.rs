//! In-memory R-Tree for dynamic particle sets.
//!
//! This module provides the tree engine behind [`crate::SpatialIndex`]:
//! - Tagged leaf/internal nodes with cached bounding boxes
//! - Least-enlargement descent and axial splitting on insert
//! - Removal by payload reference with reinsertion of underfull nodes
//! - Short-circuiting range queries driven by a visitor callback

pub mod integrity;
pub mod rtree_config;
pub mod rtree_constants;
pub mod rtree_split;
pub mod rtree_types;
mod rtree_impl;

pub use integrity::IntegrityReport;
pub use rtree_config::RTreeConfig;
pub use rtree_constants::DEFAULT_MAX_ENTRIES;
pub use rtree_impl::MemoryRTree;
pub use rtree_split::{choose_split_axis, split_node, SplitAxis};
pub use rtree_types::{Entry, Node, RTreeStats, RebuildStats, SpatialError, SpatialResult};
