//! # Particle R-Tree - Spatial Indexing for Moving Particles
//!
//! This crate provides a dynamic, in-memory R-Tree for simulations that track
//! many moving objects, each with a position and an effective radius, and
//! repeatedly ask "which objects are near this point?".
//!
//! ## Features
//!
//! - **Dynamic**: Insert, remove and move payloads one at a time
//! - **Atomic Reindexing**: Remove, update and reinsert under a single lock
//! - **Thread Safe**: Any number of threads share one index through clones
//! - **Early Stop**: Query visitors stop the traversal by returning `false`
//! - **Self Checking**: `check_integrity()` on demand, or after every mutation with the `invariant-checks` feature
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use particle_rtree::{Particle, Point, SpatialIndex, SpatialIndexBuilder};
//!
//! struct Ball {
//!     center: Mutex<Point>,
//!     radius: f64,
//! }
//!
//! impl Particle for Ball {
//!     fn position(&self) -> Point {
//!         *self.center.lock()
//!     }
//!     fn radius(&self) -> f64 {
//!         self.radius
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let index: SpatialIndex<Ball> = SpatialIndexBuilder::new().max_entries(8).build()?;
//!
//! let balls: Vec<Arc<Ball>> = (0..10)
//!     .map(|i| Arc::new(Ball { center: Mutex::new(Point::new(i as f64, 0.0)), radius: 0.25 }))
//!     .collect();
//! for ball in &balls {
//!     index.index(ball)?;
//! }
//!
//! // Move one ball; queries on other threads never see it missing
//! index.reindex(&balls[0], |b| *b.center.lock() = Point::new(50.0, 50.0))?;
//!
//! let mut near_origin = 0;
//! index.items_within_radius(Point::new(0.0, 0.0), 1.5, |_| {
//!     near_origin += 1;
//!     true
//! })?;
//! assert_eq!(near_origin, 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Tree API
//!
//! [`MemoryRTree`] is the single-threaded engine underneath and can be used
//! directly when no locking is wanted:
//!
//! ```rust
//! use std::sync::Arc;
//! use particle_rtree::{BoundingBox, MemoryRTree};
//!
//! let mut tree = MemoryRTree::new();
//! let item = Arc::new("rock");
//! tree.insert(BoundingBox::new(0.0, 0.0, 1.0, 1.0), Arc::clone(&item));
//!
//! let mut hits = Vec::new();
//! tree.search(&BoundingBox::new(0.5, 0.5, 2.0, 2.0), |p| {
//!     hits.push(Arc::clone(p));
//!     true
//! });
//! assert_eq!(hits.len(), 1);
//! assert!(tree.delete(&item, None));
//! ```

// Geometry and payload contract
pub mod bounding_box;
pub mod particle;

// Tree engine
pub mod rtree;

// Thread-safe façade
pub mod spatial_index;
pub mod spatial_index_builder;

// Re-export commonly used types
pub use bounding_box::{BoundingBox, Point};
pub use particle::Particle;
pub use rtree::{
    IntegrityReport, MemoryRTree, RTreeConfig, RTreeStats, RebuildStats, SpatialError,
    SpatialResult,
};
pub use spatial_index::SpatialIndex;
pub use spatial_index_builder::SpatialIndexBuilder;
