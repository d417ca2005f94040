//! Thread-safe spatial index façade.
//!
//! `SpatialIndex` pairs a [`MemoryRTree`] with a membership table and guards
//! both with one exclusive lock. Every public operation holds that lock from
//! start to finish, so a `reindex` (remove, callback, insert) is observed by
//! other threads as a single step.
//!
//! ## Query semantics
//!
//! [`SpatialIndex::items_within_radius`] returns **box-approximate** matches:
//! every payload whose indexed square intersects the query square. Near the
//! corners of the query square this includes payloads whose discs lie outside
//! the query circle. Callers needing exact circular semantics filter the
//! candidates themselves or use [`SpatialIndex::items_within_radius_exact`].

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::bounding_box::{BoundingBox, Point};
use crate::particle::Particle;
use crate::rtree::{
    IntegrityReport, MemoryRTree, RTreeConfig, RTreeStats, RebuildStats, SpatialResult,
};
use crate::spatial_index_builder::SpatialIndexBuilder;

/// Identity of a payload: the address of its `Arc` allocation. Stable while
/// the index holds a clone of the `Arc`.
type PayloadKey = usize;

fn key_of<P>(payload: &Arc<P>) -> PayloadKey {
    Arc::as_ptr(payload) as usize
}

/// A concurrent index of moving particles.
///
/// Cloning is cheap and every clone refers to the same index.
///
/// # Deadlocks
///
/// The lock is not reentrant. The `visit` and `on_removed` callbacks run while
/// it is held and must not call back into the same index.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use parking_lot::Mutex;
/// use particle_rtree::{Particle, Point, SpatialIndex};
///
/// struct Body {
///     position: Mutex<Point>,
///     radius: f64,
/// }
///
/// impl Particle for Body {
///     fn position(&self) -> Point {
///         *self.position.lock()
///     }
///     fn radius(&self) -> f64 {
///         self.radius
///     }
/// }
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let index = SpatialIndex::new();
/// let body = Arc::new(Body { position: Mutex::new(Point::new(0.0, 0.0)), radius: 0.5 });
/// index.index(&body)?;
///
/// index.reindex(&body, |b| *b.position.lock() = Point::new(5.0, 5.0))?;
///
/// let near = index.collect_within_radius(Point::new(5.0, 5.0), 1.0)?;
/// assert_eq!(near.len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct SpatialIndex<P> {
    inner: Arc<Mutex<IndexState<P>>>,
}

struct IndexState<P> {
    tree: MemoryRTree<P>,
    /// Bounds of every live entry, per payload
    members: HashMap<PayloadKey, Vec<BoundingBox>>,
}

impl<P> Clone for SpatialIndex<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: Particle> Default for SpatialIndex<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Particle> SpatialIndex<P> {
    /// Creates an empty index with the default branching factor.
    pub fn new() -> Self {
        Self::with_config(RTreeConfig::default())
    }

    pub fn with_config(config: RTreeConfig) -> Self {
        log::debug!(
            "Creating spatial index (max_entries: {}, min_entries: {})",
            config.max_entries(),
            config.min_entries()
        );
        Self {
            inner: Arc::new(Mutex::new(IndexState {
                tree: MemoryRTree::with_config(config),
                members: HashMap::new(),
            })),
        }
    }

    pub fn builder() -> SpatialIndexBuilder {
        SpatialIndexBuilder::new()
    }

    pub fn config(&self) -> RTreeConfig {
        *self.inner.lock().tree.config()
    }

    /// Adds `payload` under its current bounds.
    ///
    /// Returns `true` once the entry is added. Indexing a payload that is
    /// already present adds a second, independent entry and also returns
    /// `true`; the result does not distinguish the two cases.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGeometry` if the payload's position or radius is
    /// malformed. The index is left untouched.
    pub fn index(&self, payload: &Arc<P>) -> SpatialResult<bool> {
        let bbox = payload.bounds()?;
        let mut state = self.inner.lock();
        state.insert(payload, bbox);
        Ok(true)
    }

    /// Removes one entry of `payload`. Returns `false` if it was not indexed.
    pub fn unindex(&self, payload: &Arc<P>) -> bool {
        let mut state = self.inner.lock();
        state.remove(payload).is_some()
    }

    /// Membership test; does not modify the index.
    pub fn is_indexed(&self, payload: &Arc<P>) -> bool {
        self.inner.lock().members.contains_key(&key_of(payload))
    }

    /// Removes `payload`, lets `on_removed` update it, and inserts it again
    /// under its new bounds, all under one lock acquisition.
    ///
    /// Returns `Ok(false)` without calling `on_removed` if the payload was not
    /// indexed.
    ///
    /// # Errors
    ///
    /// If the payload's geometry is malformed after `on_removed`, it is put
    /// back under its previous bounds and `InvalidGeometry` is returned.
    ///
    /// # Panics
    ///
    /// A panic in `on_removed` leaves the payload unindexed.
    pub fn reindex<F>(&self, payload: &Arc<P>, on_removed: F) -> SpatialResult<bool>
    where
        F: FnOnce(&P),
    {
        let mut state = self.inner.lock();
        let previous = match state.remove(payload) {
            Some(bbox) => bbox,
            None => return Ok(false),
        };

        on_removed(payload);

        match payload.bounds() {
            Ok(bbox) => {
                state.insert(payload, bbox);
                Ok(true)
            }
            Err(e) => {
                log::warn!("Reindex rejected new geometry ({}); restoring previous bounds {}", e, previous);
                state.insert(payload, previous);
                Err(e)
            }
        }
    }

    /// Calls `visit` for every payload whose indexed bounds intersect the
    /// square of half-width `radius` around `center`.
    ///
    /// Matches are box-approximate. `visit` returns `false` to stop early.
    /// Returns `Ok(true)` if every match was visited.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGeometry` for a non-finite center or a negative radius.
    pub fn items_within_radius<F>(&self, center: Point, radius: f64, visit: F) -> SpatialResult<bool>
    where
        F: FnMut(&Arc<P>) -> bool,
    {
        let region = BoundingBox::try_from_center_radius(center, radius)?;
        let state = self.inner.lock();
        Ok(state.tree.search(&region, visit))
    }

    /// Like [`SpatialIndex::items_within_radius`], followed by an exact
    /// refinement: only payloads whose current disc touches the query disc
    /// reach `visit`.
    pub fn items_within_radius_exact<F>(&self, center: Point, radius: f64, mut visit: F) -> SpatialResult<bool>
    where
        F: FnMut(&Arc<P>) -> bool,
    {
        self.items_within_radius(center, radius, |p| {
            if p.overlaps_disc(&center, radius) {
                visit(p)
            } else {
                true
            }
        })
    }

    /// Collects the box-approximate matches of a radius query.
    pub fn collect_within_radius(&self, center: Point, radius: f64) -> SpatialResult<Vec<Arc<P>>> {
        let mut found = Vec::new();
        self.items_within_radius(center, radius, |p| {
            found.push(Arc::clone(p));
            true
        })?;
        Ok(found)
    }

    /// Calls `visit` for every payload whose indexed bounds intersect `region`.
    pub fn find_intersecting<F>(&self, region: &BoundingBox, visit: F) -> SpatialResult<bool>
    where
        F: FnMut(&Arc<P>) -> bool,
    {
        region.validate()?;
        let state = self.inner.lock();
        Ok(state.tree.search(region, visit))
    }

    /// Number of entries, duplicates included.
    pub fn len(&self) -> u64 {
        self.inner.lock().tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().tree.is_empty()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        let mut state = self.inner.lock();
        log::debug!("Clearing spatial index with {} entries", state.tree.len());
        state.tree.clear();
        state.members.clear();
    }

    pub fn stats(&self) -> RTreeStats {
        self.inner.lock().tree.stats()
    }

    /// Regroups all entries into a fresh tree; see [`MemoryRTree::rebuild`].
    pub fn rebuild(&self) -> RebuildStats {
        self.inner.lock().tree.rebuild()
    }

    /// Checks the tree invariants and that the membership table agrees with
    /// the entries in the tree.
    pub fn check_integrity(&self) -> IntegrityReport {
        let state = self.inner.lock();
        let mut report = state.tree.check_integrity();

        let recorded: usize = state.members.values().map(Vec::len).sum();
        if recorded as u64 != state.tree.len() {
            report.fail(format!(
                "membership table records {} entries but the tree holds {}",
                recorded,
                state.tree.len()
            ));
        }

        state.tree.for_each_entry(|entry| {
            let known = state
                .members
                .get(&key_of(&entry.payload))
                .map_or(false, |bounds| bounds.contains(&entry.bbox));
            if !known {
                report.fail(format!("entry with bounds {} is missing from the membership table", entry.bbox));
            }
        });

        report
    }
}

impl<P> IndexState<P> {
    fn insert(&mut self, payload: &Arc<P>, bbox: BoundingBox) {
        self.tree.insert(bbox, Arc::clone(payload));
        self.members.entry(key_of(payload)).or_default().push(bbox);
    }

    /// Removes the most recently added entry of `payload` and returns its bounds.
    fn remove(&mut self, payload: &Arc<P>) -> Option<BoundingBox> {
        let key = key_of(payload);
        let hint = *self.members.get(&key)?.last()?;

        let removed = self.tree.remove(payload, Some(&hint));
        debug_assert!(
            removed.is_some(),
            "membership table lists a payload the tree does not hold"
        );
        let removed = match removed {
            Some(bbox) => bbox,
            None => {
                log::error!(
                    "Membership table out of sync: payload listed under {} was not found in the tree",
                    hint
                );
                self.forget_bound(key, &hint);
                return None;
            }
        };

        self.forget_bound(key, &removed);
        Some(removed)
    }

    /// Drops one recorded bound for `key`, leaving the payload's other
    /// entries listed.
    fn forget_bound(&mut self, key: PayloadKey, bbox: &BoundingBox) {
        if let Some(bounds) = self.members.get_mut(&key) {
            if let Some(pos) = bounds.iter().rposition(|b| b == bbox) {
                bounds.remove(pos);
            }
            if bounds.is_empty() {
                self.members.remove(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtree::SpatialError;

    struct Dot {
        position: Mutex<Point>,
        radius: Mutex<f64>,
    }

    impl Dot {
        fn new(x: f64, y: f64, radius: f64) -> Arc<Dot> {
            Arc::new(Dot {
                position: Mutex::new(Point::new(x, y)),
                radius: Mutex::new(radius),
            })
        }
    }

    impl Particle for Dot {
        fn position(&self) -> Point {
            *self.position.lock()
        }

        fn radius(&self) -> f64 {
            *self.radius.lock()
        }
    }

    #[test]
    fn test_index_and_unindex() {
        let index = SpatialIndex::new();
        let dot = Dot::new(0.0, 0.0, 1.0);

        assert!(!index.is_indexed(&dot));
        assert!(index.index(&dot).unwrap());
        assert!(index.is_indexed(&dot));
        assert_eq!(index.len(), 1);

        assert!(index.unindex(&dot));
        assert!(!index.is_indexed(&dot));
        assert!(!index.unindex(&dot));
        assert!(index.is_empty());
    }

    #[test]
    fn test_duplicate_index_reports_added() {
        let index = SpatialIndex::new();
        let dot = Dot::new(0.0, 0.0, 1.0);

        assert!(index.index(&dot).unwrap());
        assert!(index.index(&dot).unwrap());
        assert_eq!(index.len(), 2);

        assert!(index.unindex(&dot));
        assert!(index.is_indexed(&dot));
        assert!(index.unindex(&dot));
        assert!(!index.is_indexed(&dot));
        assert!(index.check_integrity().is_valid);
    }

    #[test]
    fn test_forget_bound_keeps_other_duplicates() {
        let index = SpatialIndex::new();
        let dot = Dot::new(0.0, 0.0, 1.0);
        index.index(&dot).unwrap();
        *dot.position.lock() = Point::new(9.0, 9.0);
        index.index(&dot).unwrap();

        let mut state = index.inner.lock();
        let key = key_of(&dot);
        let stale = BoundingBox::new(8.0, 8.0, 10.0, 10.0);
        state.forget_bound(key, &stale);
        assert_eq!(state.members[&key], vec![BoundingBox::new(-1.0, -1.0, 1.0, 1.0)]);

        state.forget_bound(key, &BoundingBox::new(-1.0, -1.0, 1.0, 1.0));
        assert!(!state.members.contains_key(&key));
        drop(state);

        // The tree still holds both entries; the disagreement is reported
        let report = index.check_integrity();
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("membership table")));
    }

    #[test]
    fn test_index_rejects_bad_geometry() {
        let index = SpatialIndex::new();
        let dot = Dot::new(f64::NAN, 0.0, 1.0);
        assert!(matches!(index.index(&dot), Err(SpatialError::InvalidGeometry(_))));
        assert!(!index.is_indexed(&dot));
        assert!(index.is_empty());
    }

    #[test]
    fn test_reindex_moves_payload() {
        let index = SpatialIndex::new();
        let dot = Dot::new(0.0, 0.0, 0.5);
        index.index(&dot).unwrap();

        let moved = index
            .reindex(&dot, |d| *d.position.lock() = Point::new(100.0, 100.0))
            .unwrap();
        assert!(moved);
        assert!(index.collect_within_radius(Point::new(0.0, 0.0), 1.0).unwrap().is_empty());
        assert_eq!(index.collect_within_radius(Point::new(100.0, 100.0), 1.0).unwrap().len(), 1);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_reindex_of_unknown_payload_skips_callback() {
        let index: SpatialIndex<Dot> = SpatialIndex::new();
        let dot = Dot::new(0.0, 0.0, 0.5);
        let mut called = false;
        assert!(!index.reindex(&dot, |_| called = true).unwrap());
        assert!(!called);
        assert!(index.is_empty());
    }

    #[test]
    fn test_reindex_with_bad_geometry_restores_previous_bounds() {
        let index = SpatialIndex::new();
        let dot = Dot::new(2.0, 2.0, 0.5);
        index.index(&dot).unwrap();

        let result = index.reindex(&dot, |d| *d.radius.lock() = -3.0);
        assert!(matches!(result, Err(SpatialError::InvalidGeometry(_))));
        assert!(index.is_indexed(&dot));
        assert_eq!(index.collect_within_radius(Point::new(2.0, 2.0), 0.1).unwrap().len(), 1);
        assert!(index.check_integrity().is_valid);
    }

    #[test]
    fn test_query_rejects_bad_geometry() {
        let index: SpatialIndex<Dot> = SpatialIndex::new();
        assert!(index.items_within_radius(Point::new(0.0, 0.0), -1.0, |_| true).is_err());
        assert!(index
            .items_within_radius(Point::new(f64::INFINITY, 0.0), 1.0, |_| true)
            .is_err());
        assert!(index
            .find_intersecting(&BoundingBox::new(1.0, 1.0, 0.0, 0.0), |_| true)
            .is_err());
    }

    #[test]
    fn test_box_versus_exact_matches() {
        let index = SpatialIndex::new();
        let corner = Dot::new(0.9, 0.9, 0.0);
        let inside = Dot::new(0.2, 0.0, 0.0);
        index.index(&corner).unwrap();
        index.index(&inside).unwrap();

        let boxed = index.collect_within_radius(Point::new(0.0, 0.0), 1.0).unwrap();
        assert_eq!(boxed.len(), 2);

        let mut exact = Vec::new();
        index
            .items_within_radius_exact(Point::new(0.0, 0.0), 1.0, |p| {
                exact.push(Arc::clone(p));
                true
            })
            .unwrap();
        assert_eq!(exact.len(), 1);
        assert!(Arc::ptr_eq(&exact[0], &inside));
    }

    #[test]
    fn test_clear_and_clones_share_state() {
        let index = SpatialIndex::new();
        let other = index.clone();
        let dot = Dot::new(0.0, 0.0, 1.0);
        index.index(&dot).unwrap();
        assert!(other.is_indexed(&dot));

        other.clear();
        assert!(!index.is_indexed(&dot));
        assert!(index.is_empty());
        assert!(index.check_integrity().is_valid);
    }

    #[test]
    fn test_rebuild_keeps_membership() {
        let index = SpatialIndex::new();
        let dots: Vec<_> = (0..30).map(|i| Dot::new(i as f64, (i * 7 % 30) as f64, 0.5)).collect();
        for d in &dots {
            index.index(d).unwrap();
        }
        let stats = index.rebuild();
        assert_eq!(stats.entries_reindexed, 30);
        assert!(dots.iter().all(|d| index.is_indexed(d)));
        assert!(index.check_integrity().is_valid);
    }
}
