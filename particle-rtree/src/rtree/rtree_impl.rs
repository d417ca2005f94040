//! MemoryRTree implementation.

use std::mem;
use std::sync::Arc;

use crate::bounding_box::BoundingBox;

use super::integrity::{check_tree, IntegrityReport};
use super::rtree_config::RTreeConfig;
use super::rtree_split::split_node;
use super::rtree_types::{Entry, Node, RTreeStats, RebuildStats};

/// An in-memory R-Tree over shared payload references.
///
/// The tree is single-threaded: every mutation takes `&mut self`. Wrap it in
/// [`crate::SpatialIndex`] for shared access from several threads.
///
/// Payloads are matched by reference identity (`Arc::ptr_eq`). Inserting the
/// same payload twice yields two distinct entries.
pub struct MemoryRTree<P> {
    root: Option<Node<P>>,
    config: RTreeConfig,
    entry_count: u64,
}

impl<P> Default for MemoryRTree<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> MemoryRTree<P> {
    /// Create an empty tree with the default branching factor.
    pub fn new() -> Self {
        Self::with_config(RTreeConfig::default())
    }

    pub fn with_config(config: RTreeConfig) -> Self {
        Self {
            root: None,
            config,
            entry_count: 0,
        }
    }

    pub fn config(&self) -> &RTreeConfig {
        &self.config
    }

    /// Number of entries, duplicates included.
    pub fn len(&self) -> u64 {
        self.entry_count
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }

    /// Number of levels; 0 while the tree has no root.
    pub fn height(&self) -> u32 {
        self.root.as_ref().map(|r| r.height()).unwrap_or(0)
    }

    pub fn root(&self) -> Option<&Node<P>> {
        self.root.as_ref()
    }

    /// Inserts `payload` under `bbox`.
    ///
    /// The caller is responsible for `bbox` being well-formed; see
    /// [`BoundingBox::validate`].
    pub fn insert(&mut self, bbox: BoundingBox, payload: Arc<P>) {
        debug_assert!(bbox.is_valid(), "inserting malformed bounds {}", bbox);
        log::trace!("Inserting entry with bounds {}", bbox);

        self.insert_entry(Entry::new(bbox, payload));
        self.entry_count += 1;

        #[cfg(any(test, feature = "invariant-checks"))]
        self.assert_invariants();
    }

    /// Removes one entry referring to `payload`.
    ///
    /// `hint` is the box the payload was last indexed under. With a hint only
    /// subtrees intersecting it are searched and only an entry with exactly
    /// that box matches. Without a hint, or when the hinted search comes up
    /// empty, every subtree is scanned.
    ///
    /// Returns the bounds of the removed entry, or `None` if the payload was
    /// not present.
    pub fn remove(&mut self, payload: &Arc<P>, hint: Option<&BoundingBox>) -> Option<BoundingBox> {
        let mut removed = self.remove_entry(payload, hint);
        if removed.is_none() && hint.is_some() {
            log::warn!("Hinted removal missed its entry; falling back to a full scan");
            removed = self.remove_entry(payload, None);
        }

        if let Some(bbox) = &removed {
            log::trace!("Removed entry with bounds {}", bbox);
            self.entry_count -= 1;
        }

        #[cfg(any(test, feature = "invariant-checks"))]
        self.assert_invariants();

        removed
    }

    /// Boolean form of [`MemoryRTree::remove`].
    pub fn delete(&mut self, payload: &Arc<P>, hint: Option<&BoundingBox>) -> bool {
        self.remove(payload, hint).is_some()
    }

    /// Visits the payload of every entry whose bounds intersect `region`.
    ///
    /// `visit` returns `false` to stop the traversal. Returns `false` if the
    /// traversal was stopped early and `true` if it ran to completion.
    pub fn search<F>(&self, region: &BoundingBox, mut visit: F) -> bool
    where
        F: FnMut(&Arc<P>) -> bool,
    {
        match &self.root {
            Some(root) if root.bbox().intersects(region) => {
                Self::search_recursive(root, region, &mut visit)
            }
            _ => true,
        }
    }

    /// Checks whether any entry refers to `payload`, descending only into
    /// subtrees that intersect `hint` when one is given.
    pub fn contains(&self, payload: &Arc<P>, hint: Option<&BoundingBox>) -> bool {
        let region = hint.copied().unwrap_or_else(|| {
            self.root
                .as_ref()
                .map(|r| *r.bbox())
                .unwrap_or_else(BoundingBox::empty)
        });
        let mut found = false;
        self.search(&region, |p| {
            found = Arc::ptr_eq(p, payload);
            !found
        });
        found
    }

    /// Visits every entry in the tree.
    pub fn for_each_entry<F: FnMut(&Entry<P>)>(&self, mut f: F) {
        if let Some(root) = &self.root {
            root.for_each_entry(&mut f);
        }
    }

    /// Drops every entry. The tree returns to having no root.
    pub fn clear(&mut self) {
        self.root = None;
        self.entry_count = 0;
    }

    pub fn stats(&self) -> RTreeStats {
        let mut stats = RTreeStats {
            total_entries: self.entry_count,
            tree_height: self.height(),
            ..RTreeStats::default()
        };
        if let Some(root) = &self.root {
            count_nodes(root, &mut stats);
        }
        stats
    }

    /// Reinserts every entry into a fresh root.
    ///
    /// Long runs of reindexing leave nodes whose boxes were shaped by old
    /// positions; a rebuild regroups entries by where they are now.
    pub fn rebuild(&mut self) -> RebuildStats {
        let before = self.stats();

        let mut entries = Vec::with_capacity(self.entry_count as usize);
        if let Some(root) = self.root.take() {
            root.drain_entries_into(&mut entries);
        }
        for entry in entries {
            self.insert_entry(entry);
        }

        let after = self.stats();
        log::debug!(
            "Rebuilt tree: {} entries, height {} -> {}, nodes {} -> {}",
            after.total_entries,
            before.tree_height,
            after.tree_height,
            before.node_count,
            after.node_count
        );

        #[cfg(any(test, feature = "invariant-checks"))]
        self.assert_invariants();

        RebuildStats {
            entries_reindexed: after.total_entries,
            nodes_before: before.node_count,
            nodes_after: after.node_count,
            height_before: before.tree_height,
            height_after: after.tree_height,
        }
    }

    /// Full traversal checking bounds, capacity, occupancy, balance and the
    /// entry count.
    pub fn check_integrity(&self) -> IntegrityReport {
        check_tree(self.root.as_ref(), &self.config, self.entry_count)
    }

    /// Panics with the integrity report if any invariant is violated.
    ///
    /// Runs after every mutation in unit tests and with the
    /// `invariant-checks` feature.
    pub fn assert_invariants(&self) {
        let report = self.check_integrity();
        assert!(report.is_valid, "R-Tree invariant violated: {}", report);
    }

    // ------------------------------------------------------------------------
    // Insertion
    // ------------------------------------------------------------------------

    /// Insert without touching the entry count; also used to reinsert the
    /// survivors of a dissolved node.
    fn insert_entry(&mut self, entry: Entry<P>) {
        let max_entries = self.config.max_entries();

        let root = match self.root.as_mut() {
            Some(root) => root,
            None => {
                self.root = Some(Node::new_leaf(vec![entry]));
                return;
            }
        };

        if let Some(sibling) = Self::insert_recursive(root, entry, max_entries) {
            // Root split: the two halves become children of a new root
            let old_root = mem::replace(root, Node::new_leaf(Vec::new()));
            *root = Node::new_internal(vec![old_root, sibling]);
            log::debug!("Root split; tree height is now {}", root.height());
        }
    }

    /// Inserts below `node`. If `node` overflows it is replaced by the lower
    /// half of its split and the upper half is returned for the parent.
    fn insert_recursive(node: &mut Node<P>, entry: Entry<P>, max_entries: usize) -> Option<Node<P>> {
        match node {
            Node::Leaf { entries, .. } => entries.push(entry),
            Node::Internal { children, .. } => {
                let best_idx = choose_subtree(children, &entry.bbox);
                if let Some(sibling) = Self::insert_recursive(&mut children[best_idx], entry, max_entries) {
                    children.insert(best_idx + 1, sibling);
                }
            }
        }

        if node.is_overfull(max_entries) {
            let full = mem::replace(node, Node::new_leaf(Vec::new()));
            let (lower, upper) = split_node(full);
            *node = lower;
            return Some(upper);
        }

        node.refresh_bbox();
        None
    }

    // ------------------------------------------------------------------------
    // Removal
    // ------------------------------------------------------------------------

    fn remove_entry(&mut self, payload: &Arc<P>, hint: Option<&BoundingBox>) -> Option<BoundingBox> {
        let min_entries = self.config.min_entries();
        let mut orphans = Vec::new();

        let root = self.root.as_mut()?;
        let removed = Self::remove_recursive(root, payload, hint, min_entries, &mut orphans)?;

        self.condense_root();

        if !orphans.is_empty() {
            log::debug!("Reinserting {} entries from dissolved nodes", orphans.len());
            for entry in orphans {
                self.insert_entry(entry);
            }
        }

        Some(removed)
    }

    /// Removes the first matching entry below `node`. Any child left below
    /// `min_entries` is detached and its entries pushed onto `orphans`.
    fn remove_recursive(
        node: &mut Node<P>,
        payload: &Arc<P>,
        hint: Option<&BoundingBox>,
        min_entries: usize,
        orphans: &mut Vec<Entry<P>>,
    ) -> Option<BoundingBox> {
        let removed = match node {
            Node::Leaf { entries, .. } => {
                let pos = entries
                    .iter()
                    .position(|e| e.refers_to(payload) && hint.map_or(true, |h| e.bbox == *h))?;
                entries.remove(pos).bbox
            }
            Node::Internal { children, .. } => {
                let mut found = None;
                for i in 0..children.len() {
                    if let Some(h) = hint {
                        if !children[i].bbox().intersects(h) {
                            continue;
                        }
                    }
                    if let Some(bbox) =
                        Self::remove_recursive(&mut children[i], payload, hint, min_entries, orphans)
                    {
                        if children[i].is_underfull(min_entries) {
                            let dissolved = children.remove(i);
                            log::trace!("Dissolving underfull node with {} items", dissolved.len());
                            dissolved.drain_entries_into(orphans);
                        }
                        found = Some(bbox);
                        break;
                    }
                }
                found?
            }
        };

        node.refresh_bbox();
        Some(removed)
    }

    /// Drops an empty root and replaces an internal root that has a single
    /// child with that child, repeatedly.
    fn condense_root(&mut self) {
        loop {
            match self.root.take() {
                Some(Node::Internal { mut children, .. }) if children.len() == 1 => {
                    self.root = children.pop();
                    log::debug!("Root collapsed; tree height is now {}", self.height());
                }
                Some(node) if node.is_empty() => {
                    self.root = None;
                    return;
                }
                other => {
                    self.root = other;
                    return;
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------------

    fn search_recursive<F>(node: &Node<P>, region: &BoundingBox, visit: &mut F) -> bool
    where
        F: FnMut(&Arc<P>) -> bool,
    {
        match node {
            Node::Leaf { entries, .. } => {
                for entry in entries {
                    if entry.bbox.intersects(region) && !visit(&entry.payload) {
                        return false;
                    }
                }
            }
            Node::Internal { children, .. } => {
                for child in children {
                    if child.bbox().intersects(region) && !Self::search_recursive(child, region, visit) {
                        return false;
                    }
                }
            }
        }
        true
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Child needing the least area enlargement to cover `bbox`; ties go to the
/// smaller resulting area, then to the earlier child.
fn choose_subtree<P>(children: &[Node<P>], bbox: &BoundingBox) -> usize {
    let mut best_idx = 0;
    let mut best_enlargement = f64::INFINITY;
    let mut best_area = f64::INFINITY;

    for (i, child) in children.iter().enumerate() {
        let enlargement = child.bbox().enlargement(bbox);
        let area = child.bbox().area() + enlargement;

        if enlargement < best_enlargement || (enlargement == best_enlargement && area < best_area) {
            best_enlargement = enlargement;
            best_area = area;
            best_idx = i;
        }
    }
    best_idx
}

fn count_nodes<P>(node: &Node<P>, stats: &mut RTreeStats) {
    stats.node_count += 1;
    match node {
        Node::Leaf { .. } => stats.leaf_count += 1,
        Node::Internal { children, .. } => {
            for child in children {
                count_nodes(child, stats);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
