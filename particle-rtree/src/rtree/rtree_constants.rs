//! Constants for the in-memory R-Tree.

/// Default branching factor: maximum entries per leaf and children per internal node
pub const DEFAULT_MAX_ENTRIES: usize = 3;

/// Smallest branching factor that can still split into two non-empty halves
pub const MIN_BRANCHING_FACTOR: usize = 2;

/// Default minimum occupancy for a branching factor: a node underflows once it
/// holds fewer than `max_entries / 2` items.
pub const fn default_min_entries(max_entries: usize) -> usize {
    (max_entries + 1) / 2
}
