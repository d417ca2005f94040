//! Branching configuration for the R-Tree.

use super::rtree_constants::{default_min_entries, DEFAULT_MAX_ENTRIES, MIN_BRANCHING_FACTOR};
use super::rtree_types::{SpatialError, SpatialResult};

/// Node capacity bounds.
///
/// `max_entries` is the branching factor `M`. `min_entries` is the occupancy
/// below which a non-root node is dissolved and its entries reinserted. It may
/// not exceed `(M + 1) / 2`, otherwise a split of `M + 1` items could produce
/// an underfull half.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RTreeConfig {
    max_entries: usize,
    min_entries: usize,
}

impl RTreeConfig {
    /// Creates a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `max_entries < 2`, `min_entries == 0`
    /// or `min_entries > (max_entries + 1) / 2`.
    pub fn new(max_entries: usize, min_entries: usize) -> SpatialResult<Self> {
        if max_entries < MIN_BRANCHING_FACTOR {
            return Err(SpatialError::InvalidConfiguration(format!(
                "max_entries must be at least {}, got {}",
                MIN_BRANCHING_FACTOR, max_entries
            )));
        }
        let upper = default_min_entries(max_entries);
        if min_entries == 0 || min_entries > upper {
            return Err(SpatialError::InvalidConfiguration(format!(
                "min_entries must be in 1..={} for max_entries {}, got {}",
                upper, max_entries, min_entries
            )));
        }
        Ok(Self {
            max_entries,
            min_entries,
        })
    }

    /// Configuration with the given branching factor and its default minimum.
    pub fn with_max_entries(max_entries: usize) -> SpatialResult<Self> {
        Self::new(max_entries, default_min_entries(max_entries))
    }

    #[inline]
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    #[inline]
    pub fn min_entries(&self) -> usize {
        self.min_entries
    }
}

impl Default for RTreeConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            min_entries: default_min_entries(DEFAULT_MAX_ENTRIES),
        }
    }
}
