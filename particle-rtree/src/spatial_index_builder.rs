use crate::particle::Particle;
use crate::rtree::{RTreeConfig, SpatialResult, DEFAULT_MAX_ENTRIES};
use crate::spatial_index::SpatialIndex;

/// Builder for a [`SpatialIndex`] with a custom branching factor.
///
/// # Examples
///
/// ```rust
/// use particle_rtree::{Particle, Point, SpatialIndex, SpatialIndexBuilder};
///
/// struct Still(Point);
///
/// impl Particle for Still {
///     fn position(&self) -> Point {
///         self.0
///     }
///     fn radius(&self) -> f64 {
///         0.0
///     }
/// }
///
/// let index: SpatialIndex<Still> = SpatialIndexBuilder::new()
///     .max_entries(8)
///     .build()
///     .expect("valid configuration");
/// assert_eq!(index.config().min_entries(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct SpatialIndexBuilder {
    max_entries: usize,
    min_entries: Option<usize>,
}

impl SpatialIndexBuilder {
    pub fn new() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            min_entries: None,
        }
    }

    /// Maximum number of items per node (the branching factor). At least 2.
    pub fn max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Minimum number of items per non-root node. Defaults to half of
    /// `max_entries`, rounded up.
    pub fn min_entries(mut self, min_entries: usize) -> Self {
        self.min_entries = Some(min_entries);
        self
    }

    /// Validates the configuration and creates an empty index.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `max_entries` is below 2 or
    /// `min_entries` lies outside `1..=ceil(max_entries / 2)`.
    pub fn build<P: Particle>(self) -> SpatialResult<SpatialIndex<P>> {
        let config = match self.min_entries {
            Some(min_entries) => RTreeConfig::new(self.max_entries, min_entries)?,
            None => RTreeConfig::with_max_entries(self.max_entries)?,
        };
        Ok(SpatialIndex::with_config(config))
    }
}

impl Default for SpatialIndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}
