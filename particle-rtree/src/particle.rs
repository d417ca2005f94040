//! The payload contract: anything with a position and an effective radius.

use crate::bounding_box::{BoundingBox, Point};
use crate::rtree::SpatialResult;

/// A radius-bearing object tracked by a [`crate::SpatialIndex`].
///
/// The index holds payloads as `Arc<P>` and never mutates them. Simulators
/// that move particles keep their kinematic state behind interior mutability
/// and update it from the `on_removed` callback of
/// [`crate::SpatialIndex::reindex`].
///
/// # Examples
///
/// ```rust
/// use parking_lot::Mutex;
/// use particle_rtree::{Particle, Point};
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
///
///     fn radius(&self) -> f64 {
///         self.radius
///     }
/// }
/// ```
pub trait Particle {
    /// Current center of the particle.
    fn position(&self) -> Point;

    /// Current effective radius. Must be finite and non-negative.
    fn radius(&self) -> f64;

    /// The square enclosing the particle's disc.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGeometry` for non-finite coordinates or a negative radius.
    fn bounds(&self) -> SpatialResult<BoundingBox> {
        BoundingBox::try_from_center_radius(self.position(), self.radius())
    }

    /// Whether the particle's disc touches the disc of `radius` around `center`.
    fn overlaps_disc(&self, center: &Point, radius: f64) -> bool {
        self.position().distance(center) <= radius + self.radius()
    }
}
