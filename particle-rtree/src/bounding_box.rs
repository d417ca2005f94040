//! Planar geometry primitives shared by the tree engine and the index façade.

use crate::rtree::{SpatialError, SpatialResult};

/// A position in the plane.
#[derive(Clone, Copy, PartialEq, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Point {
        Point { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A 2D axis-aligned bounding box represented by minimum and maximum coordinates.
///
/// `BoundingBox` bounds a particle's footprint (position ± radius), the
/// contents of a tree node, or a query region. Edges are inclusive: two boxes
/// that only share an edge or a corner intersect.
///
/// # Examples
///
/// ```rust
/// use particle_rtree::{BoundingBox, Point};
///
/// let footprint = BoundingBox::from_center_radius(Point::new(1.0, 0.0), 0.5);
/// let query = BoundingBox::from_center_radius(Point::new(0.0, 0.0), 1.0);
/// assert!(query.intersects(&footprint));
/// ```
#[derive(Clone, Copy, PartialEq, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox {
    /// Minimum X coordinate
    pub min_x: f64,
    /// Minimum Y coordinate
    pub min_y: f64,
    /// Maximum X coordinate
    pub max_x: f64,
    /// Maximum Y coordinate
    pub max_y: f64,
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BoundingBox({}, {}, {}, {})", self.min_x, self.min_y, self.max_x, self.max_y)
    }
}

impl BoundingBox {
    /// Creates a new bounding box with the specified coordinates.
    ///
    /// No validation happens here; use [`BoundingBox::validate`] on boxes
    /// that come from callers.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> BoundingBox {
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Builds the square of side `2 * radius` centered at `center`.
    ///
    /// Turns a point query into a rectangle query, and bounds a particle's
    /// disc.
    pub fn from_center_radius(center: Point, radius: f64) -> BoundingBox {
        BoundingBox::new(
            center.x - radius,
            center.y - radius,
            center.x + radius,
            center.y + radius,
        )
    }

    /// Like [`BoundingBox::from_center_radius`] but rejects non-finite
    /// coordinates and negative radii.
    pub fn try_from_center_radius(center: Point, radius: f64) -> SpatialResult<BoundingBox> {
        if !center.is_finite() {
            return Err(SpatialError::InvalidGeometry(format!(
                "center {} has a non-finite coordinate",
                center
            )));
        }
        if !radius.is_finite() || radius < 0.0 {
            return Err(SpatialError::InvalidGeometry(format!(
                "radius {} must be finite and non-negative",
                radius
            )));
        }
        let bbox = BoundingBox::from_center_radius(center, radius);
        bbox.validate()?;
        Ok(bbox)
    }

    /// The identity element for [`BoundingBox::union`]. Encloses nothing.
    pub fn empty() -> BoundingBox {
        BoundingBox::new(
            f64::INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
        )
    }

    /// Returns the width of the bounding box.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Returns the height of the bounding box.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Returns the area of the bounding box. An empty box has zero area.
    pub fn area(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.width() * self.height()
    }

    /// Returns the center point of the bounding box.
    pub fn center(&self) -> Point {
        Point::new((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }

    /// Checks if this bounding box contains a point.
    pub fn contains_point(&self, point: &Point) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    /// Checks if this bounding box contains another bounding box.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }

    /// Checks if this bounding box intersects another bounding box.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Returns the minimal bounding box enclosing both boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    /// Area growth needed for this box to enclose `other`.
    pub fn enlargement(&self, other: &BoundingBox) -> f64 {
        self.union(other).area() - self.area()
    }

    /// Checks if this bounding box encloses nothing.
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Checks if this bounding box is valid (finite and min <= max).
    pub fn is_valid(&self) -> bool {
        self.min_x.is_finite()
            && self.min_y.is_finite()
            && self.max_x.is_finite()
            && self.max_y.is_finite()
            && !self.is_empty()
    }

    /// Returns an `InvalidGeometry` error unless [`BoundingBox::is_valid`].
    pub fn validate(&self) -> SpatialResult<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(SpatialError::InvalidGeometry(format!(
                "{} is not a finite box with min <= max",
                self
            )))
        }
    }
}

/// Minimal box enclosing every box yielded by `boxes`; empty if there are none.
pub fn union_all<'a, I>(boxes: I) -> BoundingBox
where
    I: IntoIterator<Item = &'a BoundingBox>,
{
    boxes
        .into_iter()
        .fold(BoundingBox::empty(), |acc, b| acc.union(b))
}
