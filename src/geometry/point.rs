//! Point type used for all mesh coordinates.
//!
//! Triangulation works in the XY plane; `z` carries the elevation used by the
//! contour extractor and is `0.0` for purely planar input.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A coordinate in the plane with an elevation.
///
/// # Examples
///
/// ```rust
/// use tinlink::geometry::point::Point;
///
/// let p = Point::new(1.0, 2.0, 10.0);
/// let q = Point::from([4.0, 6.0]);
/// assert_eq!(q.z, 0.0);
/// assert_eq!(p.distance_2d(&q), 5.0);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Easting / horizontal coordinate.
    pub x: f64,
    /// Northing / vertical coordinate.
    pub y: f64,
    /// Elevation.
    pub z: f64,
}

impl Point {
    /// Creates a point from its three coordinates.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Creates a planar point with `z = 0.0`.
    #[inline]
    #[must_use]
    pub const fn new_2d(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Returns `true` when all three coordinates are finite.
    #[inline]
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Planar (XY) coordinates.
    #[inline]
    #[must_use]
    pub const fn xy(&self) -> [f64; 2] {
        [self.x, self.y]
    }

    /// Squared planar distance to `other`.
    #[inline]
    #[must_use]
    pub fn distance_squared_2d(&self, other: &Self) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Planar distance to `other`; elevation is ignored.
    #[inline]
    #[must_use]
    pub fn distance_2d(&self, other: &Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Linear interpolation between `self` (`t = 0`) and `other` (`t = 1`) in all three
    /// coordinates.
    #[inline]
    #[must_use]
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        Self {
            x: (other.x - self.x).mul_add(t, self.x),
            y: (other.y - self.y).mul_add(t, self.y),
            z: (other.z - self.z).mul_add(t, self.z),
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl From<[f64; 2]> for Point {
    #[inline]
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new_2d(x, y)
    }
}

impl From<[f64; 3]> for Point {
    #[inline]
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl From<(f64, f64)> for Point {
    #[inline]
    fn from((x, y): (f64, f64)) -> Self {
        Self::new_2d(x, y)
    }
}

impl From<(f64, f64, f64)> for Point {
    #[inline]
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self::new(x, y, z)
    }
}

impl From<Point> for (f64, f64, f64) {
    #[inline]
    fn from(p: Point) -> Self {
        (p.x, p.y, p.z)
    }
}

/// Axis-aligned extent of a point set, elevation included.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Lower corner.
    pub min: Point,
    /// Upper corner.
    pub max: Point,
}

impl BoundingBox {
    /// Smallest box containing every point, or `None` for an empty iterator.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(
            Self {
                min: first,
                max: first,
            },
            |mut bbox, p| {
                bbox.min.x = bbox.min.x.min(p.x);
                bbox.min.y = bbox.min.y.min(p.y);
                bbox.min.z = bbox.min.z.min(p.z);
                bbox.max.x = bbox.max.x.max(p.x);
                bbox.max.y = bbox.max.y.max(p.y);
                bbox.max.z = bbox.max.z.max(p.z);
                bbox
            },
        ))
    }

    /// Width along x.
    #[inline]
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Height along y.
    #[inline]
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Larger of width and height.
    #[inline]
    #[must_use]
    pub fn planar_extent(&self) -> f64 {
        self.width().max(self.height())
    }

    /// Returns `true` when `(x, y)` lies inside the planar box (borders included).
    #[inline]
    #[must_use]
    pub fn contains_xy(&self, x: f64, y: f64) -> bool {
        (self.min.x..=self.max.x).contains(&x) && (self.min.y..=self.max.y).contains(&y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bounding_box_covers_all_points() {
        let points = [
            Point::new(1.0, -2.0, 5.0),
            Point::new(-3.0, 4.0, 0.0),
            Point::new(2.0, 0.0, -1.0),
        ];
        let bbox = BoundingBox::from_points(&points).unwrap();
        assert_eq!(bbox.min, Point::new(-3.0, -2.0, -1.0));
        assert_eq!(bbox.max, Point::new(2.0, 4.0, 5.0));
        assert_relative_eq!(bbox.width(), 5.0);
        assert_relative_eq!(bbox.height(), 6.0);
        assert_relative_eq!(bbox.planar_extent(), 6.0);
        assert!(bbox.contains_xy(0.0, 0.0));
        assert!(!bbox.contains_xy(2.5, 0.0));
        assert!(BoundingBox::from_points(&[]).is_none());
    }

    #[test]
    fn conversions_fill_missing_elevation() {
        assert_eq!(Point::from([1.0, 2.0]), Point::new(1.0, 2.0, 0.0));
        assert_eq!(Point::from((1.0, 2.0, 3.0)), Point::new(1.0, 2.0, 3.0));
        let tuple: (f64, f64, f64) = Point::new(4.0, 5.0, 6.0).into();
        assert_eq!(tuple, (4.0, 5.0, 6.0));
    }

    #[test]
    fn planar_distance_ignores_elevation() {
        let a = Point::new(0.0, 0.0, 100.0);
        let b = Point::new(3.0, 4.0, -50.0);
        assert_relative_eq!(a.distance_2d(&b), 5.0);
        assert_relative_eq!(a.distance_squared_2d(&b), 25.0);
    }

    #[test]
    fn lerp_interpolates_all_coordinates() {
        let a = Point::new(0.0, 0.0, 0.0);
        let b = Point::new(10.0, 20.0, 100.0);
        let m = a.lerp(&b, 0.25);
        assert_relative_eq!(m.x, 2.5);
        assert_relative_eq!(m.y, 5.0);
        assert_relative_eq!(m.z, 25.0);
    }

    #[test]
    fn non_finite_points_are_detected() {
        assert!(Point::new(1.0, 2.0, 3.0).is_finite());
        assert!(!Point::new(f64::NAN, 2.0, 3.0).is_finite());
        assert!(!Point::new(1.0, f64::INFINITY, 3.0).is_finite());
    }
}
