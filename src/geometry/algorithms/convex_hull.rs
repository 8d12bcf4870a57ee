//! Planar convex hull by Andrew's monotone chain.
//!
//! The hull is used before construction to reject fully collinear input and to size the
//! sentinel frame, and is available to callers as advisory bounding geometry (for instance
//! to clip a DEM export to the surveyed area).

use ordered_float::OrderedFloat;

use crate::geometry::point::Point;
use crate::geometry::predicates::cross;

// =============================================================================
// CONVEX HULL
// =============================================================================

/// Counter-clockwise convex hull of a planar point set.
///
/// Stores indices into the slice passed to [`convex_hull_2d`], starting at the
/// lexicographically smallest point. Collinear boundary points are not part of the hull.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvexHull2D {
    indices: Vec<usize>,
    corners: Vec<Point>,
}

impl ConvexHull2D {
    /// Indices of the hull corners into the original point slice, counter-clockwise.
    #[inline]
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Hull corners, counter-clockwise.
    #[inline]
    #[must_use]
    pub fn corners(&self) -> &[Point] {
        &self.corners
    }

    /// Number of hull corners (always at least 3).
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.indices.len()
    }

    /// Always `false`; a hull has at least three corners.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Enclosed area.
    #[must_use]
    pub fn area(&self) -> f64 {
        let origin = self.corners[0];
        let twice: f64 = self
            .corners
            .windows(2)
            .skip(1)
            .map(|w| cross(&origin, &w[0], &w[1]))
            .sum();
        twice * 0.5
    }

    /// Returns `true` when `point` lies inside or within `tolerance` of the hull.
    #[must_use]
    pub fn contains(&self, point: &Point, tolerance: f64) -> bool {
        let n = self.corners.len();
        (0..n).all(|i| {
            let a = &self.corners[i];
            let b = &self.corners[(i + 1) % n];
            let length = a.distance_2d(b);
            cross(a, b, point) >= -tolerance * length
        })
    }
}

/// Computes the counter-clockwise convex hull of `points`.
///
/// Points are sorted lexicographically by `(x, y)`; lower and upper chains are built by
/// popping every non-left turn and spliced at their shared endpoints.
///
/// Returns `None` when fewer than three non-collinear points exist. Non-finite
/// coordinates are the caller's responsibility.
///
/// # Examples
///
/// ```rust
/// use tinlink::geometry::algorithms::convex_hull::convex_hull_2d;
/// use tinlink::geometry::point::Point;
///
/// let points = [
///     Point::new_2d(0.0, 0.0),
///     Point::new_2d(2.0, 0.0),
///     Point::new_2d(1.0, 0.5),
///     Point::new_2d(2.0, 2.0),
///     Point::new_2d(0.0, 2.0),
///     Point::new_2d(1.0, 0.0), // collinear on the bottom edge
/// ];
/// let hull = convex_hull_2d(&points).unwrap();
/// assert_eq!(hull.indices(), &[0, 1, 3, 4]);
/// assert_eq!(hull.area(), 4.0);
///
/// let collinear = [Point::new_2d(0.0, 0.0), Point::new_2d(1.0, 1.0), Point::new_2d(2.0, 2.0)];
/// assert!(convex_hull_2d(&collinear).is_none());
/// ```
#[must_use]
pub fn convex_hull_2d(points: &[Point]) -> Option<ConvexHull2D> {
    if points.len() < 3 {
        return None;
    }

    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by_key(|&i| (OrderedFloat(points[i].x), OrderedFloat(points[i].y)));
    order.dedup_by(|a, b| points[*a].xy() == points[*b].xy());
    if order.len() < 3 {
        return None;
    }

    let build_chain = |iter: &mut dyn Iterator<Item = usize>| {
        let mut chain: Vec<usize> = Vec::with_capacity(order.len());
        for i in iter {
            while chain.len() >= 2 {
                let a = &points[chain[chain.len() - 2]];
                let b = &points[chain[chain.len() - 1]];
                if cross(a, b, &points[i]) <= 0.0 {
                    chain.pop();
                } else {
                    break;
                }
            }
            chain.push(i);
        }
        chain
    };

    let mut lower = build_chain(&mut order.iter().copied());
    let mut upper = build_chain(&mut order.iter().rev().copied());
    lower.pop();
    upper.pop();
    lower.extend(upper);

    if lower.len() < 3 {
        return None;
    }

    let corners = lower.iter().map(|&i| points[i]).collect();
    Some(ConvexHull2D {
        indices: lower,
        corners,
    })
}
