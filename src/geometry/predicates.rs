//! Planar geometric predicates.
//!
//! All predicates take an explicit `tolerance` expressed as a planar distance. A point
//! closer than `tolerance` to a line is treated as lying on it, which is how near-collinear
//! triples are resolved throughout construction and constraint enforcement.

use crate::geometry::point::Point;

/// Orientation of an ordered point triple in the XY plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Clockwise turn (`c` lies to the right of `a → b`)
    NEGATIVE,
    /// The three points are collinear within tolerance
    DEGENERATE,
    /// Counter-clockwise turn (`c` lies to the left of `a → b`)
    POSITIVE,
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NEGATIVE => write!(f, "NEGATIVE"),
            Self::DEGENERATE => write!(f, "DEGENERATE"),
            Self::POSITIVE => write!(f, "POSITIVE"),
        }
    }
}

/// Where a point lies relative to a triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriangleLocation {
    /// Strictly outside (farther than tolerance from every edge on the outer side)
    Outside,
    /// Strictly inside
    Inside,
    /// On the edge opposite the corner with this index (0, 1 or 2), within tolerance
    OnEdge(usize),
    /// Coincides with the corner with this index, within tolerance
    OnVertex(usize),
}

/// Twice the signed area of triangle `a, b, c`; positive when counter-clockwise.
#[inline]
#[must_use]
pub fn cross(a: &Point, b: &Point, c: &Point) -> f64 {
    (b.x - a.x).mul_add(c.y - a.y, -((b.y - a.y) * (c.x - a.x)))
}

/// Orientation of `c` relative to the directed line `a → b`.
///
/// `c` is [`Orientation::DEGENERATE`] when its distance to the line through `a` and `b` is at
/// most `tolerance`, or when `a` and `b` coincide.
///
/// # Examples
///
/// ```rust
/// use tinlink::geometry::point::Point;
/// use tinlink::geometry::predicates::{Orientation, orientation};
///
/// let a = Point::new_2d(0.0, 0.0);
/// let b = Point::new_2d(1.0, 0.0);
/// assert_eq!(orientation(&a, &b, &Point::new_2d(0.5, 1.0), 1e-9), Orientation::POSITIVE);
/// assert_eq!(orientation(&a, &b, &Point::new_2d(0.5, -1.0), 1e-9), Orientation::NEGATIVE);
/// assert_eq!(orientation(&a, &b, &Point::new_2d(3.0, 0.0), 1e-9), Orientation::DEGENERATE);
/// ```
#[must_use]
pub fn orientation(a: &Point, b: &Point, c: &Point, tolerance: f64) -> Orientation {
    let length = a.distance_2d(b);
    if length <= tolerance {
        return Orientation::DEGENERATE;
    }
    let det = cross(a, b, c);
    if det.abs() <= tolerance * length {
        Orientation::DEGENERATE
    } else if det > 0.0 {
        Orientation::POSITIVE
    } else {
        Orientation::NEGATIVE
    }
}

/// Returns `true` when segments `p1–p2` and `q1–q2` cross at a single interior point of both.
///
/// Touching at an endpoint, or an endpoint lying on the other segment within `tolerance`,
/// is not a proper crossing.
#[must_use]
pub fn segments_cross_properly(
    p1: &Point,
    p2: &Point,
    q1: &Point,
    q2: &Point,
    tolerance: f64,
) -> bool {
    let o1 = orientation(p1, p2, q1, tolerance);
    let o2 = orientation(p1, p2, q2, tolerance);
    let o3 = orientation(q1, q2, p1, tolerance);
    let o4 = orientation(q1, q2, p2, tolerance);
    let opposite = |u: Orientation, v: Orientation| {
        matches!(
            (u, v),
            (Orientation::POSITIVE, Orientation::NEGATIVE)
                | (Orientation::NEGATIVE, Orientation::POSITIVE)
        )
    };
    opposite(o1, o2) && opposite(o3, o4)
}

/// Parameters `(t, u)` of the intersection of the lines through `p1–p2` and `q1–q2`, such
/// that the intersection is `p1 + t (p2 - p1)` and `q1 + u (q2 - q1)`.
///
/// Returns `None` for parallel (or degenerate) lines.
#[must_use]
pub fn line_intersection_parameters(
    p1: &Point,
    p2: &Point,
    q1: &Point,
    q2: &Point,
) -> Option<(f64, f64)> {
    let rx = p2.x - p1.x;
    let ry = p2.y - p1.y;
    let sx = q2.x - q1.x;
    let sy = q2.y - q1.y;
    let denom = rx.mul_add(sy, -(ry * sx));
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }
    let qpx = q1.x - p1.x;
    let qpy = q1.y - p1.y;
    let t = qpx.mul_add(sy, -(qpy * sx)) / denom;
    let u = qpx.mul_add(ry, -(qpy * rx)) / denom;
    Some((t, u))
}

/// Projection of `p` onto the segment `a → b`: the line parameter `t` (unclamped, `0` at `a`
/// and `1` at `b`) and the perpendicular distance from `p` to the line.
///
/// Returns `None` when `a` and `b` coincide.
#[must_use]
pub fn project_onto_line(a: &Point, b: &Point, p: &Point) -> Option<(f64, f64)> {
    let length_sq = a.distance_squared_2d(b);
    if length_sq == 0.0 {
        return None;
    }
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let t = (p.x - a.x).mul_add(dx, (p.y - a.y) * dy) / length_sq;
    let distance = cross(a, b, p).abs() / length_sq.sqrt();
    Some((t, distance))
}

/// Classifies `p` against triangle `a, b, c` (any winding).
#[must_use]
pub fn locate_in_triangle(
    a: &Point,
    b: &Point,
    c: &Point,
    p: &Point,
    tolerance: f64,
) -> TriangleLocation {
    for (index, corner) in [a, b, c].into_iter().enumerate() {
        if corner.distance_2d(p) <= tolerance {
            return TriangleLocation::OnVertex(index);
        }
    }

    let ccw = cross(a, b, c) > 0.0;
    // Edge opposite corner i is (corners[i+1], corners[i+2]).
    let edges = [(b, c), (c, a), (a, b)];
    let mut on_edge = None;
    for (index, (u, v)) in edges.into_iter().enumerate() {
        let o = orientation(u, v, p, tolerance);
        let inside_side = if ccw {
            Orientation::POSITIVE
        } else {
            Orientation::NEGATIVE
        };
        match o {
            Orientation::DEGENERATE => {
                if on_edge.is_none() {
                    on_edge = Some(index);
                }
            }
            side if side != inside_side => return TriangleLocation::Outside,
            _ => {}
        }
    }

    match on_edge {
        Some(index) => {
            let (u, v) = edges[index];
            match project_onto_line(u, v, p) {
                Some((t, _)) if (0.0..=1.0).contains(&t) => TriangleLocation::OnEdge(index),
                _ => TriangleLocation::Outside,
            }
        }
        None => TriangleLocation::Inside,
    }
}
