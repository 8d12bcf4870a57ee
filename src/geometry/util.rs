//! Angular and interpolation helpers shared by construction, constraint enforcement and
//! contouring.

use std::f64::consts::{PI, TAU};

use crate::geometry::point::Point;
use crate::geometry::predicates::cross;

/// Polar angle of `to` seen from `from`, in `(-π, π]`.
#[inline]
#[must_use]
pub fn angle_of(from: &Point, to: &Point) -> f64 {
    (to.y - from.y).atan2(to.x - from.x)
}

/// Counter-clockwise rotation needed to go from direction `from` to direction `to`, in
/// `[0, 2π)`.
#[inline]
#[must_use]
pub fn ccw_delta(from: f64, to: f64) -> f64 {
    let delta = (to - from).rem_euclid(TAU);
    // rem_euclid may round up to exactly TAU for tiny negative inputs
    if delta >= TAU { 0.0 } else { delta }
}

/// Clockwise rotation needed to go from direction `from` to direction `to`, in `[0, 2π)`.
#[inline]
#[must_use]
pub fn cw_delta(from: f64, to: f64) -> f64 {
    ccw_delta(to, from)
}

/// Deviation from straight of the polyline `prev → v → next`, in `[0, π]`.
///
/// `0` means the three points continue in a straight line; `π` means the path folds back.
#[must_use]
pub fn turning_angle(prev: &Point, v: &Point, next: &Point) -> f64 {
    let ax = v.x - prev.x;
    let ay = v.y - prev.y;
    let bx = next.x - v.x;
    let by = next.y - v.y;
    let dot = ax.mul_add(bx, ay * by);
    cross(prev, v, next).abs().atan2(dot)
}

/// Interior angle at `v` between the rays `v → a` and `v → b`, in `[0, π]`.
#[must_use]
pub fn interior_angle(a: &Point, v: &Point, b: &Point) -> f64 {
    PI - turning_angle(a, v, b)
}

/// Barycentric weights of `p` in triangle `a, b, c`.
///
/// Returns `None` for a degenerate (zero-area) triangle.
#[must_use]
pub fn barycentric(a: &Point, b: &Point, c: &Point, p: &Point) -> Option<[f64; 3]> {
    let area = cross(a, b, c);
    if area == 0.0 || !area.is_finite() {
        return None;
    }
    let wa = cross(p, b, c) / area;
    let wb = cross(a, p, c) / area;
    Some([wa, wb, 1.0 - wa - wb])
}

/// Parameter at which the value crosses `level` when moving linearly from `from` to `to`.
///
/// Callers guarantee `from != to`.
#[inline]
#[must_use]
pub fn crossing_parameter(from: f64, to: f64, level: f64) -> f64 {
    ((level - from) / (to - from)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn deltas_wrap_into_full_turn() {
        assert_relative_eq!(ccw_delta(0.0, FRAC_PI_2), FRAC_PI_2);
        assert_relative_eq!(ccw_delta(FRAC_PI_2, 0.0), 3.0 * FRAC_PI_2);
        assert_relative_eq!(cw_delta(FRAC_PI_2, 0.0), FRAC_PI_2);
        assert_relative_eq!(ccw_delta(-PI + 0.1, PI - 0.1), TAU - 0.2, epsilon = 1e-12);
        assert!(ccw_delta(1.0, 1.0) < 1e-15);
    }

    #[test]
    fn turning_and_interior_angles() {
        let a = Point::new_2d(0.0, 0.0);
        let v = Point::new_2d(1.0, 0.0);
        assert_relative_eq!(turning_angle(&a, &v, &Point::new_2d(2.0, 0.0)), 0.0);
        assert_relative_eq!(turning_angle(&a, &v, &Point::new_2d(1.0, 1.0)), FRAC_PI_2);
        assert_relative_eq!(interior_angle(&a, &v, &Point::new_2d(1.0, -1.0)), FRAC_PI_2);
        assert_relative_eq!(angle_of(&a, &Point::new_2d(0.0, -3.0)), -FRAC_PI_2);
    }

    #[test]
    fn barycentric_weights_sum_to_one() {
        let a = Point::new_2d(0.0, 0.0);
        let b = Point::new_2d(4.0, 0.0);
        let c = Point::new_2d(0.0, 4.0);
        let w = barycentric(&a, &b, &c, &Point::new_2d(1.0, 1.0)).unwrap();
        assert_relative_eq!(w[0], 0.5);
        assert_relative_eq!(w[1], 0.25);
        assert_relative_eq!(w[2], 0.25);
        assert!(barycentric(&a, &b, &Point::new_2d(8.0, 0.0), &a).is_none());
    }

    #[test]
    fn crossing_parameter_is_clamped() {
        assert_relative_eq!(crossing_parameter(0.0, 100.0, 25.0), 0.25);
        assert_relative_eq!(crossing_parameter(100.0, 0.0, 25.0), 0.75);
        assert_relative_eq!(crossing_parameter(0.0, 10.0, 10.0), 1.0);
    }
}
