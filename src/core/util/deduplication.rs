//! Proximity deduplication of input points.

use ordered_float::OrderedFloat;

use crate::core::collections::{
    Entry, FastHashMap, HashGridIndex, fast_hash_map_with_capacity,
};
use crate::geometry::point::Point;

/// Outcome of [`dedup_points_within`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Deduplication {
    /// Input indices of the points that were kept, in input order.
    pub kept: Vec<usize>,
    /// For every input index, the position in `kept` of the point it merged into.
    pub representative: Vec<usize>,
}

impl Deduplication {
    /// Number of input points merged into an earlier one.
    #[must_use]
    pub fn merged(&self) -> usize {
        self.representative.len() - self.kept.len()
    }
}

/// Merges points whose planar distance is below `tolerance`; the first occurrence wins.
///
/// Uses a [`HashGridIndex`] with cell size `tolerance`, so each point is compared against
/// the few kept points in its 3×3 cell neighbourhood. With `tolerance == 0` only exact
/// `(x, y)` matches are merged. If the grid cannot key a coordinate the remaining points
/// fall back to a linear scan.
///
/// # Examples
///
/// ```
/// use tinlink::core::util::dedup_points_within;
/// use tinlink::geometry::point::Point;
///
/// let points = [
///     Point::new_2d(0.0, 0.0),
///     Point::new_2d(1.0, 1.0),
///     Point::new_2d(1e-9, 0.0), // within 1e-6 of the first point
/// ];
/// let dedup = dedup_points_within(&points, 1e-6);
/// assert_eq!(dedup.kept, vec![0, 1]);
/// assert_eq!(dedup.representative, vec![0, 1, 0]);
/// assert_eq!(dedup.merged(), 1);
/// ```
#[must_use]
pub fn dedup_points_within(points: &[Point], tolerance: f64) -> Deduplication {
    let mut kept = Vec::with_capacity(points.len());
    let mut representative = Vec::with_capacity(points.len());

    if tolerance <= 0.0 || !tolerance.is_finite() {
        let mut exact: FastHashMap<(OrderedFloat<f64>, OrderedFloat<f64>), usize> =
            fast_hash_map_with_capacity(points.len());
        for (i, p) in points.iter().enumerate() {
            match exact.entry((OrderedFloat(p.x), OrderedFloat(p.y))) {
                Entry::Occupied(slot) => representative.push(*slot.get()),
                Entry::Vacant(slot) => {
                    slot.insert(kept.len());
                    representative.push(kept.len());
                    kept.push(i);
                }
            }
        }
        return Deduplication {
            kept,
            representative,
        };
    }

    let mut grid: HashGridIndex<usize> = HashGridIndex::new(tolerance);
    for (i, p) in points.iter().enumerate() {
        let mut found = None;
        let used_grid = grid.for_each_candidate(p.x, p.y, |slot| {
            if points[kept[slot]].distance_2d(p) < tolerance {
                found = Some(slot);
                return false;
            }
            true
        });
        if !used_grid {
            found = kept
                .iter()
                .position(|&k| points[k].distance_2d(p) < tolerance);
        }

        if let Some(slot) = found {
            representative.push(slot);
        } else {
            grid.insert(kept.len(), p.x, p.y);
            representative.push(kept.len());
            kept.push(i);
        }
    }

    Deduplication {
        kept,
        representative,
    }
}
