//! Incremental mesh construction around a kernel triangle.
//!
//! The algorithm works directly on a [`LinkStore`]:
//! 1. Pick the kernel: the three points nearest the centroid (replacing the third by the
//!    next nearest non-collinear point if needed), link them pairwise, and use the kernel
//!    centroid `O` as the angular origin.
//! 2. Insert the remaining points by increasing distance from `O`. An angularly sorted hull
//!    list brackets each new point between two hull vertices; points outside the bracket
//!    edge are linked to both ends, points on it split it, and points that land inside the
//!    mesh split the triangle (or edge) containing them.
//! 3. After every hull insertion, flatten the boundary locally with a work-list: reflex
//!    hull vertices next to the new point are filled when the pocket is sharp enough, the
//!    merged sector stays below 180° and the pocket triangle is empty.
//! 4. Optionally convexify the final boundary (see [`convexify`]).
//!
//! Every link edit keeps the link lists clockwise-sorted; a final `sort_links` pass
//! guards against accumulated ordering ties.

use std::f64::consts::PI;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::builder::ConstructionOptions;
use crate::core::collections::SmallBuffer;
use crate::core::iterators::clockwise_wedges;
use crate::core::link_store::{LinkStore, VertexKey};
use crate::core::mesh::MeshConstructionError;
use crate::core::traits::cancellation::CancellationCheck;
use crate::geometry::point::Point;
use crate::geometry::predicates::{
    Orientation, TriangleLocation, cross, locate_in_triangle, orientation, project_onto_line,
};
use crate::geometry::util::{angle_of, ccw_delta, interior_angle};

// =============================================================================
// STATISTICS
// =============================================================================

/// Counters collected during construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructionStatistics {
    /// Points passed to the builder.
    pub input_points: usize,
    /// Points merged into an earlier point by proximity deduplication.
    pub merged_duplicates: usize,
    /// Points that ended up as mesh vertices (kernel included).
    pub inserted: usize,
    /// Insertions outside the current hull.
    pub hull_insertions: usize,
    /// Insertions that split a triangle inside the mesh.
    pub interior_insertions: usize,
    /// Insertions that landed on an existing edge and split it.
    pub edge_splits: usize,
    /// Hull vertices removed by local flattening.
    pub flattened: usize,
    /// Boundary vertices filled by convexification.
    pub convexified: usize,
    /// Points that could not be placed and were dropped.
    pub skipped: usize,
    /// Sentinel vertices added around the input.
    pub sentinels: usize,
}

// =============================================================================
// TRIANGULATOR
// =============================================================================

#[derive(Clone, Copy, Debug)]
struct HullEntry {
    angle: f64,
    key: VertexKey,
}

/// Where an inserted point landed relative to the existing mesh.
enum Placement {
    Triangle(VertexKey, VertexKey, VertexKey),
    Edge(VertexKey, VertexKey),
    Unplaceable,
}

struct IncrementalTriangulator<'s> {
    store: &'s mut LinkStore,
    tolerance: f64,
    flatness: f64,
    origin: Point,
    hull: Vec<HullEntry>,
}

/// Links every vertex in `real` and `extra` into a triangulation.
///
/// `real` drives kernel selection; `extra` (sentinels) are only inserted. Vertices that
/// cannot be placed are removed from the store and returned.
pub(crate) fn triangulate<C>(
    store: &mut LinkStore,
    real: &[VertexKey],
    extra: &[VertexKey],
    options: &ConstructionOptions,
    statistics: &mut ConstructionStatistics,
    cancel: &C,
) -> Result<Vec<VertexKey>, MeshConstructionError>
where
    C: CancellationCheck + ?Sized,
{
    let kernel = select_kernel(store, real, options.tolerance)?;
    let mut triangulator = IncrementalTriangulator::with_kernel(store, kernel, options);
    statistics.inserted += 3;

    let mut remaining: Vec<VertexKey> = real
        .iter()
        .chain(extra)
        .copied()
        .filter(|k| !kernel.contains(k))
        .collect();
    let origin = triangulator.origin;
    remaining.sort_by_key(|&k| {
        OrderedFloat(triangulator.store.point(k).distance_squared_2d(&origin))
    });

    let mut skipped = Vec::new();
    for key in remaining {
        if cancel.is_cancelled() {
            return Err(MeshConstructionError::Cancelled);
        }
        if triangulator.insert(key, statistics) {
            statistics.inserted += 1;
        } else {
            let point = *triangulator.store.point(key);
            tracing::warn!(?key, %point, "could not place point in mesh; skipping");
            triangulator.store.remove_vertex(key);
            statistics.skipped += 1;
            skipped.push(key);
        }
    }

    if options.convex_boundary || !extra.is_empty() {
        statistics.convexified += convexify(store, options.tolerance);
    }
    store.sort_links();

    tracing::debug!(
        inserted = statistics.inserted,
        hull = statistics.hull_insertions,
        interior = statistics.interior_insertions,
        splits = statistics.edge_splits,
        flattened = statistics.flattened,
        convexified = statistics.convexified,
        skipped = statistics.skipped,
        "incremental construction finished"
    );
    Ok(skipped)
}

/// Three points nearest the centroid of `real`; the third is replaced by the next nearest
/// point off the line through the first two when necessary.
fn select_kernel(
    store: &LinkStore,
    real: &[VertexKey],
    tolerance: f64,
) -> Result<[VertexKey; 3], MeshConstructionError> {
    if real.len() < 3 {
        return Err(MeshConstructionError::InsufficientPoints { found: real.len() });
    }
    #[expect(clippy::cast_precision_loss, reason = "point counts are far below 2^52")]
    let n = real.len() as f64;
    let (sx, sy) = real.iter().fold((0.0, 0.0), |(sx, sy), &k| {
        let p = store.point(k);
        (sx + p.x, sy + p.y)
    });
    let centroid = Point::new_2d(sx / n, sy / n);

    let mut by_distance = real.to_vec();
    by_distance.sort_by_key(|&k| OrderedFloat(store.point(k).distance_squared_2d(&centroid)));

    let (a, b) = (by_distance[0], by_distance[1]);
    let (pa, pb) = (store.point(a), store.point(b));
    let c = by_distance[2..]
        .iter()
        .copied()
        .find(|&k| orientation(pa, pb, store.point(k), tolerance) != Orientation::DEGENERATE)
        .ok_or_else(|| MeshConstructionError::DegenerateGeometry {
            message: format!(
                "all {} points are collinear within tolerance {tolerance}",
                real.len()
            ),
        })?;
    Ok([a, b, c])
}

impl<'s> IncrementalTriangulator<'s> {
    fn with_kernel(
        store: &'s mut LinkStore,
        [a, b, c]: [VertexKey; 3],
        options: &ConstructionOptions,
    ) -> Self {
        store.link(a, b);
        store.link(b, c);
        store.link(c, a);

        let (pa, pb, pc) = (*store.point(a), *store.point(b), *store.point(c));
        let origin = Point::new_2d((pa.x + pb.x + pc.x) / 3.0, (pa.y + pb.y + pc.y) / 3.0);

        let mut hull: Vec<HullEntry> = [a, b, c]
            .into_iter()
            .map(|key| HullEntry {
                angle: angle_of(&origin, store.point(key)),
                key,
            })
            .collect();
        hull.sort_by_key(|e| OrderedFloat(e.angle));

        Self {
            store,
            tolerance: options.tolerance,
            flatness: options.flatness_threshold_degrees.to_radians(),
            origin,
            hull,
        }
    }

    /// Places `key`; returns `false` if it could not be placed.
    fn insert(&mut self, key: VertexKey, statistics: &mut ConstructionStatistics) -> bool {
        let p = *self.store.point(key);
        let theta = angle_of(&self.origin, &p);
        let h = self.hull.len();
        let idx = self.hull.partition_point(|e| e.angle <= theta);
        let lower = self.hull[(idx + h - 1) % h].key;
        let upper = self.hull[idx % h].key;
        let (pl, pu) = (*self.store.point(lower), *self.store.point(upper));

        match orientation(&pl, &pu, &p, self.tolerance) {
            Orientation::NEGATIVE => {
                self.store.link(key, lower);
                self.store.link(key, upper);
                self.hull.insert(idx, HullEntry { angle: theta, key });
                statistics.hull_insertions += 1;
                self.flatten(key, statistics);
                return true;
            }
            Orientation::DEGENERATE if self.strictly_between(&pl, &pu, &p) => {
                split_edge(self.store, lower, upper, key);
                self.hull.insert(idx, HullEntry { angle: theta, key });
                statistics.edge_splits += 1;
                self.flatten(key, statistics);
                return true;
            }
            _ => {}
        }

        match self.locate(&p) {
            Placement::Triangle(a, b, c) => {
                self.store.link(key, a);
                self.store.link(key, b);
                self.store.link(key, c);
                statistics.interior_insertions += 1;
                true
            }
            Placement::Edge(u, v) => {
                let on_hull = self.hull_adjacent(u, v);
                split_edge(self.store, u, v, key);
                statistics.edge_splits += 1;
                if on_hull {
                    let pos = self.hull.partition_point(|e| e.angle <= theta);
                    self.hull.insert(pos, HullEntry { angle: theta, key });
                    self.flatten(key, statistics);
                }
                true
            }
            Placement::Unplaceable => false,
        }
    }

    fn strictly_between(&self, a: &Point, b: &Point, p: &Point) -> bool {
        let length = a.distance_2d(b);
        project_onto_line(a, b, p).is_some_and(|(t, _)| {
            t * length > self.tolerance && (1.0 - t) * length > self.tolerance
        })
    }

    fn hull_adjacent(&self, u: VertexKey, v: VertexKey) -> bool {
        let h = self.hull.len();
        (0..h).any(|i| {
            let (x, y) = (self.hull[i].key, self.hull[(i + 1) % h].key);
            (x == u && y == v) || (x == v && y == u)
        })
    }

    /// Finds the triangle or edge containing `p` by scanning every triangle.
    fn locate(&self, p: &Point) -> Placement {
        for a in self.store.keys() {
            for (b, c) in clockwise_wedges(self.store, a) {
                let (pa, pb, pc) = (self.store.point(a), self.store.point(b), self.store.point(c));
                match locate_in_triangle(pa, pb, pc, p, self.tolerance) {
                    TriangleLocation::Inside => return Placement::Triangle(a, b, c),
                    TriangleLocation::OnEdge(0) => return Placement::Edge(b, c),
                    TriangleLocation::OnEdge(1) => return Placement::Edge(c, a),
                    TriangleLocation::OnEdge(_) => return Placement::Edge(a, b),
                    TriangleLocation::OnVertex(_) => return Placement::Unplaceable,
                    TriangleLocation::Outside => {}
                }
            }
        }
        Placement::Unplaceable
    }

    /// Work-list flattening of the hull around a freshly inserted hull vertex.
    fn flatten(&mut self, inserted: VertexKey, statistics: &mut ConstructionStatistics) {
        let Some(i) = self.hull_position(inserted) else {
            return;
        };
        let h = self.hull.len();
        let mut work: SmallBuffer<VertexKey, 8> = SmallBuffer::new();
        work.push(self.hull[(i + 1) % h].key);
        work.push(self.hull[(i + h - 1) % h].key);

        while let Some(v) = work.pop() {
            let h = self.hull.len();
            if h <= 3 {
                break;
            }
            let Some(i) = self.hull_position(v) else {
                continue;
            };
            let prev = self.hull[(i + h - 1) % h];
            let next = self.hull[(i + 1) % h];
            if self.can_flatten(prev, v, next) {
                self.store.link(prev.key, next.key);
                self.hull.remove(i);
                statistics.flattened += 1;
                work.push(prev.key);
                work.push(next.key);
            }
        }
    }

    fn can_flatten(&self, prev: HullEntry, v: VertexKey, next: HullEntry) -> bool {
        let pp = self.store.point(prev.key);
        let pv = self.store.point(v);
        let pn = self.store.point(next.key);

        orientation(pp, pn, pv, self.tolerance) == Orientation::POSITIVE
            && interior_angle(pp, pv, pn) < self.flatness
            && ccw_delta(prev.angle, next.angle) < PI
            && !self.store.are_linked(prev.key, next.key)
            && self.hull.iter().all(|e| {
                e.key == prev.key
                    || e.key == v
                    || e.key == next.key
                    || locate_in_triangle(pp, pv, pn, self.store.point(e.key), self.tolerance)
                        == TriangleLocation::Outside
            })
    }

    fn hull_position(&self, key: VertexKey) -> Option<usize> {
        self.hull.iter().position(|e| e.key == key)
    }
}

/// Replaces edge `u–v` by `u–p`, `p–v` and links `p` to the apex of each triangle on the
/// edge.
pub(crate) fn split_edge(store: &mut LinkStore, u: VertexKey, v: VertexKey, p: VertexKey) {
    let apexes = edge_apexes(store, u, v);
    store.unlink(u, v);
    store.link(p, u);
    store.link(p, v);
    for w in apexes.into_iter().flatten() {
        store.link(p, w);
    }
}

/// Apex of the triangle on each side of edge `u–v`: `[clockwise side, counter-clockwise
/// side]` as seen rotating around `u` from `v`.
pub(crate) fn edge_apexes(
    store: &LinkStore,
    u: VertexKey,
    v: VertexKey,
) -> [Option<VertexKey>; 2] {
    let pu = store.point(u);
    let pv = store.point(v);
    let cw = store
        .next_clockwise(u, v)
        .filter(|&w| w != v && store.are_linked(v, w) && cross(pu, pv, store.point(w)) < 0.0);
    let ccw = store
        .next_counter_clockwise(u, v)
        .filter(|&w| {
            w != v && Some(w) != cw && store.are_linked(v, w) && cross(pu, store.point(w), pv) < 0.0
        });
    [cw, ccw]
}

// =============================================================================
// BOUNDARY
// =============================================================================

/// Counter-clockwise outer boundary of the subgraph induced by `include`.
///
/// Starts at the leftmost (then lowest) included vertex that has an included neighbour
/// and follows the outer face: arriving at `v` from `u`, the next boundary vertex is the
/// neighbour preceding `u` in `v`'s clockwise list. Stops on returning to the start.
pub(crate) fn boundary_cycle<F>(store: &LinkStore, include: F) -> Vec<VertexKey>
where
    F: Fn(VertexKey) -> bool,
{
    let included_links = |k: VertexKey| -> SmallBuffer<VertexKey, 8> {
        store.neighbors(k).iter().copied().filter(|&n| include(n)).collect()
    };

    let Some(start) = store
        .keys()
        .filter(|&k| include(k) && !included_links(k).is_empty())
        .min_by(|&a, &b| {
            let (pa, pb) = (store.point(a), store.point(b));
            pa.x.total_cmp(&pb.x).then(pa.y.total_cmp(&pb.y))
        })
    else {
        return Vec::new();
    };

    let first_links = included_links(start);
    // Neighbours of the leftmost vertex all lie in (-90°, 90°]; the last one clockwise
    // borders the outer face.
    let Some(&first) = first_links.last() else {
        return Vec::new();
    };

    let limit = 2 * store.edge_count() + 2;
    let mut cycle = vec![start];
    let (mut prev, mut current) = (start, first);
    while current != start && cycle.len() <= limit {
        cycle.push(current);
        let links = included_links(current);
        let Some(pos) = links.iter().position(|&k| k == prev) else {
            break;
        };
        let next = links[(pos + links.len() - 1) % links.len()];
        prev = current;
        current = next;
    }
    cycle
}

/// Fills every strictly reflex boundary vertex whose pocket triangle holds no other
/// boundary vertex, until none is left. Returns the number of vertices filled.
///
/// Collinear boundary vertices (within `tolerance`) are kept. Running it again on its own
/// output fills nothing.
pub(crate) fn convexify(store: &mut LinkStore, tolerance: f64) -> usize {
    let cycle = boundary_cycle(store, |_| true);
    let n = cycle.len();
    if n < 4 {
        return 0;
    }

    let mut next: Vec<usize> = (0..n).map(|i| (i + 1) % n).collect();
    let mut prev: Vec<usize> = (0..n).map(|i| (i + n - 1) % n).collect();
    let mut alive = vec![true; n];
    let mut remaining = n;
    let mut filled = 0;

    loop {
        let mut filled_this_pass = 0;
        let mut work: Vec<usize> = (0..n).rev().filter(|&i| alive[i]).collect();
        while let Some(i) = work.pop() {
            if !alive[i] || remaining <= 3 {
                continue;
            }
            let (p, q) = (prev[i], next[i]);
            let (kp, kv, kq) = (cycle[p], cycle[i], cycle[q]);
            if kp == kq || kp == kv || kq == kv {
                continue;
            }
            let (pp, pv, pq) = (*store.point(kp), *store.point(kv), *store.point(kq));
            if orientation(&pp, &pq, &pv, tolerance) != Orientation::POSITIVE
                || store.are_linked(kp, kq)
            {
                continue;
            }

            let mut j = next[q];
            let mut blocked = false;
            while j != p {
                let kj = cycle[j];
                if kj != kp
                    && kj != kv
                    && kj != kq
                    && locate_in_triangle(&pp, &pv, &pq, store.point(kj), tolerance)
                        != TriangleLocation::Outside
                {
                    blocked = true;
                    break;
                }
                j = next[j];
            }
            if blocked {
                continue;
            }

            store.link(kp, kq);
            alive[i] = false;
            next[p] = q;
            prev[q] = p;
            remaining -= 1;
            filled_this_pass += 1;
            work.push(q);
            work.push(p);
        }
        filled += filled_this_pass;
        if filled_this_pass == 0 {
            break;
        }
    }

    if filled > 0 {
        tracing::debug!(filled, "convexified boundary");
    }
    filled
}
