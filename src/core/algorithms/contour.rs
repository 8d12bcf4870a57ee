//! Contour (isoline) extraction by marching triangles.
//!
//! For every level `h = k * step` between the lowest and highest elevation, a vertex is
//! *above* when its elevation is `>= h`. An edge joining an above and a below vertex is a
//! *crossing edge*; every triangle has either zero or two of them, so the crossing points
//! chain into polylines. Chains that reach the border of the contoured region are traced
//! first (open polylines); whatever crossing edges remain form closed loops.
//!
//! Only triangles reported by [`Mesh::iter_triangles`] with the configured maximum edge
//! length take part, so long edges across data gaps never produce contour segments.

use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::collections::{
    FastHashMap, FastHashSet, SmallBuffer, fast_hash_map_with_capacity,
    fast_hash_set_with_capacity,
};
use crate::core::edge::EdgeKey;
use crate::core::link_store::VertexKey;
use crate::core::mesh::Mesh;
use crate::core::traits::cancellation::{CancellationCheck, NeverCancel};
use crate::geometry::util::crossing_parameter;

// =============================================================================
// OPTIONS AND RESULTS
// =============================================================================

/// Which per-vertex value is contoured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElevationSource {
    /// The `z` coordinate.
    #[default]
    Z,
    /// The attribute at this index. Vertices without it are left out.
    Attribute(usize),
}

/// Parameters for contour extraction.
///
/// # Examples
///
/// ```rust
/// use tinlink::core::algorithms::contour::{ContourOptions, ElevationSource};
///
/// let options = ContourOptions::new(5.0)
///     .with_max_edge_length(250.0)
///     .with_source(ElevationSource::Attribute(0));
/// assert_eq!(options.step, 5.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourOptions {
    /// Elevation difference between consecutive levels. Must be positive and finite.
    pub step: f64,
    /// Triangles with a longer edge are not contoured. `None` keeps every triangle.
    pub max_edge_length: Option<f64>,
    /// Value being contoured.
    pub source: ElevationSource,
    /// Upper bound on the number of levels a single call may scan.
    pub max_levels: u64,
}

impl Default for ContourOptions {
    fn default() -> Self {
        Self {
            step: 1.0,
            max_edge_length: None,
            source: ElevationSource::Z,
            max_levels: 100_000,
        }
    }
}

impl ContourOptions {
    /// Options with the given step and defaults otherwise.
    #[must_use]
    pub fn new(step: f64) -> Self {
        Self {
            step,
            ..Self::default()
        }
    }

    /// Sets the level step.
    #[must_use]
    pub const fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    /// Sets the maximum edge length.
    #[must_use]
    pub const fn with_max_edge_length(mut self, max_edge_length: f64) -> Self {
        self.max_edge_length = Some(max_edge_length);
        self
    }

    /// Sets the elevation source.
    #[must_use]
    pub const fn with_source(mut self, source: ElevationSource) -> Self {
        self.source = source;
        self
    }

    /// Sets the level limit.
    #[must_use]
    pub const fn with_max_levels(mut self, max_levels: u64) -> Self {
        self.max_levels = max_levels;
        self
    }
}

/// Errors from contour extraction.
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum ContourError {
    /// The step is zero, negative or not finite.
    #[error("Invalid contour step {step}: must be positive and finite")]
    InvalidStep {
        /// The rejected step.
        step: f64,
    },
    /// The level indices for the elevation range do not fit, or there are too many.
    #[error("Elevation range [{min}, {max}] with step {step} exceeds the level limit")]
    LevelOutOfRange {
        /// Lowest elevation.
        min: f64,
        /// Highest elevation.
        max: f64,
        /// Level step.
        step: f64,
    },
    /// Cancellation was requested.
    #[error("Contour extraction was cancelled")]
    Cancelled,
}

/// One traced polyline, as collected by [`Mesh::contour_lines`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContourLine {
    /// Level index `k`; the elevation is `k * step`.
    pub level_index: i64,
    /// Elevation of the level.
    pub elevation: f64,
    /// Points `(x, y, elevation)`. Closed lines do not repeat their first point.
    pub points: Vec<(f64, f64, f64)>,
    /// Whether the line closes on itself.
    pub closed: bool,
}

/// Totals for one extraction run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContourSummary {
    /// Levels scanned.
    pub levels: usize,
    /// Polylines emitted.
    pub polylines: usize,
    /// Closed polylines among them.
    pub closed: usize,
    /// Points emitted over all polylines.
    pub points: usize,
    /// First level index scanned.
    pub first_level: Option<i64>,
    /// Last level index scanned.
    pub last_level: Option<i64>,
}

/// Receiver of traced polylines.
///
/// Implemented for every `FnMut(i64, &[(f64, f64, f64)], bool)`.
pub trait ContourSink {
    /// Called once per polyline with its level index, points and closed flag.
    fn polyline(&mut self, level_index: i64, points: &[(f64, f64, f64)], closed: bool);
}

impl<F> ContourSink for F
where
    F: FnMut(i64, &[(f64, f64, f64)], bool),
{
    fn polyline(&mut self, level_index: i64, points: &[(f64, f64, f64)], closed: bool) {
        self(level_index, points, closed);
    }
}

// =============================================================================
// EXTRACTION
// =============================================================================

/// Eligible triangles plus the edge → triangle incidence shared by every level.
struct ContourGrid<'m> {
    mesh: &'m Mesh,
    elevations: FastHashMap<VertexKey, f64>,
    triangles: Vec<[EdgeKey; 3]>,
    incident: FastHashMap<EdgeKey, SmallBuffer<usize, 2>>,
}

impl<'m> ContourGrid<'m> {
    fn new(mesh: &'m Mesh, options: &ContourOptions) -> Self {
        let elevation = |key: VertexKey| {
            let vertex = mesh.vertex(key)?;
            let value = match options.source {
                ElevationSource::Z => Some(vertex.z()),
                ElevationSource::Attribute(i) => vertex.attribute(i),
            }?;
            value.is_finite().then_some(value)
        };

        let mut elevations = fast_hash_map_with_capacity(mesh.vertex_count());
        let mut triangles = Vec::new();
        let mut incident: FastHashMap<EdgeKey, SmallBuffer<usize, 2>> =
            fast_hash_map_with_capacity(3 * mesh.vertex_count());
        for (a, b, c) in mesh.iter_triangles(options.max_edge_length.unwrap_or(f64::INFINITY)) {
            let (Some(ea), Some(eb), Some(ec)) = (elevation(a), elevation(b), elevation(c)) else {
                continue;
            };
            elevations.insert(a, ea);
            elevations.insert(b, eb);
            elevations.insert(c, ec);
            let edges = [EdgeKey::new(a, b), EdgeKey::new(b, c), EdgeKey::new(c, a)];
            for edge in edges {
                incident.entry(edge).or_default().push(triangles.len());
            }
            triangles.push(edges);
        }

        Self {
            mesh,
            elevations,
            triangles,
            incident,
        }
    }

    fn range(&self) -> Option<(f64, f64)> {
        self.elevations.values().fold(None, |range, &e| match range {
            None => Some((e, e)),
            Some((lo, hi)) => Some((lo.min(e), hi.max(e))),
        })
    }

    fn is_crossing(&self, edge: EdgeKey, level: f64) -> bool {
        (self.elevations[&edge.v0()] >= level) != (self.elevations[&edge.v1()] >= level)
    }

    fn crossing_point(&self, edge: EdgeKey, level: f64) -> (f64, f64, f64) {
        let (e0, e1) = (self.elevations[&edge.v0()], self.elevations[&edge.v1()]);
        let store = self.mesh.link_store();
        let p = store
            .point(edge.v0())
            .lerp(store.point(edge.v1()), crossing_parameter(e0, e1, level));
        (p.x, p.y, level)
    }

    /// The other crossing edge of `triangle`.
    fn exit_edge(&self, triangle: usize, entry: EdgeKey, level: f64) -> Option<EdgeKey> {
        self.triangles[triangle]
            .iter()
            .copied()
            .find(|&e| e != entry && self.is_crossing(e, level))
    }

    fn neighbor_across(&self, edge: EdgeKey, triangle: usize) -> Option<usize> {
        self.incident
            .get(&edge)?
            .iter()
            .copied()
            .find(|&t| t != triangle)
    }

    /// Emits every polyline at `level`; returns `(polylines, closed, points)`.
    fn trace_level(
        &self,
        level_index: i64,
        level: f64,
        sink: &mut dyn ContourSink,
    ) -> (usize, usize, usize) {
        let mut crossing: Vec<EdgeKey> = Vec::new();
        let mut seen: FastHashSet<EdgeKey> = fast_hash_set_with_capacity(self.incident.len());
        for edges in &self.triangles {
            for &edge in edges {
                if self.is_crossing(edge, level) && seen.insert(edge) {
                    crossing.push(edge);
                }
            }
        }
        if crossing.is_empty() {
            return (0, 0, 0);
        }

        let mut visited: FastHashSet<EdgeKey> = fast_hash_set_with_capacity(crossing.len());
        let mut totals = (0, 0, 0);
        let mut emit = |points: Vec<(f64, f64, f64)>, closed: bool| {
            let points = squash(points, closed);
            if points.len() >= 2 {
                sink.polyline(level_index, &points, closed);
                totals.0 += 1;
                totals.1 += usize::from(closed);
                totals.2 += points.len();
            }
        };

        let border = |edge: &EdgeKey| self.incident.get(edge).is_some_and(|t| t.len() == 1);
        for &start in crossing.iter().filter(|e| border(e)) {
            if visited.contains(&start) {
                continue;
            }
            let (points, _) = self.walk(start, self.incident[&start][0], level, &mut visited);
            emit(points, false);
        }
        for &start in &crossing {
            if visited.contains(&start) {
                continue;
            }
            let (points, closed) = self.walk(start, self.incident[&start][0], level, &mut visited);
            emit(points, closed);
        }
        totals
    }

    /// Follows crossing edges from `start` into `triangle` until the chain leaves the
    /// region or returns to `start`.
    fn walk(
        &self,
        start: EdgeKey,
        mut triangle: usize,
        level: f64,
        visited: &mut FastHashSet<EdgeKey>,
    ) -> (Vec<(f64, f64, f64)>, bool) {
        visited.insert(start);
        let mut points = vec![self.crossing_point(start, level)];
        let mut entry = start;
        loop {
            let Some(exit) = self.exit_edge(triangle, entry, level) else {
                return (points, false);
            };
            if exit == start {
                return (points, true);
            }
            if !visited.insert(exit) {
                return (points, false);
            }
            points.push(self.crossing_point(exit, level));
            match self.neighbor_across(exit, triangle) {
                Some(next) => {
                    entry = exit;
                    triangle = next;
                }
                None => return (points, false),
            }
        }
    }
}

/// Drops consecutive repeated points (and a closing repeat of the first point).
fn squash(mut points: Vec<(f64, f64, f64)>, closed: bool) -> Vec<(f64, f64, f64)> {
    points.dedup();
    if closed && points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

impl Mesh {
    /// Traces contours and hands each polyline to `sink` as
    /// `(level_index, points, closed)`.
    ///
    /// # Errors
    ///
    /// [`ContourError::InvalidStep`] for a non-positive or non-finite step,
    /// [`ContourError::LevelOutOfRange`] when the level indices overflow or exceed
    /// `max_levels`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tinlink::prelude::*;
    ///
    /// let mesh = Mesh::new([
    ///     [0.0, 0.0, 0.0],
    ///     [10.0, 0.0, 10.0],
    ///     [10.0, 10.0, 10.0],
    ///     [0.0, 10.0, 0.0],
    /// ])
    /// .unwrap();
    ///
    /// let mut lines = Vec::new();
    /// mesh.contours(&ContourOptions::new(5.0), |k, pts: &[(f64, f64, f64)], closed| {
    ///     lines.push((k, pts.len(), closed));
    /// })
    /// .unwrap();
    /// assert!(lines.contains(&(1, 2, false)));
    /// ```
    pub fn contours<F>(
        &self,
        options: &ContourOptions,
        mut sink: F,
    ) -> Result<ContourSummary, ContourError>
    where
        F: FnMut(i64, &[(f64, f64, f64)], bool),
    {
        self.contours_with_cancel(options, &mut sink, &NeverCancel)
    }

    /// [`Mesh::contours`] into any [`ContourSink`].
    ///
    /// # Errors
    ///
    /// See [`Mesh::contours`].
    pub fn contours_into<S>(
        &self,
        options: &ContourOptions,
        sink: &mut S,
    ) -> Result<ContourSummary, ContourError>
    where
        S: ContourSink + ?Sized,
    {
        self.contours_with_cancel(options, sink, &NeverCancel)
    }

    /// [`Mesh::contours_into`] with a cancellation check polled once per level.
    ///
    /// # Errors
    ///
    /// See [`Mesh::contours`], plus [`ContourError::Cancelled`].
    pub fn contours_with_cancel<S, C>(
        &self,
        options: &ContourOptions,
        sink: &mut S,
        cancel: &C,
    ) -> Result<ContourSummary, ContourError>
    where
        S: ContourSink + ?Sized,
        C: CancellationCheck + ?Sized,
    {
        let step = options.step;
        if !(step.is_finite() && step > 0.0) {
            return Err(ContourError::InvalidStep { step });
        }

        let grid = ContourGrid::new(self, options);
        let Some((min, max)) = grid.range() else {
            return Ok(ContourSummary::default());
        };
        let out_of_range = || ContourError::LevelOutOfRange { min, max, step };
        let first = (min / step).floor().to_i64().ok_or_else(out_of_range)?;
        let last = (max / step).floor().to_i64().ok_or_else(out_of_range)?;
        let count = last
            .checked_sub(first)
            .and_then(|d| d.checked_add(1))
            .and_then(|n| n.to_u64())
            .filter(|&n| n <= options.max_levels)
            .ok_or_else(out_of_range)?;

        let mut adapter = SinkAdapter(sink);
        let mut summary = ContourSummary {
            first_level: Some(first),
            last_level: Some(last),
            ..ContourSummary::default()
        };
        for k in first..=last {
            if cancel.is_cancelled() {
                return Err(ContourError::Cancelled);
            }
            #[expect(clippy::cast_precision_loss, reason = "level indices stay far below 2^52")]
            let level = k as f64 * step;
            let (polylines, closed, points) = grid.trace_level(k, level, &mut adapter);
            summary.levels += 1;
            summary.polylines += polylines;
            summary.closed += closed;
            summary.points += points;
        }

        tracing::debug!(
            levels = count,
            polylines = summary.polylines,
            closed = summary.closed,
            points = summary.points,
            "contour extraction finished"
        );
        Ok(summary)
    }

    /// Collects every contour polyline.
    ///
    /// # Errors
    ///
    /// See [`Mesh::contours`].
    pub fn contour_lines(
        &self,
        options: &ContourOptions,
    ) -> Result<Vec<ContourLine>, ContourError> {
        let mut lines = Vec::new();
        let step = options.step;
        self.contours(options, |level_index, points: &[(f64, f64, f64)], closed| {
            #[expect(clippy::cast_precision_loss, reason = "level indices stay far below 2^52")]
            let elevation = level_index as f64 * step;
            lines.push(ContourLine {
                level_index,
                elevation,
                points: points.to_vec(),
                closed,
            });
        })?;
        Ok(lines)
    }
}

/// Lets an unsized sink be passed on as `&mut dyn ContourSink`.
struct SinkAdapter<'s, S: ?Sized>(&'s mut S);

impl<S: ContourSink + ?Sized> ContourSink for SinkAdapter<'_, S> {
    fn polyline(&mut self, level_index: i64, points: &[(f64, f64, f64)], closed: bool) {
        self.0.polyline(level_index, points, closed);
    }
}
