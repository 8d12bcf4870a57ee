//! Fluent builder for [`Mesh`] plus the options that drive construction.
//!
//! [`MeshBuilder`] gathers the input points, break lines and [`ConstructionOptions`], then
//! runs the whole pipeline in [`MeshBuilder::build`]:
//!
//! 1. reject non-finite coordinates;
//! 2. merge points closer than the tolerance (first occurrence wins);
//! 3. reject input without a convex hull (all points collinear);
//! 4. optionally add a sentinel quad around the bounding box;
//! 5. run the incremental construction and the optional convexification;
//! 6. enforce the break lines in order.
//!
//! # Examples
//!
//! ```rust
//! use tinlink::prelude::*;
//!
//! let mesh = MeshBuilder::new([[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]])
//!     .convex_boundary(true)
//!     .break_line(1, 3)
//!     .build()
//!     .unwrap();
//!
//! let a = mesh.vertex_for_input(1).unwrap();
//! let b = mesh.vertex_for_input(3).unwrap();
//! assert!(mesh.are_linked(a, b));
//! assert_eq!(mesh.iter_triangles(f64::INFINITY).count(), 2);
//! ```

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::core::algorithms::break_lines::ConstraintError;
use crate::core::algorithms::incremental_insertion::{ConstructionStatistics, triangulate};
use crate::core::collections::HashGridIndex;
use crate::core::link_store::{LinkStore, VertexKey};
use crate::core::mesh::{Mesh, MeshConstructionError};
use crate::core::traits::cancellation::{CancellationCheck, NeverCancel};
use crate::core::util::dedup_points_within;
use crate::core::vertex::{InputPoint, Vertex, VertexKind};
use crate::geometry::algorithms::convex_hull::convex_hull_2d;
use crate::geometry::point::{BoundingBox, Point};

// =============================================================================
// OPTIONS
// =============================================================================

/// Tunable parameters for mesh construction.
///
/// # Examples
///
/// ```rust
/// use tinlink::core::builder::ConstructionOptions;
///
/// let options = ConstructionOptions::default()
///     .with_tolerance(1e-9)
///     .with_convex_boundary(true);
/// assert!(options.convex_boundary);
/// assert!(!options.add_sentinels);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstructionOptions {
    /// Distance below which points are merged and below which geometric tests treat a
    /// point as lying on a line.
    pub tolerance: f64,
    /// Fill every reflex boundary vertex after construction.
    pub convex_boundary: bool,
    /// Surround the input with four sentinel vertices.
    pub add_sentinels: bool,
    /// Pockets opening at less than this angle (degrees) are filled during construction.
    pub flatness_threshold_degrees: f64,
    /// Sentinel margin as a fraction of the larger bounding-box side.
    pub sentinel_margin_ratio: f64,
    /// Minimum sentinel margin.
    pub sentinel_margin_floor: f64,
}

impl Default for ConstructionOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            convex_boundary: false,
            add_sentinels: false,
            flatness_threshold_degrees: 112.0,
            sentinel_margin_ratio: 0.1,
            sentinel_margin_floor: 1.0,
        }
    }
}

impl ConstructionOptions {
    /// Sets the geometric tolerance.
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Requests a convex outer boundary.
    #[must_use]
    pub const fn with_convex_boundary(mut self, convex_boundary: bool) -> Self {
        self.convex_boundary = convex_boundary;
        self
    }

    /// Requests sentinel vertices around the input.
    #[must_use]
    pub const fn with_sentinels(mut self, add_sentinels: bool) -> Self {
        self.add_sentinels = add_sentinels;
        self
    }

    /// Sets the flattening threshold in degrees.
    #[must_use]
    pub const fn with_flatness_threshold_degrees(mut self, degrees: f64) -> Self {
        self.flatness_threshold_degrees = degrees;
        self
    }

    /// Sets the sentinel margin ratio and floor.
    #[must_use]
    pub const fn with_sentinel_margins(mut self, ratio: f64, floor: f64) -> Self {
        self.sentinel_margin_ratio = ratio;
        self.sentinel_margin_floor = floor;
        self
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Collects input for a [`Mesh`] and builds it.
#[derive(Clone, Debug, Default)]
pub struct MeshBuilder {
    points: Vec<InputPoint>,
    options: ConstructionOptions,
    /// Pairs of input indices.
    break_lines: Vec<(usize, usize)>,
}

impl MeshBuilder {
    /// Creates a builder over `points` with default options.
    #[must_use]
    pub fn new<I, P>(points: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<InputPoint>,
    {
        Self {
            points: points.into_iter().map(Into::into).collect(),
            options: ConstructionOptions::default(),
            break_lines: Vec::new(),
        }
    }

    /// Fill reflex boundary vertices after construction.
    #[must_use]
    pub fn convex_boundary(mut self, convex_boundary: bool) -> Self {
        self.options.convex_boundary = convex_boundary;
        self
    }

    /// Add the sentinel quad (implies convexification).
    #[must_use]
    pub fn add_sentinels(mut self, add_sentinels: bool) -> Self {
        self.options.add_sentinels = add_sentinels;
        self
    }

    /// Sets the geometric tolerance.
    #[must_use]
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.options.tolerance = tolerance;
        self
    }

    /// Sets the flattening threshold in degrees.
    #[must_use]
    pub fn flatness_threshold(mut self, degrees: f64) -> Self {
        self.options.flatness_threshold_degrees = degrees;
        self
    }

    /// Sets the sentinel margin ratio and floor.
    #[must_use]
    pub fn sentinel_margins(mut self, ratio: f64, floor: f64) -> Self {
        self.options.sentinel_margin_ratio = ratio;
        self.options.sentinel_margin_floor = floor;
        self
    }

    /// Replaces all options at once.
    #[must_use]
    pub fn options(mut self, options: ConstructionOptions) -> Self {
        self.options = options;
        self
    }

    /// Adds a break line between input points `a` and `b`.
    #[must_use]
    pub fn break_line(mut self, a: usize, b: usize) -> Self {
        self.break_lines.push((a, b));
        self
    }

    /// Adds several break lines.
    #[must_use]
    pub fn break_lines<I>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        self.break_lines.extend(lines);
        self
    }

    /// Builds the mesh.
    ///
    /// # Errors
    ///
    /// - [`MeshConstructionError::InvalidCoordinate`] for a NaN or infinite coordinate.
    /// - [`MeshConstructionError::InsufficientPoints`] if fewer than three distinct points
    ///   remain after deduplication.
    /// - [`MeshConstructionError::DegenerateGeometry`] if the points are collinear.
    /// - [`MeshConstructionError::Constraint`] if a break line cannot be enforced.
    pub fn build(self) -> Result<Mesh, MeshConstructionError> {
        self.build_with_cancel(&NeverCancel)
    }

    /// Builds the mesh, polling `cancel` once per inserted point and once per constraint
    /// step.
    ///
    /// # Errors
    ///
    /// As [`MeshBuilder::build`], plus [`MeshConstructionError::Cancelled`].
    pub fn build_with_cancel<C>(self, cancel: &C) -> Result<Mesh, MeshConstructionError>
    where
        C: CancellationCheck + ?Sized,
    {
        let Self {
            mut points,
            options,
            break_lines,
        } = self;

        if let Some(index) = points.iter().position(|p| !p.point.is_finite()) {
            return Err(MeshConstructionError::InvalidCoordinate { index });
        }

        let coordinates: Vec<Point> = points.iter().map(|p| p.point).collect();
        let dedup = dedup_points_within(&coordinates, options.tolerance);
        if dedup.kept.len() < 3 {
            return Err(MeshConstructionError::InsufficientPoints {
                found: dedup.kept.len(),
            });
        }

        let distinct: Vec<Point> = dedup.kept.iter().map(|&i| coordinates[i]).collect();
        let bbox = BoundingBox::from_points(&distinct).ok_or(
            MeshConstructionError::InsufficientPoints { found: 0 },
        )?;
        let hull = convex_hull_2d(&distinct)
            .filter(|hull| hull.area() > options.tolerance * bbox.planar_extent())
            .ok_or_else(|| MeshConstructionError::DegenerateGeometry {
                message: format!("{} distinct points have no convex hull", distinct.len()),
            })?;

        let mut statistics = ConstructionStatistics {
            input_points: points.len(),
            merged_duplicates: dedup.merged(),
            ..ConstructionStatistics::default()
        };

        let mut store = LinkStore::with_capacity(distinct.len() + 4);
        let keys: Vec<VertexKey> = dedup
            .kept
            .iter()
            .map(|&i| {
                let InputPoint {
                    point,
                    label,
                    attributes,
                } = std::mem::take(&mut points[i]);
                store.insert_vertex(Vertex::new(point, attributes, label, VertexKind::Input))
            })
            .collect();

        let sentinels: Vec<VertexKey> = if options.add_sentinels {
            sentinel_corners(&bbox, &options)
                .into_iter()
                .map(|p| {
                    store.insert_vertex(Vertex::new(
                        p,
                        std::iter::empty(),
                        None,
                        VertexKind::Sentinel,
                    ))
                })
                .collect()
        } else {
            Vec::new()
        };
        statistics.sentinels = sentinels.len();

        tracing::debug!(
            input = points.len(),
            distinct = keys.len(),
            hull_corners = hull.len(),
            sentinels = sentinels.len(),
            "building mesh"
        );

        let skipped = triangulate(
            &mut store,
            &keys,
            &sentinels,
            &options,
            &mut statistics,
            cancel,
        )?;

        let input_map = dedup
            .representative
            .iter()
            .map(|&slot| Some(keys[slot]).filter(|k| !skipped.contains(k)))
            .collect();

        let mut mesh = Mesh {
            store,
            grid: HashGridIndex::new(options.tolerance),
            input_map,
            options,
            statistics,
        };
        mesh.rebuild_grid();

        for (index, &(a, b)) in break_lines.iter().enumerate() {
            let resolve = |input_index: usize| {
                mesh.vertex_for_input(input_index)
                    .ok_or(ConstraintError::UnknownInput { input_index })
            };
            let endpoints = resolve(a).and_then(|ka| resolve(b).map(|kb| (ka, kb)));
            let result = endpoints.and_then(|(ka, kb)| mesh.force_edge_with_cancel(ka, kb, cancel));
            match result {
                Ok(_) => {}
                Err(ConstraintError::Cancelled) => return Err(MeshConstructionError::Cancelled),
                Err(source) => return Err(MeshConstructionError::Constraint { index, source }),
            }
        }

        Ok(mesh)
    }
}

/// Corners of the bounding box pushed out by the margin; the upper-right corner is nudged
/// along x so the quad is not a perfect rectangle.
fn sentinel_corners(bbox: &BoundingBox, options: &ConstructionOptions) -> [Point; 4] {
    let margin = (options.sentinel_margin_ratio * bbox.planar_extent())
        .max(options.sentinel_margin_floor);
    let z = bbox.min.z;
    let (x0, y0) = (bbox.min.x - margin, bbox.min.y - margin);
    let (x1, y1) = (bbox.max.x + margin, bbox.max.y + margin);
    [
        Point::new(x0, y0, z),
        Point::new(x1, y0, z),
        Point::new(1e-3f64.mul_add(margin, x1), y1, z),
        Point::new(x0, y1, z),
    ]
}
