//! The triangulated mesh handle.
//!
//! A [`Mesh`] owns a [`LinkStore`] plus the lookup structures built alongside it: the
//! input-index map, a spatial hash grid for coordinate lookups, the options it was built
//! with and the construction statistics.
//!
//! Read-side operations (iteration, contouring, lookups) take `&self`; constraint
//! enforcement, convexification and sentinel removal take `&mut self`.
//!
//! # Examples
//!
//! ```rust
//! use tinlink::prelude::*;
//!
//! let mesh = Mesh::new([[0.0, 0.0], [10.0, 0.0], [0.0, 10.0]]).unwrap();
//! assert_eq!(mesh.vertex_count(), 3);
//! assert_eq!(mesh.iter_edges().count(), 3);
//! assert_eq!(mesh.iter_triangles(f64::INFINITY).count(), 1);
//! ```

use thiserror::Error;

use crate::core::algorithms::break_lines::ConstraintError;
use crate::core::algorithms::incremental_insertion::{
    ConstructionStatistics, boundary_cycle, convexify,
};
use crate::core::builder::{ConstructionOptions, MeshBuilder};
use crate::core::collections::{FastHashSet, HashGridIndex, fast_hash_set_with_capacity};
use crate::core::link_store::{LinkStore, LinkStoreValidationError, VertexKey};
use crate::core::traits::cancellation::CancellationCheck;
use crate::core::vertex::{InputPoint, Vertex, VertexKind};
use crate::geometry::point::{BoundingBox, Point};
use crate::geometry::predicates::{TriangleLocation, locate_in_triangle};
use crate::geometry::util::barycentric;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur while building a mesh.
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum MeshConstructionError {
    /// Fewer than three distinct points remained after deduplication.
    #[error(
        "Insufficient points: {found} distinct point(s) after deduplication, at least 3 required"
    )]
    InsufficientPoints {
        /// Number of distinct points found.
        found: usize,
    },
    /// The input has no area (all points collinear within tolerance).
    #[error("Degenerate geometry: {message}")]
    DegenerateGeometry {
        /// Description of the degeneracy.
        message: String,
    },
    /// An input point has a NaN or infinite coordinate.
    #[error("Invalid coordinate at input index {index}: coordinates must be finite")]
    InvalidCoordinate {
        /// Input index of the offending point.
        index: usize,
    },
    /// Cancellation was requested during construction.
    #[error("Mesh construction was cancelled")]
    Cancelled,
    /// A break line supplied to the builder could not be enforced.
    #[error("Break line {index} could not be enforced: {source}")]
    Constraint {
        /// Position of the break line in the builder's list.
        index: usize,
        /// The underlying enforcement failure.
        #[source]
        source: ConstraintError,
    },
}

/// Violations reported by [`Mesh::validate`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum MeshValidationError {
    /// A link-store invariant is broken.
    #[error("Link store invariant violated: {0}")]
    Links(#[from] LinkStoreValidationError),
    /// A sentinel carries a label, so it could leak into labelled output.
    #[error("Sentinel vertex {vertex:?} carries a label")]
    LabelledSentinel {
        /// The sentinel vertex.
        vertex: VertexKey,
    },
    /// Two vertices share the same label.
    #[error("Label {label:?} is used by more than one vertex")]
    DuplicateLabel {
        /// The repeated label.
        label: String,
    },
    /// The input-index map points at a vertex that is not in the store.
    #[error("Input index {index} maps to a missing vertex")]
    DanglingInputMapping {
        /// The input index.
        index: usize,
    },
}

// =============================================================================
// MESH
// =============================================================================

/// A triangular mesh over a planar point set, stored as clockwise link lists.
///
/// Triangles and edges are derived on demand; see [`Mesh::iter_triangles`] and
/// [`Mesh::iter_edges`]. Sentinel vertices (when requested at construction) stay in the
/// store so they can be persisted, but never appear in any output.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub(crate) store: LinkStore,
    pub(crate) grid: HashGridIndex<VertexKey>,
    pub(crate) input_map: Vec<Option<VertexKey>>,
    pub(crate) options: ConstructionOptions,
    pub(crate) statistics: ConstructionStatistics,
}

impl Mesh {
    /// Builds a mesh with default [`ConstructionOptions`].
    ///
    /// Shorthand for `MeshBuilder::new(points).build()`.
    ///
    /// # Errors
    ///
    /// See [`MeshBuilder::build`].
    pub fn new<I, P>(points: I) -> Result<Self, MeshConstructionError>
    where
        I: IntoIterator<Item = P>,
        P: Into<InputPoint>,
    {
        MeshBuilder::new(points).build()
    }

    /// Builds a mesh with default options and a cancellation check.
    ///
    /// # Errors
    ///
    /// See [`MeshBuilder::build`]; additionally `Cancelled` if `cancel` fires.
    pub fn new_with_cancel<I, P, C>(points: I, cancel: &C) -> Result<Self, MeshConstructionError>
    where
        I: IntoIterator<Item = P>,
        P: Into<InputPoint>,
        C: CancellationCheck + ?Sized,
    {
        MeshBuilder::new(points).build_with_cancel(cancel)
    }

    /// Wraps an already-linked store. The input map is the identity over non-sentinel
    /// vertices in store order.
    pub(crate) fn from_store(
        store: LinkStore,
        options: ConstructionOptions,
        statistics: ConstructionStatistics,
    ) -> Self {
        let input_map = store
            .iter()
            .filter(|(_, v)| !v.is_sentinel())
            .map(|(k, _)| Some(k))
            .collect();
        let mut mesh = Self {
            store,
            grid: HashGridIndex::new(options.tolerance),
            input_map,
            options,
            statistics,
        };
        mesh.rebuild_grid();
        mesh
    }

    pub(crate) fn rebuild_grid(&mut self) {
        self.grid = HashGridIndex::new(self.options.tolerance);
        for (key, vertex) in self.store.iter() {
            self.grid.insert(key, vertex.x(), vertex.y());
        }
    }

    // -------------------------------------------------------------------------
    // Counts and lookups
    // -------------------------------------------------------------------------

    /// Number of real (non-sentinel) vertices, Steiner vertices included.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.store.len() - self.sentinel_count()
    }

    /// Number of sentinel vertices still in the store (0 or 4).
    #[must_use]
    pub fn sentinel_count(&self) -> usize {
        self.store.iter().filter(|(_, v)| v.is_sentinel()).count()
    }

    /// Looks up a vertex by key. Sentinels are returned too.
    #[inline]
    #[must_use]
    pub fn vertex(&self, key: VertexKey) -> Option<&Vertex> {
        self.store.vertex(key)
    }

    /// Key of the vertex that input point `index` became.
    ///
    /// Duplicates resolve to the vertex of their first occurrence. Returns `None` for
    /// out-of-range indices and for points that were skipped during construction.
    #[must_use]
    pub fn vertex_for_input(&self, index: usize) -> Option<VertexKey> {
        self.input_map.get(index).copied().flatten()
    }

    /// Real vertex within tolerance of `(x, y)`, nearest first.
    #[must_use]
    pub fn vertex_at(&self, x: f64, y: f64) -> Option<VertexKey> {
        let query = Point::new_2d(x, y);
        let tolerance = self.options.tolerance;
        let mut best: Option<(f64, VertexKey)> = None;
        let mut consider = |key: VertexKey| {
            if let Some(v) = self.store.vertex(key).filter(|v| !v.is_sentinel()) {
                let d = v.point().distance_2d(&query);
                if d <= tolerance && best.is_none_or(|(bd, _)| d < bd) {
                    best = Some((d, key));
                }
            }
        };
        let used_grid = self.grid.for_each_candidate(x, y, |key| {
            consider(key);
            true
        });
        if !used_grid {
            self.store.keys().for_each(&mut consider);
        }
        best.map(|(_, k)| k)
    }

    /// First vertex (in insertion order) carrying `label`.
    #[must_use]
    pub fn vertex_by_label(&self, label: &str) -> Option<VertexKey> {
        self.store
            .iter()
            .find(|(_, v)| v.label() == Some(label))
            .map(|(k, _)| k)
    }

    /// Real vertices in insertion order.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexKey, &Vertex)> + '_ {
        self.store.iter().filter(|(_, v)| !v.is_sentinel())
    }

    /// Keys of every Steiner vertex created by constraint enforcement.
    #[must_use]
    pub fn steiner_vertices(&self) -> Vec<VertexKey> {
        self.store
            .iter()
            .filter(|(_, v)| v.kind() == VertexKind::Steiner)
            .map(|(k, _)| k)
            .collect()
    }

    /// Clockwise neighbours of `key`, sentinels included.
    #[inline]
    #[must_use]
    pub fn neighbors(&self, key: VertexKey) -> &[VertexKey] {
        self.store.neighbors(key)
    }

    /// Returns `true` when `a` and `b` are linked.
    #[inline]
    #[must_use]
    pub fn are_linked(&self, a: VertexKey, b: VertexKey) -> bool {
        self.store.are_linked(a, b)
    }

    /// The underlying link store.
    #[inline]
    #[must_use]
    pub const fn link_store(&self) -> &LinkStore {
        &self.store
    }

    /// Options the mesh was built with.
    #[inline]
    #[must_use]
    pub const fn options(&self) -> &ConstructionOptions {
        &self.options
    }

    /// Counters collected while building the mesh.
    #[inline]
    #[must_use]
    pub const fn statistics(&self) -> &ConstructionStatistics {
        &self.statistics
    }

    /// Bounding box of the real vertices.
    #[must_use]
    pub fn extent(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.vertices().map(|(_, v)| v.point()))
    }

    // -------------------------------------------------------------------------
    // Derived geometry
    // -------------------------------------------------------------------------

    /// Counter-clockwise outer boundary of the real vertices, starting at the leftmost
    /// (then lowest) vertex.
    ///
    /// Links to sentinels are ignored, so with sentinels present this is the boundary of
    /// the real triangles rather than the sentinel frame.
    #[must_use]
    pub fn boundary(&self) -> Vec<VertexKey> {
        boundary_cycle(&self.store, |k| {
            self.store.vertex(k).is_some_and(|v| !v.is_sentinel())
        })
    }

    /// Elevation at `(x, y)` by linear interpolation over the containing triangle.
    ///
    /// Returns `None` outside the triangulated area.
    #[must_use]
    pub fn elevation_at(&self, x: f64, y: f64) -> Option<f64> {
        let p = Point::new_2d(x, y);
        let tolerance = self.options.tolerance;
        self.iter_triangles(f64::INFINITY).find_map(|(a, b, c)| {
            let pa = self.store.point(a);
            let pb = self.store.point(b);
            let pc = self.store.point(c);
            if locate_in_triangle(pa, pb, pc, &p, tolerance) == TriangleLocation::Outside {
                return None;
            }
            let [wa, wb, wc] = barycentric(pa, pb, pc, &p)?;
            Some(wc.mul_add(pc.z, wa.mul_add(pa.z, wb * pb.z)))
        })
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Removes the sentinel vertices and all their links. Returns how many were removed.
    ///
    /// The real boundary left behind is whatever the sentinel-free part of the mesh
    /// covers; call [`Mesh::convexify_boundary`] afterwards for a convex outline.
    pub fn discard_sentinels(&mut self) -> usize {
        let sentinels: Vec<VertexKey> = self
            .store
            .iter()
            .filter(|(_, v)| v.is_sentinel())
            .map(|(k, _)| k)
            .collect();
        for &key in &sentinels {
            if let Some(v) = self.store.remove_vertex(key) {
                self.grid.remove(key, v.x(), v.y());
            }
        }
        if !sentinels.is_empty() {
            tracing::debug!(removed = sentinels.len(), "discarded sentinel vertices");
        }
        sentinels.len()
    }

    /// Links boundary vertices across concave pockets until the outer boundary is convex.
    /// Returns the number of triangles added.
    ///
    /// Construction already does this when [`ConstructionOptions::convex_boundary`] is set.
    /// With sentinels still present the outer boundary is the sentinel frame, so this only
    /// has an effect after [`Mesh::discard_sentinels`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tinlink::prelude::*;
    ///
    /// // A wide, shallow chevron leaves a pocket between its arms.
    /// let mut mesh = Mesh::new([[0.0, 0.0], [10.0, 0.0], [5.0, 9.0], [5.0, 3.0]]).unwrap();
    /// let before = mesh.iter_triangles(f64::INFINITY).count();
    /// let added = mesh.convexify_boundary();
    /// assert_eq!(mesh.iter_triangles(f64::INFINITY).count(), before + added);
    /// assert_eq!(mesh.convexify_boundary(), 0);
    /// ```
    pub fn convexify_boundary(&mut self) -> usize {
        let added = convexify(&mut self.store, self.options.tolerance);
        if added > 0 {
            self.statistics.convexified += added;
            tracing::debug!(added, "convexified mesh boundary");
        }
        added
    }

    /// Checks the link-store invariants plus mesh-level bookkeeping.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), MeshValidationError> {
        self.store.validate()?;

        let mut labels: FastHashSet<&str> = fast_hash_set_with_capacity(self.store.len());
        for (key, vertex) in self.store.iter() {
            if vertex.is_sentinel() && vertex.label().is_some() {
                return Err(MeshValidationError::LabelledSentinel { vertex: key });
            }
            if let Some(label) = vertex.label()
                && !labels.insert(label)
            {
                return Err(MeshValidationError::DuplicateLabel {
                    label: label.to_string(),
                });
            }
        }

        for (index, key) in self.input_map.iter().enumerate() {
            if let Some(key) = key
                && !self.store.contains(*key)
            {
                return Err(MeshValidationError::DanglingInputMapping { index });
            }
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn is_real(&self, key: VertexKey) -> bool {
        self.store.vertex(key).is_some_and(|v| !v.is_sentinel())
    }
}
