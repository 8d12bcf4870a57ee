//! Break-line (constraint edge) enforcement.
//!
//! [`Mesh::force_edge`] makes two existing vertices adjacent without breaking planarity.
//! The walk starts at the first endpoint and repeats one of three local steps until the
//! endpoints are linked:
//!
//! - **advance** to a neighbour lying on the constraint segment;
//! - **flip** the edge crossed by the segment when the quadrilateral around it is convex;
//! - **split** the crossed edge with a Steiner vertex at the intersection and continue
//!   from it.
//!
//! Every step completes before cancellation is polled, so an interrupted walk leaves a
//! valid mesh behind.

use thiserror::Error;

use crate::core::collections::SmallBuffer;
use crate::core::edge::EdgeKey;
use crate::core::link_store::VertexKey;
use crate::core::mesh::Mesh;
use crate::core::traits::cancellation::{CancellationCheck, NeverCancel};
use crate::core::vertex::{ATTRIBUTE_INLINE_CAPACITY, Vertex, VertexKind};
use crate::geometry::point::Point;
use crate::geometry::predicates::{
    cross, line_intersection_parameters, project_onto_line, segments_cross_properly,
};
use crate::geometry::util::{angle_of, cw_delta};

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Reasons a constraint edge could not be enforced.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConstraintError {
    /// The segment leaves the triangulated area at `at`.
    #[error("Constraint segment leaves the mesh at vertex {at:?}")]
    BoundaryHit {
        /// Vertex the walk was standing on.
        at: VertexKey,
    },
    /// No triangle was found across the crossed edge, or the walk stopped making
    /// progress.
    #[error("Constraint walk reached a dead end at vertex {at:?}")]
    DeadEnd {
        /// Vertex the walk was standing on.
        at: VertexKey,
    },
    /// Cancellation was requested.
    #[error("Constraint enforcement was cancelled")]
    Cancelled,
    /// An endpoint is not a vertex of the mesh.
    #[error("Vertex {vertex:?} is not in the mesh")]
    UnknownVertex {
        /// The unknown key.
        vertex: VertexKey,
    },
    /// Both endpoints are the same vertex.
    #[error("Constraint from vertex {vertex:?} to itself")]
    DegenerateConstraint {
        /// The repeated endpoint.
        vertex: VertexKey,
    },
    /// A break line references an input point that has no vertex.
    #[error("Input point {input_index} has no vertex in the mesh")]
    UnknownInput {
        /// The input index.
        input_index: usize,
    },
}

/// What [`Mesh::force_edge`] did to satisfy a constraint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConstraintReport {
    /// Vertices along the constraint from start to end; consecutive entries are linked.
    /// Intermediate entries are pre-existing collinear vertices or Steiner vertices.
    pub path: Vec<VertexKey>,
    /// Number of edge flips performed.
    pub flips: usize,
    /// Steiner vertices created, in creation order.
    pub steiner_vertices: Vec<VertexKey>,
}

impl ConstraintReport {
    /// Returns `true` when the constraint was already an edge.
    #[must_use]
    pub fn was_present(&self) -> bool {
        self.path.len() == 2 && self.flips == 0 && self.steiner_vertices.is_empty()
    }

    /// The constraint as the chain of edges it became.
    pub fn edges(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        self.path.windows(2).map(|w| EdgeKey::new(w[0], w[1]))
    }
}

// =============================================================================
// ENFORCEMENT
// =============================================================================

impl Mesh {
    /// Makes `a` and `b` adjacent, flipping crossed edges or splitting them with Steiner
    /// vertices as needed.
    ///
    /// # Errors
    ///
    /// See [`ConstraintError`]. A failed call may already have flipped or split edges;
    /// the mesh stays valid.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tinlink::prelude::*;
    ///
    /// let mut mesh = Mesh::new([[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]).unwrap();
    /// let b = mesh.vertex_for_input(1).unwrap();
    /// let d = mesh.vertex_for_input(3).unwrap();
    ///
    /// let report = mesh.force_edge(b, d).unwrap();
    /// assert_eq!(report.path, vec![b, d]);
    /// assert!(mesh.are_linked(b, d));
    /// ```
    pub fn force_edge(
        &mut self,
        a: VertexKey,
        b: VertexKey,
    ) -> Result<ConstraintReport, ConstraintError> {
        self.force_edge_with_cancel(a, b, &NeverCancel)
    }

    /// [`Mesh::force_edge`] with a cancellation check polled once per step.
    ///
    /// # Errors
    ///
    /// See [`ConstraintError`].
    pub fn force_edge_with_cancel<C>(
        &mut self,
        a: VertexKey,
        b: VertexKey,
        cancel: &C,
    ) -> Result<ConstraintReport, ConstraintError>
    where
        C: CancellationCheck + ?Sized,
    {
        for vertex in [a, b] {
            if !self.store.contains(vertex) {
                return Err(ConstraintError::UnknownVertex { vertex });
            }
        }
        if a == b {
            return Err(ConstraintError::DegenerateConstraint { vertex: a });
        }

        let target = *self.store.point(b);
        let mut report = ConstraintReport {
            path: vec![a],
            ..ConstraintReport::default()
        };
        let mut cor = a;
        let limit = 4 * self.store.edge_count() + 64;

        for _ in 0..limit {
            if cancel.is_cancelled() {
                return Err(ConstraintError::Cancelled);
            }
            if self.store.are_linked(cor, b) {
                report.path.push(b);
                tracing::debug!(
                    flips = report.flips,
                    steiner = report.steiner_vertices.len(),
                    path = report.path.len(),
                    "constraint enforced"
                );
                return Ok(report);
            }

            let origin = *self.store.point(cor);
            if let Some(next) = self.neighbor_on_segment(cor, &origin, &target) {
                report.path.push(next);
                cor = next;
                continue;
            }

            let (ci, cj) = self
                .crossed_edge(cor, angle_of(&origin, &target))
                .ok_or(ConstraintError::BoundaryHit { at: cor })?;
            let caa = self
                .opposite_vertex(cor, ci, cj)
                .ok_or(ConstraintError::DeadEnd { at: cor })?;

            let (pi, pj, pa) = (
                *self.store.point(ci),
                *self.store.point(cj),
                *self.store.point(caa),
            );
            if segments_cross_properly(&origin, &pa, &pi, &pj, self.options.tolerance) {
                self.store.unlink(ci, cj);
                self.store.link(cor, caa);
                report.flips += 1;
                tracing::trace!(?ci, ?cj, ?cor, ?caa, "flipped crossed edge");
                continue;
            }

            let (next, created) = self.split_crossed_edge(cor, ci, cj, caa, &target)?;
            if created {
                report.steiner_vertices.push(next);
            }
            report.path.push(next);
            cor = next;
        }

        tracing::warn!(?a, ?b, limit, "constraint walk hit its iteration cap");
        Err(ConstraintError::DeadEnd { at: cor })
    }

    /// Enforces several constraints in order, stopping at the first failure.
    ///
    /// Constraints enforced before the failure stay in place.
    ///
    /// # Errors
    ///
    /// The first [`ConstraintError`] encountered.
    pub fn force_edges<I>(&mut self, edges: I) -> Result<Vec<ConstraintReport>, ConstraintError>
    where
        I: IntoIterator<Item = (VertexKey, VertexKey)>,
    {
        edges
            .into_iter()
            .map(|(a, b)| self.force_edge(a, b))
            .collect()
    }

    /// Nearest neighbour of `cor` strictly inside the segment `origin → target`.
    fn neighbor_on_segment(
        &self,
        cor: VertexKey,
        origin: &Point,
        target: &Point,
    ) -> Option<VertexKey> {
        let tolerance = self.options.tolerance;
        let length = origin.distance_2d(target);
        self.store
            .neighbors(cor)
            .iter()
            .filter_map(|&n| {
                let (t, distance) = project_onto_line(origin, target, self.store.point(n))?;
                let inside = t * length > tolerance && (1.0 - t) * length > tolerance;
                (distance <= tolerance && inside).then_some((t, n))
            })
            .min_by(|x, y| x.0.total_cmp(&y.0))
            .map(|(_, n)| n)
    }

    /// The edge `ci–cj` of the triangle around `cor` whose wedge contains direction
    /// `theta`. `None` if the direction leaves the mesh.
    fn crossed_edge(&self, cor: VertexKey, theta: f64) -> Option<(VertexKey, VertexKey)> {
        let links = self.store.neighbors(cor);
        let n = links.len();
        if n < 2 {
            return None;
        }
        let origin = self.store.point(cor);
        (0..n).find_map(|i| {
            let (ci, cj) = (links[i], links[(i + 1) % n]);
            let from = angle_of(origin, self.store.point(ci));
            let to = angle_of(origin, self.store.point(cj));
            if cw_delta(from, theta) > cw_delta(from, to) {
                return None;
            }
            // First wedge containing the direction decides: it must be a triangle.
            let closed = ci != cj
                && self.store.are_linked(ci, cj)
                && cross(origin, self.store.point(ci), self.store.point(cj)) < 0.0;
            Some(closed.then_some((ci, cj)))
        })?
    }

    /// Apex of the triangle across `ci–cj` from `cor`.
    fn opposite_vertex(&self, cor: VertexKey, ci: VertexKey, cj: VertexKey) -> Option<VertexKey> {
        let (pi, pj) = (self.store.point(ci), self.store.point(cj));
        let near_side = cross(pi, pj, self.store.point(cor));
        let far_side =
            |w: VertexKey| w != cor && cross(pi, pj, self.store.point(w)) * near_side < 0.0;

        let rotation = self
            .store
            .next_counter_clockwise(ci, cj)
            .filter(|&w| far_side(w) && self.store.are_linked(w, cj));
        rotation.or_else(|| {
            self.store
                .neighbors(ci)
                .iter()
                .copied()
                .filter(|&w| far_side(w) && self.store.are_linked(w, cj))
                .min_by(|&x, &y| {
                    let dx = cross(pi, pj, self.store.point(x)).abs();
                    let dy = cross(pi, pj, self.store.point(y)).abs();
                    dx.total_cmp(&dy)
                })
        })
    }

    /// Splits `ci–cj` where the constraint segment crosses it. Returns the vertex the walk
    /// continues from and whether it was created.
    fn split_crossed_edge(
        &mut self,
        cor: VertexKey,
        ci: VertexKey,
        cj: VertexKey,
        caa: VertexKey,
        target: &Point,
    ) -> Result<(VertexKey, bool), ConstraintError> {
        let origin = *self.store.point(cor);
        let (pi, pj) = (*self.store.point(ci), *self.store.point(cj));
        let (_, u) = line_intersection_parameters(&origin, target, &pi, &pj)
            .ok_or(ConstraintError::DeadEnd { at: cor })?;

        // Crossing within tolerance of an endpoint: walk through that vertex instead.
        let length = pi.distance_2d(&pj);
        if u * length <= self.options.tolerance {
            return Ok((ci, false));
        }
        if (1.0 - u) * length <= self.options.tolerance {
            return Ok((cj, false));
        }

        let (vi, vj) = match (self.store.vertex(ci), self.store.vertex(cj)) {
            (Some(vi), Some(vj)) => (vi, vj),
            _ => return Err(ConstraintError::DeadEnd { at: cor }),
        };
        let point = pi.lerp(&pj, u);
        let attributes: SmallBuffer<f64, ATTRIBUTE_INLINE_CAPACITY> = vi
            .attributes()
            .iter()
            .zip(vj.attributes())
            .map(|(&x, &y)| (y - x).mul_add(u, x))
            .collect();

        let steiner = self.store.insert_vertex(Vertex::new(
            point,
            attributes,
            None,
            VertexKind::Steiner,
        ));
        self.grid.insert(steiner, point.x, point.y);

        self.store.unlink(ci, cj);
        self.store.link(ci, steiner);
        self.store.link(steiner, cj);
        self.store.link(cor, steiner);
        self.store.link(caa, steiner);
        tracing::trace!(?steiner, %point, "inserted Steiner vertex");
        Ok((steiner, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builder::MeshBuilder;
    use crate::core::traits::cancellation::{CancelAfter, CancelToken};

    fn square() -> (Mesh, [VertexKey; 4]) {
        let mesh = Mesh::new([[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]).unwrap();
        let keys = [0, 1, 2, 3].map(|i| mesh.vertex_for_input(i).unwrap());
        (mesh, keys)
    }

    #[test]
    fn existing_edge_needs_no_work() {
        let (mut mesh, [a, b, ..]) = square();
        let before = mesh.link_store().clone();
        let report = mesh.force_edge(a, b).unwrap();
        assert!(report.was_present());
        for key in before.keys() {
            assert_eq!(before.neighbors(key), mesh.neighbors(key));
        }
    }

    #[test]
    fn crossing_diagonal_is_flipped() {
        let (mut mesh, [a, b, c, d]) = square();
        assert!(mesh.are_linked(a, c));
        let report = mesh.force_edge(b, d).unwrap();
        assert_eq!(report.flips, 1);
        assert_eq!(report.path, vec![b, d]);
        assert!(!mesh.are_linked(a, c));
        assert!(mesh.validate().is_ok());
        assert_eq!(mesh.iter_triangles(f64::INFINITY).count(), 2);
    }

    #[test]
    fn collinear_vertices_become_part_of_the_path() {
        let mesh = MeshBuilder::new([
            [0.0, 0.0],
            [10.0, 0.0],
            [10.0, 10.0],
            [0.0, 10.0],
            [5.0, 5.0],
        ])
        .convex_boundary(true)
        .build();
        let mut mesh = mesh.unwrap();
        let a = mesh.vertex_for_input(0).unwrap();
        let centre = mesh.vertex_for_input(4).unwrap();
        let c = mesh.vertex_for_input(2).unwrap();
        let report = mesh.force_edge(a, c).unwrap();
        assert_eq!(report.path, vec![a, centre, c]);
        assert!(report.steiner_vertices.is_empty());
    }

    #[test]
    fn invalid_endpoints_are_rejected() {
        let (mut mesh, [a, ..]) = square();
        assert_eq!(
            mesh.force_edge(a, a),
            Err(ConstraintError::DegenerateConstraint { vertex: a })
        );
        assert_eq!(
            mesh.force_edge(a, VertexKey::default()),
            Err(ConstraintError::UnknownVertex {
                vertex: VertexKey::default()
            })
        );
    }

    #[test]
    fn cancelled_walk_reports_cancellation() {
        let (mut mesh, [_, b, _, d]) = square();
        let token = CancelToken::new();
        token.cancel();
        assert_eq!(
            mesh.force_edge_with_cancel(b, d, &token),
            Err(ConstraintError::Cancelled)
        );
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn cancelling_mid_walk_leaves_a_valid_mesh() {
        let points: Vec<[f64; 3]> = (0..100)
            .map(|i| {
                let (col, row) = (f64::from(i % 10), f64::from(i / 10));
                [0.37f64.mul_add(row, col), row, col + row]
            })
            .collect();
        let mesh = MeshBuilder::new(points).convex_boundary(true).build().unwrap();
        let (a, b) = (mesh.vertex_for_input(0).unwrap(), mesh.vertex_for_input(97).unwrap());

        let mut full = mesh.clone();
        let report = full.force_edge(a, b).unwrap();
        assert!(report.flips + report.steiner_vertices.len() >= 3);
        // One poll per flip, per intermediate path vertex and before the final check.
        let polls = report.flips + report.path.len() - 1;

        for allowed in 0..polls {
            let mut partial = mesh.clone();
            assert_eq!(
                partial.force_edge_with_cancel(a, b, &CancelAfter::new(allowed)),
                Err(ConstraintError::Cancelled),
                "walk allowed {allowed} polls"
            );
            assert!(partial.validate().is_ok(), "walk allowed {allowed} polls");
        }
        let mut last = mesh.clone();
        assert_eq!(
            last.force_edge_with_cancel(a, b, &CancelAfter::new(polls)),
            Ok(report)
        );
    }

    #[test]
    fn segment_through_a_notch_hits_the_boundary() {
        // The reflex vertex at (5, 3) leaves the mesh non-convex between (10, 0) and (5, 9).
        let mut mesh = Mesh::new([[0.0, 0.0], [10.0, 0.0], [5.0, 9.0], [5.0, 3.0]]).unwrap();
        let (b, c) = (mesh.vertex_for_input(1).unwrap(), mesh.vertex_for_input(2).unwrap());
        assert!(!mesh.are_linked(b, c));
        let edges_before = mesh.iter_edges().count();

        assert!(matches!(
            mesh.force_edge(b, c),
            Err(ConstraintError::BoundaryHit { .. })
        ));
        assert!(mesh.validate().is_ok());
        assert!(!mesh.are_linked(b, c));
        assert_eq!(mesh.iter_edges().count(), edges_before);
    }

    #[test]
    fn crossed_edge_without_far_triangle_is_a_dead_end() {
        // Triangle A-B-C with T on the far side of B-C and nothing linked to it.
        let mut mesh = Mesh::load_from_str(concat!(
            "4 0\n",
            "A 0 0 0\n3\n2\n0\n",
            "B 5 -5 0\n1\n3\n0\n",
            "C 5 5 0\n2\n1\n0\n",
            "T 10 0 0\n0\n",
        ))
        .unwrap();
        let a = mesh.vertex_by_label("A").unwrap();
        let t = mesh.vertex_by_label("T").unwrap();

        assert_eq!(mesh.force_edge(a, t), Err(ConstraintError::DeadEnd { at: a }));
        assert!(mesh.validate().is_ok());
        assert_eq!(mesh.iter_edges().count(), 3);
    }

    #[test]
    fn report_edges_follow_the_path() {
        let (mut mesh, [_, b, _, d]) = square();
        let report = mesh.force_edge(b, d).unwrap();
        let edges: Vec<_> = report.edges().collect();
        assert_eq!(edges, vec![EdgeKey::new(b, d)]);
    }
}
