//! Lazy edge and triangle iteration over a [`Mesh`].
//!
//! Neither edges nor triangles are stored. Edges are the symmetric links between real
//! vertices, reported once from their canonical endpoint. Triangles are closed wedges of a
//! vertex's clockwise link list: consecutive neighbours `b`, `c` of `a` that are linked to
//! each other and turn clockwise. Each unordered triple is reported once, from its
//! smallest key.

use std::iter::FusedIterator;

use slotmap::Key;

use crate::core::edge::EdgeKey;
use crate::core::link_store::{LinkStore, VertexKey};
use crate::core::mesh::Mesh;
use crate::geometry::predicates::cross;

/// Closed clockwise wedges `(b, c)` around `a`, sentinels included.
pub(crate) fn clockwise_wedges(
    store: &LinkStore,
    a: VertexKey,
) -> impl Iterator<Item = (VertexKey, VertexKey)> + '_ {
    let links = store.neighbors(a);
    let n = if links.len() >= 2 { links.len() } else { 0 };
    (0..n)
        .map(move |i| (links[i], links[(i + 1) % n]))
        .filter(move |&(b, c)| closes_triangle(store, a, b, c))
}

#[inline]
fn closes_triangle(store: &LinkStore, a: VertexKey, b: VertexKey, c: VertexKey) -> bool {
    b != c
        && store.are_linked(b, c)
        && cross(store.point(a), store.point(b), store.point(c)) < 0.0
}

#[inline]
fn raw(key: VertexKey) -> u64 {
    key.data().as_ffi()
}

// =============================================================================
// EDGES
// =============================================================================

/// Iterator over the edges between real vertices. Created by [`Mesh::iter_edges`].
#[derive(Clone, Debug)]
pub struct Edges<'a> {
    mesh: &'a Mesh,
    order: &'a [VertexKey],
    vertex: usize,
    link: usize,
}

impl Iterator for Edges<'_> {
    type Item = EdgeKey;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&a) = self.order.get(self.vertex) {
            if self.mesh.is_real(a) {
                let links = self.mesh.store.neighbors(a);
                while let Some(&b) = links.get(self.link) {
                    self.link += 1;
                    if raw(a) < raw(b) && self.mesh.is_real(b) {
                        return Some(EdgeKey::new(a, b));
                    }
                }
            }
            self.vertex += 1;
            self.link = 0;
        }
        None
    }
}

impl FusedIterator for Edges<'_> {}

// =============================================================================
// TRIANGLES
// =============================================================================

/// Iterator over the triangles of a mesh as clockwise `(a, b, c)` triples.
/// Created by [`Mesh::iter_triangles`].
#[derive(Clone, Debug)]
pub struct Triangles<'a> {
    mesh: &'a Mesh,
    order: &'a [VertexKey],
    vertex: usize,
    link: usize,
    max_edge_length: f64,
}

impl Triangles<'_> {
    fn accepts(&self, a: VertexKey, b: VertexKey, c: VertexKey) -> bool {
        if raw(a) >= raw(b) || raw(a) >= raw(c) {
            return false;
        }
        if !self.mesh.is_real(b) || !self.mesh.is_real(c) {
            return false;
        }
        let store = &self.mesh.store;
        if !closes_triangle(store, a, b, c) {
            return false;
        }
        let (pa, pb, pc) = (store.point(a), store.point(b), store.point(c));
        pa.distance_2d(pb) <= self.max_edge_length
            && pb.distance_2d(pc) <= self.max_edge_length
            && pc.distance_2d(pa) <= self.max_edge_length
    }
}

impl Iterator for Triangles<'_> {
    type Item = (VertexKey, VertexKey, VertexKey);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&a) = self.order.get(self.vertex) {
            let links = self.mesh.store.neighbors(a);
            let n = links.len();
            if n >= 2 && self.mesh.is_real(a) {
                while self.link < n {
                    let (b, c) = (links[self.link], links[(self.link + 1) % n]);
                    self.link += 1;
                    if self.accepts(a, b, c) {
                        return Some((a, b, c));
                    }
                }
            }
            self.vertex += 1;
            self.link = 0;
        }
        None
    }
}

impl FusedIterator for Triangles<'_> {}

impl Mesh {
    /// Every edge between two real vertices, once.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tinlink::prelude::*;
    ///
    /// let mesh = Mesh::new([[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]).unwrap();
    /// assert_eq!(mesh.iter_edges().count(), 5);
    /// ```
    #[must_use]
    pub fn iter_edges(&self) -> Edges<'_> {
        Edges {
            mesh: self,
            order: self.store.ordered_keys(),
            vertex: 0,
            link: 0,
        }
    }

    /// Every triangle whose edges are all at most `max_edge_length` long, once, as a
    /// clockwise triple. Triangles touching a sentinel are never reported.
    ///
    /// Pass `f64::INFINITY` to disable the length filter.
    #[must_use]
    pub fn iter_triangles(&self, max_edge_length: f64) -> Triangles<'_> {
        Triangles {
            mesh: self,
            order: self.store.ordered_keys(),
            vertex: 0,
            link: 0,
            max_edge_length,
        }
    }
}
