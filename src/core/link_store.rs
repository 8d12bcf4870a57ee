//! Symmetric vertex adjacency with clockwise-ordered link lists.
//!
//! The [`LinkStore`] is the only topological representation of a mesh. Every vertex owns
//! the list of its neighbours sorted clockwise by the angle at which each neighbour is seen
//! from the vertex. Triangles are never stored: two neighbours that are consecutive in a
//! vertex's list and linked to each other close a triangle with that vertex.
//!
//! # Invariants
//!
//! - links are symmetric: `b ∈ links(a)` iff `a ∈ links(b)`
//! - no vertex links to itself, and no list contains a neighbour twice
//! - every list is sorted clockwise (non-increasing polar angle, starting from `+π`)
//!
//! [`LinkStore::validate`] checks all three and reports the first violation found.

use std::cmp::Ordering;

use slotmap::{Key, new_key_type};
use thiserror::Error;

use crate::core::collections::StorageMap;
use crate::core::vertex::Vertex;
use crate::geometry::point::Point;
use crate::geometry::util::angle_of;

new_key_type! {
    /// Key type for accessing vertices in the link store.
    ///
    /// Keys are stable: inserting Steiner vertices or discarding sentinels never
    /// invalidates the keys of other vertices.
    pub struct VertexKey;
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Violations of the link-store invariants.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum LinkStoreValidationError {
    /// A vertex lists itself as a neighbour.
    #[error("Vertex {vertex:?} is linked to itself")]
    SelfLink {
        /// The offending vertex.
        vertex: VertexKey,
    },
    /// A neighbour appears more than once in a link list.
    #[error("Vertex {vertex:?} lists neighbour {neighbor:?} more than once")]
    DuplicateLink {
        /// The vertex owning the list.
        vertex: VertexKey,
        /// The repeated neighbour.
        neighbor: VertexKey,
    },
    /// A link list references a vertex that is not in the store.
    #[error("Vertex {vertex:?} references missing neighbour {neighbor:?}")]
    DanglingLink {
        /// The vertex owning the list.
        vertex: VertexKey,
        /// The missing neighbour key.
        neighbor: VertexKey,
    },
    /// `to` is in `from`'s list but not the other way round.
    #[error("Link {from:?} -> {to:?} has no reverse link")]
    AsymmetricLink {
        /// Vertex whose list contains `to`.
        from: VertexKey,
        /// Vertex whose list is missing `from`.
        to: VertexKey,
    },
    /// A link list is not in clockwise order.
    #[error("Link list of vertex {vertex:?} is not sorted clockwise at position {position}")]
    UnsortedLinks {
        /// The vertex owning the list.
        vertex: VertexKey,
        /// Index of the first neighbour out of order.
        position: usize,
    },
}

// =============================================================================
// LINK STORE
// =============================================================================

/// Arena of vertices and their clockwise link lists.
///
/// Vertices are kept in insertion order alongside the arena so that iteration (and
/// therefore persistence and triangle enumeration) is deterministic.
///
/// # Examples
///
/// ```rust
/// use tinlink::core::link_store::LinkStore;
/// use tinlink::geometry::point::Point;
///
/// let mut store = LinkStore::new();
/// let a = store.insert_input(Point::new_2d(0.0, 0.0));
/// let b = store.insert_input(Point::new_2d(1.0, 0.0));
/// let c = store.insert_input(Point::new_2d(0.0, 1.0));
/// store.link(a, b);
/// store.link(b, c);
/// store.link(c, a);
///
/// assert!(store.are_linked(b, a));
/// assert_eq!(store.edge_count(), 3);
/// // Seen from `a`, `c` (90°) comes before `b` (0°) in clockwise order.
/// assert_eq!(store.neighbors(a), &[c, b]);
/// assert!(store.validate().is_ok());
/// ```
#[derive(Clone, Debug, Default)]
pub struct LinkStore {
    vertices: StorageMap<VertexKey, Vertex>,
    order: Vec<VertexKey>,
}

impl LinkStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with room for `capacity` vertices.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            vertices: StorageMap::with_capacity_and_key(capacity),
            order: Vec::with_capacity(capacity),
        }
    }

    /// Number of vertices, sentinels included.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns `true` when the store holds no vertices.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Returns `true` if `key` refers to a vertex in this store.
    #[inline]
    #[must_use]
    pub fn contains(&self, key: VertexKey) -> bool {
        self.vertices.contains_key(key)
    }

    /// Looks up a vertex.
    #[inline]
    #[must_use]
    pub fn vertex(&self, key: VertexKey) -> Option<&Vertex> {
        self.vertices.get(key)
    }

    /// Vertex keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = VertexKey> + '_ {
        self.order.iter().copied()
    }

    /// Vertices in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (VertexKey, &Vertex)> + '_ {
        self.order.iter().map(|&k| (k, &self.vertices[k]))
    }

    /// Clockwise neighbours of `key`; empty for unknown keys.
    #[inline]
    #[must_use]
    pub fn neighbors(&self, key: VertexKey) -> &[VertexKey] {
        self.vertices.get(key).map_or(&[], |v| v.links())
    }

    /// Number of undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.vertices.values().map(Vertex::degree).sum::<usize>() / 2
    }

    /// Inserts a vertex with no links and returns its key.
    pub fn insert_vertex(&mut self, vertex: Vertex) -> VertexKey {
        let key = self.vertices.insert(vertex);
        self.order.push(key);
        key
    }

    /// Inserts an unlabelled input vertex at `point`.
    pub fn insert_input(&mut self, point: Point) -> VertexKey {
        self.insert_vertex(Vertex::new(
            point,
            [],
            None,
            crate::core::vertex::VertexKind::Input,
        ))
    }

    /// Removes a vertex and every link to it.
    pub fn remove_vertex(&mut self, key: VertexKey) -> Option<Vertex> {
        let mut vertex = self.vertices.remove(key)?;
        for neighbor in vertex.links.drain(..) {
            if let Some(n) = self.vertices.get_mut(neighbor) {
                n.links.retain(|k| *k != key);
            }
        }
        self.order.retain(|k| *k != key);
        Some(vertex)
    }

    /// Returns `true` when `a` and `b` are linked.
    #[inline]
    #[must_use]
    pub fn are_linked(&self, a: VertexKey, b: VertexKey) -> bool {
        self.neighbors(a).contains(&b)
    }

    /// Links `a` and `b`, inserting each into the other's list at its clockwise position.
    ///
    /// Returns `false` (and does nothing) for self links, unknown keys or existing links.
    pub fn link(&mut self, a: VertexKey, b: VertexKey) -> bool {
        if a == b || !self.contains(a) || !self.contains(b) || self.are_linked(a, b) {
            return false;
        }
        self.insert_sorted(a, b);
        self.insert_sorted(b, a);
        true
    }

    /// Removes the link between `a` and `b`. Returns `false` if they were not linked.
    pub fn unlink(&mut self, a: VertexKey, b: VertexKey) -> bool {
        if !self.are_linked(a, b) {
            return false;
        }
        if let Some(v) = self.vertices.get_mut(a) {
            v.links.retain(|k| *k != b);
        }
        if let Some(v) = self.vertices.get_mut(b) {
            v.links.retain(|k| *k != a);
        }
        true
    }

    /// Neighbour following `b` clockwise around `a`, wrapping around the list.
    #[must_use]
    pub fn next_clockwise(&self, a: VertexKey, b: VertexKey) -> Option<VertexKey> {
        let links = self.neighbors(a);
        let pos = links.iter().position(|k| *k == b)?;
        Some(links[(pos + 1) % links.len()])
    }

    /// Neighbour preceding `b` clockwise around `a` (the next one counter-clockwise).
    #[must_use]
    pub fn next_counter_clockwise(&self, a: VertexKey, b: VertexKey) -> Option<VertexKey> {
        let links = self.neighbors(a);
        let pos = links.iter().position(|k| *k == b)?;
        Some(links[(pos + links.len() - 1) % links.len()])
    }

    /// Re-sorts every link list clockwise.
    ///
    /// Link insertion keeps lists sorted already; this pass is run after bulk loading.
    pub fn sort_links(&mut self) {
        let keys: Vec<VertexKey> = self.order.clone();
        for key in keys {
            let origin = *self.vertices[key].point();
            let mut links = std::mem::take(&mut self.vertices[key].links);
            links.sort_by(|&p, &q| self.clockwise_cmp(&origin, p, q));
            self.vertices[key].links = links;
        }
    }

    /// Checks symmetry, self/duplicate links, dangling references and clockwise order.
    ///
    /// # Errors
    ///
    /// Returns the first [`LinkStoreValidationError`] encountered, scanning vertices in
    /// insertion order.
    pub fn validate(&self) -> Result<(), LinkStoreValidationError> {
        for (key, vertex) in self.iter() {
            let links = vertex.links();
            for (i, &neighbor) in links.iter().enumerate() {
                if neighbor == key {
                    return Err(LinkStoreValidationError::SelfLink { vertex: key });
                }
                if links[..i].contains(&neighbor) {
                    return Err(LinkStoreValidationError::DuplicateLink {
                        vertex: key,
                        neighbor,
                    });
                }
                let Some(other) = self.vertices.get(neighbor) else {
                    return Err(LinkStoreValidationError::DanglingLink {
                        vertex: key,
                        neighbor,
                    });
                };
                if !other.links().contains(&key) {
                    return Err(LinkStoreValidationError::AsymmetricLink {
                        from: key,
                        to: neighbor,
                    });
                }
            }
            for position in 1..links.len() {
                let prev = angle_of(vertex.point(), self.vertices[links[position - 1]].point());
                let next = angle_of(vertex.point(), self.vertices[links[position]].point());
                if next > prev {
                    return Err(LinkStoreValidationError::UnsortedLinks {
                        vertex: key,
                        position,
                    });
                }
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    pub(crate) fn ordered_keys(&self) -> &[VertexKey] {
        &self.order
    }

    /// Point of a vertex known to be in the store.
    #[inline]
    pub(crate) fn point(&self, key: VertexKey) -> &Point {
        self.vertices[key].point()
    }

    #[cfg(test)]
    pub(crate) fn vertex_mut(&mut self, key: VertexKey) -> Option<&mut Vertex> {
        self.vertices.get_mut(key)
    }

    /// Clockwise order: larger polar angle first, ties broken by key.
    fn clockwise_cmp(&self, origin: &Point, p: VertexKey, q: VertexKey) -> Ordering {
        let ap = angle_of(origin, self.point(p));
        let aq = angle_of(origin, self.point(q));
        aq.total_cmp(&ap)
            .then_with(|| p.data().as_ffi().cmp(&q.data().as_ffi()))
    }

    fn insert_sorted(&mut self, owner: VertexKey, neighbor: VertexKey) {
        let origin = *self.point(owner);
        let pos = self.vertices[owner]
            .links
            .partition_point(|&k| self.clockwise_cmp(&origin, k, neighbor) == Ordering::Less);
        self.vertices[owner].links.insert(pos, neighbor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vertex::VertexKind;

    fn square() -> (LinkStore, [VertexKey; 4]) {
        let mut store = LinkStore::new();
        let a = store.insert_input(Point::new_2d(0.0, 0.0));
        let b = store.insert_input(Point::new_2d(1.0, 0.0));
        let c = store.insert_input(Point::new_2d(1.0, 1.0));
        let d = store.insert_input(Point::new_2d(0.0, 1.0));
        (store, [a, b, c, d])
    }

    #[test]
    fn link_is_symmetric_and_idempotent() {
        let (mut store, [a, b, ..]) = square();
        assert!(store.link(a, b));
        assert!(!store.link(b, a));
        assert!(!store.link(a, a));
        assert!(store.are_linked(a, b) && store.are_linked(b, a));
        assert!(store.unlink(b, a));
        assert!(!store.unlink(a, b));
        assert_eq!(store.edge_count(), 0);
    }

    #[test]
    fn links_are_kept_clockwise() {
        let (mut store, [a, b, c, d]) = square();
        let centre = store.insert_input(Point::new_2d(0.5, 0.5));
        for k in [b, d, a, c] {
            store.link(centre, k);
        }
        // Angles from the centre: c 45°, d 135°, a -135°, b -45°.
        // Clockwise from +π: d, c, b, a
        assert_eq!(store.neighbors(centre), &[d, c, b, a]);
        assert_eq!(store.next_clockwise(centre, a), Some(d));
        assert_eq!(store.next_counter_clockwise(centre, d), Some(a));
        assert!(store.validate().is_ok());
    }

    #[test]
    fn remove_vertex_drops_incident_links() {
        let (mut store, [a, b, c, d]) = square();
        store.link(a, b);
        store.link(a, c);
        store.link(c, d);
        let removed = store.remove_vertex(a).unwrap();
        assert!(removed.links().is_empty());
        assert!(store.neighbors(b).is_empty());
        assert_eq!(store.neighbors(c), &[d]);
        assert_eq!(store.keys().collect::<Vec<_>>(), vec![b, c, d]);
        assert!(store.remove_vertex(a).is_none());
        assert!(store.validate().is_ok());
    }

    #[test]
    fn validate_reports_broken_invariants() {
        let (mut store, [a, b, c, _]) = square();
        store.link(a, b);
        store.vertex_mut(a).unwrap().links.push(c);
        assert!(matches!(
            store.validate(),
            Err(LinkStoreValidationError::AsymmetricLink { .. })
        ));

        let (mut store, [a, ..]) = square();
        store.vertex_mut(a).unwrap().links.push(a);
        assert_eq!(
            store.validate(),
            Err(LinkStoreValidationError::SelfLink { vertex: a })
        );
    }

    #[test]
    fn sort_links_repairs_order() {
        let (mut store, [a, b, c, d]) = square();
        store.link(a, b);
        store.link(a, c);
        store.link(a, d);
        store.vertex_mut(a).unwrap().links.reverse();
        assert!(matches!(
            store.validate(),
            Err(LinkStoreValidationError::UnsortedLinks { .. })
        ));
        store.sort_links();
        assert_eq!(store.neighbors(a), &[d, c, b]);
        assert!(store.validate().is_ok());
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut store = LinkStore::with_capacity(3);
        let keys: Vec<_> = (0..3)
            .map(|i| {
                store.insert_vertex(Vertex::new(
                    Point::new_2d(f64::from(i), 0.0),
                    [],
                    None,
                    VertexKind::Input,
                ))
            })
            .collect();
        assert_eq!(store.keys().collect::<Vec<_>>(), keys);
        assert_eq!(store.len(), 3);
        assert!(!store.is_empty());
        assert!(store.vertex(keys[1]).is_some());
    }
}
