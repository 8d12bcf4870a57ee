//! Canonical edge identifiers.
//!
//! Edges are not stored; they are the symmetric links of the [`LinkStore`]. `EdgeKey`
//! gives an undirected link a stable, hashable identity so `(a, b)` and `(b, a)` map to
//! the same key.
//!
//! ## Determinism
//!
//! `EdgeKey` ordering follows the internal slotmap key order, which depends on insertion
//! history. It is stable for a given mesh but not across save/load round trips.
//!
//! [`LinkStore`]: crate::core::link_store::LinkStore

use crate::core::link_store::VertexKey;
use slotmap::Key;

/// Canonical identifier for an undirected edge.
///
/// # Examples
///
/// ```rust
/// use tinlink::core::edge::EdgeKey;
/// use tinlink::core::link_store::VertexKey;
/// use slotmap::KeyData;
///
/// let a = VertexKey::from(KeyData::from_ffi(1));
/// let b = VertexKey::from(KeyData::from_ffi(2));
/// assert_eq!(EdgeKey::new(a, b), EdgeKey::new(b, a));
/// assert_eq!(EdgeKey::new(b, a).other(a), Some(b));
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    v0: VertexKey,
    v1: VertexKey,
}

impl EdgeKey {
    /// Creates a canonical edge key; endpoints are reordered so that `v0 <= v1` under the
    /// raw key order.
    #[must_use]
    pub fn new(a: VertexKey, b: VertexKey) -> Self {
        if a.data().as_ffi() <= b.data().as_ffi() {
            Self { v0: a, v1: b }
        } else {
            Self { v0: b, v1: a }
        }
    }

    /// First (canonical) endpoint.
    #[inline]
    #[must_use]
    pub const fn v0(self) -> VertexKey {
        self.v0
    }

    /// Second (canonical) endpoint.
    #[inline]
    #[must_use]
    pub const fn v1(self) -> VertexKey {
        self.v1
    }

    /// Both endpoints as a tuple.
    #[inline]
    #[must_use]
    pub const fn endpoints(self) -> (VertexKey, VertexKey) {
        (self.v0, self.v1)
    }

    /// The endpoint opposite `v`, or `None` if `v` is not an endpoint.
    #[inline]
    #[must_use]
    pub fn other(self, v: VertexKey) -> Option<VertexKey> {
        if v == self.v0 {
            Some(self.v1)
        } else if v == self.v1 {
            Some(self.v0)
        } else {
            None
        }
    }

    /// Returns `true` if `v` is one of the endpoints.
    #[inline]
    #[must_use]
    pub fn contains(self, v: VertexKey) -> bool {
        v == self.v0 || v == self.v1
    }
}

impl From<(VertexKey, VertexKey)> for EdgeKey {
    #[inline]
    fn from((a, b): (VertexKey, VertexKey)) -> Self {
        Self::new(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn edge_key_is_canonical() {
        let mut vertices: SlotMap<VertexKey, ()> = SlotMap::with_key();
        let a = vertices.insert(());
        let b = vertices.insert(());

        let e1 = EdgeKey::new(a, b);
        let e2 = EdgeKey::new(b, a);

        assert_eq!(e1, e2);
        assert!(e1.v0().data().as_ffi() <= e1.v1().data().as_ffi());
        assert_eq!(EdgeKey::from((b, a)), e1);
    }

    #[test]
    fn other_endpoint_lookup() {
        let mut vertices: SlotMap<VertexKey, ()> = SlotMap::with_key();
        let a = vertices.insert(());
        let b = vertices.insert(());
        let c = vertices.insert(());

        let e = EdgeKey::new(a, b);
        assert_eq!(e.other(a), Some(b));
        assert_eq!(e.other(b), Some(a));
        assert_eq!(e.other(c), None);
        assert!(e.contains(a) && !e.contains(c));
        assert_eq!(e.endpoints(), (e.v0(), e.v1()));
    }
}
