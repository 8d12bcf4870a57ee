use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use slotmap::SlotMap;
use smallvec::SmallVec;

// =============================================================================
// STORAGE BACKEND
// =============================================================================

/// Arena backing the link store.
///
/// Keys stay valid across unrelated insertions and removals, so `VertexKey`s handed out
/// during construction remain usable after constraints add Steiner vertices.
pub type StorageMap<K, V> = SlotMap<K, V>;

// =============================================================================
// HASHING
// =============================================================================

/// Hash map with the non-cryptographic `FxHash` hasher.
///
/// Keys in this crate are slotmap handles, edge keys and grid cells, none of which are
/// attacker-controlled, so `FxHash` is used throughout.
///
/// # Examples
///
/// ```rust
/// use tinlink::core::collections::FastHashMap;
///
/// let mut map: FastHashMap<u64, usize> = FastHashMap::default();
/// map.insert(7, 1);
/// assert_eq!(map.get(&7), Some(&1));
/// ```
pub type FastHashMap<K, V> = FxHashMap<K, V>;

/// Hash set with the `FxHash` hasher.
pub type FastHashSet<T> = FxHashSet<T>;

/// Build hasher used by [`FastHashMap`] and [`FastHashSet`].
pub type FastBuildHasher = FxBuildHasher;

/// Re-export of the map entry API for [`FastHashMap`].
pub use std::collections::hash_map::Entry;

// =============================================================================
// SMALL BUFFERS
// =============================================================================

/// Stack-first vector that spills to the heap past `N` elements.
pub type SmallBuffer<T, const N: usize> = SmallVec<[T; N]>;

/// Inline capacity for vertex link lists.
///
/// Interior vertices of a planar triangulation have six neighbours on average; eight
/// covers the common case without a heap allocation.
pub const LINK_INLINE_CAPACITY: usize = 8;

/// Buffer type used for a vertex's clockwise link list.
pub type LinkBuffer<K> = SmallBuffer<K, LINK_INLINE_CAPACITY>;

// =============================================================================
// CONSTRUCTORS
// =============================================================================

/// Creates a [`FastHashMap`] with room for `capacity` entries.
#[inline]
#[must_use]
pub fn fast_hash_map_with_capacity<K, V>(capacity: usize) -> FastHashMap<K, V> {
    FastHashMap::with_capacity_and_hasher(capacity, FastBuildHasher::default())
}

/// Creates a [`FastHashSet`] with room for `capacity` entries.
#[inline]
#[must_use]
pub fn fast_hash_set_with_capacity<T>(capacity: usize) -> FastHashSet<T> {
    FastHashSet::with_capacity_and_hasher(capacity, FastBuildHasher::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_reserve_capacity() {
        let map: FastHashMap<u32, u32> = fast_hash_map_with_capacity(32);
        assert!(map.capacity() >= 32);
        let set: FastHashSet<u32> = fast_hash_set_with_capacity(16);
        assert!(set.capacity() >= 16);
    }

    #[test]
    fn link_buffer_stays_inline_for_typical_degree() {
        let mut links: LinkBuffer<u32> = LinkBuffer::new();
        links.extend(0..6);
        assert!(!links.spilled());
        links.extend(6..12);
        assert!(links.spilled());
        assert_eq!(links.len(), 12);
    }

    #[test]
    fn entry_api_is_reexported() {
        let mut map: FastHashMap<&str, usize> = FastHashMap::default();
        match map.entry("a") {
            Entry::Vacant(slot) => {
                slot.insert(1);
            }
            Entry::Occupied(_) => unreachable!(),
        }
        assert_eq!(map["a"], 1);
    }
}
