//! Spatial hash grid over planar vertex positions.
//!
//! Used for near-duplicate detection while building a mesh and for `Mesh::vertex_at`
//! lookups afterwards. Adjacency traversal never goes through the grid.
//!
//! The grid degrades gracefully: if a coordinate cannot be keyed (non-finite, or too large
//! for unit cell resolution) the index disables itself and callers fall back to a linear
//! scan.

use num_traits::ToPrimitive;

use super::{FastHashMap, SmallBuffer};

const BUCKET_INLINE_CAPACITY: usize = 8;

type GridKey = (i64, i64);

/// A uniform grid mapping cells of side `cell_size` to the keys stored in them.
///
/// Queries visit the 3×3 block of cells around the query point, so any key within
/// `cell_size` of the query is guaranteed to be visited.
#[derive(Clone, Debug)]
pub struct HashGridIndex<K> {
    cell_size: f64,
    usable: bool,
    cells: FastHashMap<GridKey, SmallBuffer<K, BUCKET_INLINE_CAPACITY>>,
}

impl<K> HashGridIndex<K>
where
    K: Copy + PartialEq,
{
    /// Creates an empty grid. A non-finite or non-positive `cell_size` yields an unusable
    /// grid.
    #[must_use]
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            usable: cell_size.is_finite() && cell_size > 0.0,
            cells: FastHashMap::default(),
        }
    }

    /// Whether queries can be answered from the grid.
    #[inline]
    #[must_use]
    pub const fn is_usable(&self) -> bool {
        self.usable
    }

    /// Side length of a grid cell.
    #[inline]
    #[must_use]
    pub const fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Removes every entry. Usability is unchanged.
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Inserts `key` at `(x, y)`, disabling the grid if the position cannot be keyed.
    pub fn insert(&mut self, key: K, x: f64, y: f64) {
        if !self.usable {
            return;
        }
        let Some(cell) = self.cell_for(x, y) else {
            self.usable = false;
            return;
        };
        self.cells.entry(cell).or_default().push(key);
    }

    /// Removes `key` from the cell containing `(x, y)`.
    pub fn remove(&mut self, key: K, x: f64, y: f64) {
        let Some(cell) = self.cell_for(x, y) else {
            return;
        };
        if let Some(bucket) = self.cells.get_mut(&cell) {
            bucket.retain(|k| *k != key);
            if bucket.is_empty() {
                self.cells.remove(&cell);
            }
        }
    }

    /// Visits every key stored in the 3×3 neighbourhood of `(x, y)`, stopping early when
    /// `f` returns `false`.
    ///
    /// Returns `false` when the grid could not answer the query; the caller must then scan
    /// linearly.
    pub fn for_each_candidate<F>(&self, x: f64, y: f64, mut f: F) -> bool
    where
        F: FnMut(K) -> bool,
    {
        if !self.usable {
            return false;
        }
        let Some((cx, cy)) = self.cell_for(x, y) else {
            return false;
        };
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(bucket) = self.cells.get(&(cx + dx, cy + dy)) {
                    for &key in bucket {
                        if !f(key) {
                            return true;
                        }
                    }
                }
            }
        }
        true
    }

    fn cell_for(&self, x: f64, y: f64) -> Option<GridKey> {
        if !self.usable {
            return None;
        }
        let cx = (x / self.cell_size).floor();
        let cy = (y / self.cell_size).floor();
        // Neighbour enumeration needs unit resolution at this magnitude.
        if cx + 1.0 == cx || cy + 1.0 == cy {
            return None;
        }
        // Keep one cell of headroom so neighbour offsets cannot overflow.
        let cx = cx.to_i64().filter(|v| v.checked_add(2).is_some() && v.checked_sub(2).is_some())?;
        let cy = cy.to_i64().filter(|v| v.checked_add(2).is_some() && v.checked_sub(2).is_some())?;
        Some((cx, cy))
    }
}
