//! Collection aliases and small spatial index used across the crate.

mod aliases;
mod spatial_hash_grid;

pub use aliases::*;
pub use spatial_hash_grid::HashGridIndex;
