//! General helper utilities.

mod deduplication;

pub use deduplication::*;
