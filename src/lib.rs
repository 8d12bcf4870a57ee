//! # tinlink
//!
//! Incremental triangulated irregular networks (TINs) for terrain surfaces, with break
//! lines and contour extraction.
//!
//! A mesh is stored as a set of vertices, each holding a clockwise-ordered list of the
//! vertices it is linked to. Triangles and edges are never stored: they are derived from
//! the link lists on demand.
//!
//! # Features
//!
//! - Incremental construction from scattered points or a regular grid
//!   ([`GridDem`](core::terrain::GridDem))
//! - Break lines (constraint edges) enforced by edge flips and Steiner vertices
//! - Lazy triangle and edge iteration with an optional edge-length filter
//! - Contour (isoline) extraction into open and closed polylines
//! - Optional sentinel frame around the data so the outer boundary stays well shaped
//! - A plain-text save/load format and serde support for all options
//!
//! # Basic Usage
//!
//! ```rust
//! use tinlink::prelude::*;
//!
//! let mesh = MeshBuilder::new([
//!     point!([0.0, 0.0, 0.0], "SW"),
//!     point!([10.0, 0.0, 10.0], "SE"),
//!     point!([10.0, 10.0, 20.0], "NE"),
//!     point!([0.0, 10.0, 10.0], "NW"),
//!     point!([5.0, 5.0, 10.0]),
//! ])
//! .convex_boundary(true)
//! .build()
//! .unwrap();
//!
//! assert_eq!(mesh.vertex_count(), 5);
//! assert_eq!(mesh.iter_triangles(f64::INFINITY).count(), 4);
//!
//! let lines = mesh.contour_lines(&ContourOptions::new(5.0)).unwrap();
//! assert!(lines.iter().all(|line| line.points.iter().all(|p| p.2 == line.elevation)));
//! ```
//!
//! # Break Lines
//!
//! ```rust
//! use tinlink::prelude::*;
//!
//! let mut mesh = Mesh::new([[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]).unwrap();
//! let sw = mesh.vertex_at(0.0, 0.0).unwrap();
//! let ne = mesh.vertex_at(10.0, 10.0).unwrap();
//! let se = mesh.vertex_at(10.0, 0.0).unwrap();
//! let nw = mesh.vertex_at(0.0, 10.0).unwrap();
//!
//! // Whichever diagonal construction picked, both can be forced in turn.
//! mesh.force_edge(sw, ne).unwrap();
//! assert!(mesh.are_linked(sw, ne));
//! mesh.force_edge(se, nw).unwrap();
//! assert!(mesh.are_linked(se, nw));
//! assert!(!mesh.are_linked(sw, ne));
//! ```
//!
//! # Invariants
//!
//! [`Mesh::validate`](core::mesh::Mesh::validate) checks what every operation maintains:
//!
//! - **Symmetry**: `a` lists `b` exactly when `b` lists `a`.
//! - **No self or duplicate links.**
//! - **Clockwise order**: every link list is sorted clockwise by polar angle.
//! - **Sentinel isolation**: sentinels carry no label and never reach any output.
//! - **Unique labels.**
//!
//! Construction, constraint enforcement and convexification never create crossing edges.

// Forbid unsafe code throughout the entire crate
#![forbid(unsafe_code)]

#[macro_use]
extern crate derive_builder;

/// Mesh data structures and the algorithms that build, constrain and contour them.
pub mod core {
    /// Construction, constraint enforcement and contouring.
    pub mod algorithms {
        /// Break-line enforcement by flips and Steiner vertices
        pub mod break_lines;
        /// Contour tracing over the triangle set
        pub mod contour;
        /// Angular-hull incremental construction
        pub mod incremental_insertion;
    }
    pub mod builder;
    /// Collection aliases and the spatial hash grid
    pub mod collections;
    pub mod edge;
    pub mod iterators;
    pub mod link_store;
    pub mod mesh;
    pub mod persistence;
    pub mod terrain;
    pub mod util;
    pub mod vertex;
    /// Cancellation and surface capability traits.
    pub mod traits {
        pub mod cancellation;
        pub mod surface_model;
        pub use cancellation::*;
        pub use surface_model::*;
    }
    // Re-export the `core` modules.
    pub use builder::*;
    pub use mesh::*;
    pub use traits::*;
    pub use vertex::*;
    // Note: collections module not re-exported here to avoid namespace pollution
}

/// Planar geometry: points, orientation predicates, angle helpers and the convex hull.
pub mod geometry {
    /// Geometric algorithms on point sets
    pub mod algorithms {
        /// 2D convex hull (monotone chain)
        pub mod convex_hull;
        pub use convex_hull::*;
    }
    pub mod point;
    pub mod predicates;
    /// Angle and interpolation helpers
    pub mod util;
    pub use algorithms::*;
    pub use point::*;
    pub use predicates::*;
    pub use util::*;
}

/// A prelude module that re-exports commonly used types and macros.
/// This makes it easier to import the most commonly used items from the crate.
pub mod prelude {
    // Re-export from core
    pub use crate::core::{
        algorithms::{
            break_lines::{ConstraintError, ConstraintReport},
            contour::{
                ContourError, ContourLine, ContourOptions, ContourSink, ContourSummary,
                ElevationSource,
            },
            incremental_insertion::ConstructionStatistics,
        },
        builder::{ConstructionOptions, MeshBuilder},
        edge::EdgeKey,
        iterators::{Edges, Triangles},
        link_store::{LinkStore, LinkStoreValidationError, VertexKey},
        mesh::{Mesh, MeshConstructionError, MeshValidationError},
        persistence::PersistenceError,
        terrain::{GridDem, GridDemError, TerrainError, TerrainSource},
        traits::{cancellation::*, surface_model::SurfaceModel},
        vertex::{InputPoint, InputPointBuilder, Vertex, VertexKind},
    };

    // Re-export commonly used collection types from core::collections
    pub use crate::core::collections::{FastHashMap, FastHashSet};

    // Re-export from geometry
    pub use crate::geometry::{
        point::{BoundingBox, Point},
        predicates::{Orientation, TriangleLocation},
    };

    // Convenience macros
    pub use crate::point;
}

/// The function `is_normal` checks that structs implement `auto` traits.
/// Traits are checked at compile time, so this function is only used for
/// testing.
#[must_use]
pub const fn is_normal<T: Sized + Send + Sync + Unpin>() -> bool {
    true
}

// =============================================================================
// TESTS
// =============================================================================
