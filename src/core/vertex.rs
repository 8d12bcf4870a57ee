//! Input points and mesh vertices.
//!
//! An [`InputPoint`] is what callers hand to the builder: a coordinate plus an optional
//! label and scalar attributes. A [`Vertex`] is what the link store owns once the point has
//! been accepted into a mesh; it adds the vertex kind and the clockwise link list.

use serde::{Deserialize, Serialize};

use crate::core::collections::{LinkBuffer, SmallBuffer};
use crate::core::link_store::VertexKey;
use crate::geometry::point::Point;

// =============================================================================
// CONVENIENCE MACROS AND HELPERS
// =============================================================================

/// Convenience macro for creating [`InputPoint`]s.
///
/// Uses [`InputPointBuilder`] internally and unwraps the result, so the macro accepts
/// anything convertible into a [`Point`]: `[x, y]`, `[x, y, z]`, `(x, y)`, `(x, y, z)`.
///
/// # Panics
///
/// Panics if the builder fails, which cannot happen for the patterns below since every
/// required field is set.
///
/// # Usage
///
/// ```rust
/// use tinlink::point;
///
/// let a = point!([1.0, 2.0]);
/// let b = point!([1.0, 2.0, 30.0], "BM1");
/// let c = point!((0.0, 0.0, 5.0), "P7", vec![0.25]);
///
/// assert_eq!(a.point.z, 0.0);
/// assert_eq!(b.label.as_deref(), Some("BM1"));
/// assert_eq!(c.attributes, vec![0.25]);
/// ```
#[macro_export]
macro_rules! point {
    ($coords:expr) => {
        $crate::core::vertex::InputPointBuilder::default()
            .point($coords)
            .build()
            .expect("Failed to build input point: builder configuration is incomplete")
    };

    ($coords:expr, $label:expr) => {
        $crate::core::vertex::InputPointBuilder::default()
            .point($coords)
            .label($label)
            .build()
            .expect("Failed to build labelled input point: builder configuration is incomplete")
    };

    ($coords:expr, $label:expr, $attributes:expr) => {
        $crate::core::vertex::InputPointBuilder::default()
            .point($coords)
            .label($label)
            .attributes($attributes)
            .build()
            .expect("Failed to build input point with attributes: builder is incomplete")
    };
}

pub use crate::point;

// =============================================================================
// INPUT POINT
// =============================================================================

/// A point supplied to the mesh builder.
///
/// # Examples
///
/// ```rust
/// use tinlink::core::vertex::{InputPoint, InputPointBuilder};
///
/// let p = InputPointBuilder::default()
///     .point([10.0, 20.0, 3.5])
///     .label("TP4")
///     .attributes(vec![1.0, 2.0])
///     .build()
///     .unwrap();
/// assert_eq!(p.point.z, 3.5);
///
/// let q: InputPoint = [1.0, 2.0].into();
/// assert!(q.label.is_none());
/// ```
#[derive(Builder, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputPoint {
    /// Coordinate; `z` is the elevation used for contouring.
    #[builder(setter(into))]
    pub point: Point,
    /// Optional name, used only for persistence and diagnostics.
    #[builder(setter(into, strip_option), default)]
    pub label: Option<String>,
    /// Further scalar fields carried alongside the elevation.
    #[builder(setter(into), default)]
    pub attributes: Vec<f64>,
}

impl InputPoint {
    /// Creates an unlabelled point without attributes.
    #[inline]
    #[must_use]
    pub const fn new(point: Point) -> Self {
        Self {
            point,
            label: None,
            attributes: Vec::new(),
        }
    }
}

impl From<Point> for InputPoint {
    #[inline]
    fn from(point: Point) -> Self {
        Self::new(point)
    }
}

impl From<[f64; 2]> for InputPoint {
    #[inline]
    fn from(coords: [f64; 2]) -> Self {
        Self::new(coords.into())
    }
}

impl From<[f64; 3]> for InputPoint {
    #[inline]
    fn from(coords: [f64; 3]) -> Self {
        Self::new(coords.into())
    }
}

impl From<(f64, f64)> for InputPoint {
    #[inline]
    fn from(coords: (f64, f64)) -> Self {
        Self::new(coords.into())
    }
}

impl From<(f64, f64, f64)> for InputPoint {
    #[inline]
    fn from(coords: (f64, f64, f64)) -> Self {
        Self::new(coords.into())
    }
}

// =============================================================================
// VERTEX
// =============================================================================

/// How a vertex came to be part of the mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VertexKind {
    /// Supplied by the caller.
    Input,
    /// Synthetic corner of the expanded bounding box; never part of any output.
    Sentinel,
    /// Created by constraint enforcement at an edge intersection.
    Steiner,
}

/// Inline capacity for per-vertex attributes.
pub(crate) const ATTRIBUTE_INLINE_CAPACITY: usize = 2;

/// A vertex stored in the link store.
///
/// The link list is maintained by [`LinkStore`](crate::core::link_store::LinkStore); it
/// holds the neighbours sorted clockwise by their angle seen from this vertex.
#[derive(Clone, Debug)]
pub struct Vertex {
    point: Point,
    attributes: SmallBuffer<f64, ATTRIBUTE_INLINE_CAPACITY>,
    label: Option<String>,
    kind: VertexKind,
    pub(crate) links: LinkBuffer<VertexKey>,
}

impl Vertex {
    pub(crate) fn new(
        point: Point,
        attributes: impl IntoIterator<Item = f64>,
        label: Option<String>,
        kind: VertexKind,
    ) -> Self {
        Self {
            point,
            attributes: attributes.into_iter().collect(),
            label,
            kind,
            links: LinkBuffer::new(),
        }
    }

    /// The vertex coordinate.
    #[inline]
    #[must_use]
    pub const fn point(&self) -> &Point {
        &self.point
    }

    /// Shorthand for `point().x`.
    #[inline]
    #[must_use]
    pub const fn x(&self) -> f64 {
        self.point.x
    }

    /// Shorthand for `point().y`.
    #[inline]
    #[must_use]
    pub const fn y(&self) -> f64 {
        self.point.y
    }

    /// Elevation.
    #[inline]
    #[must_use]
    pub const fn z(&self) -> f64 {
        self.point.z
    }

    /// Extra scalar attributes in input order.
    #[inline]
    #[must_use]
    pub fn attributes(&self) -> &[f64] {
        &self.attributes
    }

    /// Attribute at `index`, if present.
    #[inline]
    #[must_use]
    pub fn attribute(&self, index: usize) -> Option<f64> {
        self.attributes.get(index).copied()
    }

    /// Optional label.
    #[inline]
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// How the vertex was created.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> VertexKind {
        self.kind
    }

    /// Returns `true` for sentinel vertices.
    #[inline]
    #[must_use]
    pub const fn is_sentinel(&self) -> bool {
        matches!(self.kind, VertexKind::Sentinel)
    }

    /// Neighbours sorted clockwise by angle.
    #[inline]
    #[must_use]
    pub fn links(&self) -> &[VertexKey] {
        &self.links
    }

    /// Number of neighbours.
    #[inline]
    #[must_use]
    pub fn degree(&self) -> usize {
        self.links.len()
    }
}
