//! The surface capability shared by terrain representations.

use crate::core::algorithms::contour::{ContourError, ContourLine, ContourOptions};
use crate::core::mesh::Mesh;
use crate::geometry::point::BoundingBox;

/// A queryable elevation surface.
///
/// # Examples
///
/// ```rust
/// use tinlink::prelude::*;
///
/// fn describe<S: SurfaceModel>(surface: &S) -> usize {
///     surface
///         .contours(&ContourOptions::new(5.0))
///         .map_or(0, |lines| lines.len())
/// }
///
/// let mesh = Mesh::new([
///     [0.0, 0.0, 0.0],
///     [10.0, 0.0, 10.0],
///     [10.0, 10.0, 20.0],
///     [0.0, 10.0, 10.0],
/// ])
///     .unwrap();
/// assert!(describe(&mesh) > 0);
/// assert!(mesh.elevation_at(5.0, 0.0).is_some_and(|z| (z - 5.0).abs() < 1e-9));
/// ```
pub trait SurfaceModel {
    /// Planar and vertical extent of the surface, `None` when empty.
    fn extent(&self) -> Option<BoundingBox>;

    /// Elevation at `(x, y)`, `None` outside the surface.
    fn elevation_at(&self, x: f64, y: f64) -> Option<f64>;

    /// Contour polylines at the levels described by `options`.
    ///
    /// # Errors
    ///
    /// Returns a [`ContourError`] for unusable options.
    fn contours(&self, options: &ContourOptions) -> Result<Vec<ContourLine>, ContourError>;
}

impl SurfaceModel for Mesh {
    #[inline]
    fn extent(&self) -> Option<BoundingBox> {
        Self::extent(self)
    }

    #[inline]
    fn elevation_at(&self, x: f64, y: f64) -> Option<f64> {
        Self::elevation_at(self, x, y)
    }

    fn contours(&self, options: &ContourOptions) -> Result<Vec<ContourLine>, ContourError> {
        self.contour_lines(options)
    }
}
