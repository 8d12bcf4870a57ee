//! Terrain data sources that can be turned into a [`Mesh`].
//!
//! [`TerrainSource`] is either a set of scattered survey points or a regular elevation
//! grid ([`GridDem`]). Both go through the same [`MeshBuilder`] path.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::builder::{ConstructionOptions, MeshBuilder};
use crate::core::mesh::{Mesh, MeshConstructionError};
use crate::core::traits::cancellation::{CancellationCheck, NeverCancel};
use crate::core::vertex::InputPoint;
use crate::geometry::point::Point;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Problems with the shape or spacing of a [`GridDem`].
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum GridDemError {
    /// A cell spacing is zero, negative or not finite.
    #[error("Invalid grid spacing ({spacing_x}, {spacing_y}): both must be finite and positive")]
    InvalidSpacing {
        /// Spacing along x.
        spacing_x: f64,
        /// Spacing along y.
        spacing_y: f64,
    },
    /// The grid origin is not finite.
    #[error("Invalid grid origin ({origin_x}, {origin_y}): coordinates must be finite")]
    InvalidOrigin {
        /// Origin x.
        origin_x: f64,
        /// Origin y.
        origin_y: f64,
    },
    /// `values.len()` does not equal `columns * rows`.
    #[error("Grid of {columns}x{rows} needs {expected} values, found {found}")]
    ShapeMismatch {
        /// Number of columns.
        columns: usize,
        /// Number of rows.
        rows: usize,
        /// `columns * rows`.
        expected: usize,
        /// Values supplied.
        found: usize,
    },
}

/// Errors raised while building a mesh from a [`TerrainSource`].
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum TerrainError {
    /// The grid is malformed.
    #[error(transparent)]
    Grid(#[from] GridDemError),
    /// Mesh construction failed.
    #[error(transparent)]
    Construction(#[from] MeshConstructionError),
}

// =============================================================================
// GRID DEM
// =============================================================================

/// A regular elevation grid.
///
/// Values are row-major; row 0 lies at `origin_y` and rows advance towards +y, columns
/// towards +x. Cells equal to `no_data`, and non-finite cells, are left out of the mesh.
///
/// # Examples
///
/// ```rust
/// use tinlink::core::terrain::GridDem;
///
/// let dem = GridDem::new((0.0, 0.0), (10.0, 10.0), 3, 2, vec![1.0, 2.0, 3.0, 4.0, -9999.0, 6.0])
///     .unwrap()
///     .with_no_data(-9999.0);
/// assert_eq!(dem.value(1, 1), None);
/// assert_eq!(dem.to_points().unwrap().len(), 5);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridDem {
    origin_x: f64,
    origin_y: f64,
    spacing_x: f64,
    spacing_y: f64,
    columns: usize,
    rows: usize,
    values: Vec<f64>,
    #[serde(default)]
    no_data: Option<f64>,
}

impl GridDem {
    /// Creates a grid from its lower-left origin, cell spacing, dimensions and values.
    ///
    /// # Errors
    ///
    /// [`GridDemError`] when the spacing or origin is unusable or the value count does not
    /// match the dimensions.
    pub fn new(
        (origin_x, origin_y): (f64, f64),
        (spacing_x, spacing_y): (f64, f64),
        columns: usize,
        rows: usize,
        values: Vec<f64>,
    ) -> Result<Self, GridDemError> {
        let dem = Self {
            origin_x,
            origin_y,
            spacing_x,
            spacing_y,
            columns,
            rows,
            values,
            no_data: None,
        };
        dem.check()?;
        Ok(dem)
    }

    /// Marks `value` as the no-data sentinel.
    #[must_use]
    pub const fn with_no_data(mut self, value: f64) -> Self {
        self.no_data = Some(value);
        self
    }

    /// Number of columns.
    #[inline]
    #[must_use]
    pub const fn columns(&self) -> usize {
        self.columns
    }

    /// Number of rows.
    #[inline]
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Elevation of a cell, or `None` for no-data and out-of-range cells.
    #[must_use]
    pub fn value(&self, column: usize, row: usize) -> Option<f64> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        let value = *self.values.get(row * self.columns + column)?;
        (value.is_finite() && self.no_data != Some(value)).then_some(value)
    }

    /// Planar position of a grid node.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "grid dimensions stay far below 2^52"
    )]
    pub fn position(&self, column: usize, row: usize) -> (f64, f64) {
        (
            (column as f64).mul_add(self.spacing_x, self.origin_x),
            (row as f64).mul_add(self.spacing_y, self.origin_y),
        )
    }

    /// Every grid node with data, as input points in row-major order.
    ///
    /// # Errors
    ///
    /// [`GridDemError`] if the grid was deserialized into an inconsistent shape.
    pub fn to_points(&self) -> Result<Vec<InputPoint>, GridDemError> {
        self.check()?;
        let points = (0..self.rows)
            .flat_map(|row| (0..self.columns).map(move |column| (column, row)))
            .filter_map(|(column, row)| {
                let z = self.value(column, row)?;
                let (x, y) = self.position(column, row);
                Some(InputPoint::new(Point::new(x, y, z)))
            })
            .collect();
        Ok(points)
    }

    fn check(&self) -> Result<(), GridDemError> {
        let spacing_ok = |s: f64| s.is_finite() && s > 0.0;
        if !spacing_ok(self.spacing_x) || !spacing_ok(self.spacing_y) {
            return Err(GridDemError::InvalidSpacing {
                spacing_x: self.spacing_x,
                spacing_y: self.spacing_y,
            });
        }
        if !self.origin_x.is_finite() || !self.origin_y.is_finite() {
            return Err(GridDemError::InvalidOrigin {
                origin_x: self.origin_x,
                origin_y: self.origin_y,
            });
        }
        let expected = self.columns.saturating_mul(self.rows);
        if self.values.len() != expected {
            return Err(GridDemError::ShapeMismatch {
                columns: self.columns,
                rows: self.rows,
                expected,
                found: self.values.len(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// TERRAIN SOURCE
// =============================================================================

/// Where the elevations come from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum TerrainSource {
    /// Irregular survey points.
    Scattered(Vec<InputPoint>),
    /// A regular elevation grid.
    Grid(GridDem),
}

impl TerrainSource {
    /// Builds a mesh from the source.
    ///
    /// # Errors
    ///
    /// [`TerrainError::Grid`] for a malformed grid, [`TerrainError::Construction`] when
    /// mesh construction fails.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tinlink::prelude::*;
    ///
    /// let dem = GridDem::new((0.0, 0.0), (1.0, 1.0), 2, 2, vec![0.0, 1.0, 1.0, 2.0]).unwrap();
    /// let mesh = TerrainSource::Grid(dem).build(ConstructionOptions::default()).unwrap();
    /// assert_eq!(mesh.vertex_count(), 4);
    /// ```
    pub fn build(&self, options: ConstructionOptions) -> Result<Mesh, TerrainError> {
        self.build_with_cancel(options, &NeverCancel)
    }

    /// [`TerrainSource::build`] with a cancellation check.
    ///
    /// # Errors
    ///
    /// See [`TerrainSource::build`].
    pub fn build_with_cancel<C>(
        &self,
        options: ConstructionOptions,
        cancel: &C,
    ) -> Result<Mesh, TerrainError>
    where
        C: CancellationCheck + ?Sized,
    {
        let points = match self {
            Self::Scattered(points) => points.clone(),
            Self::Grid(dem) => dem.to_points()?,
        };
        tracing::debug!(points = points.len(), "building mesh from terrain source");
        Ok(MeshBuilder::new(points)
            .options(options)
            .build_with_cancel(cancel)?)
    }
}

impl From<GridDem> for TerrainSource {
    fn from(dem: GridDem) -> Self {
        Self::Grid(dem)
    }
}

impl From<Vec<InputPoint>> for TerrainSource {
    fn from(points: Vec<InputPoint>) -> Self {
        Self::Scattered(points)
    }
}
