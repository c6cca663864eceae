//! Raw structured grids as read from DEM files.

use crate::error::GeometryError;
use crate::Result;

/// Sentinel used by DEM products to mark an undefined sample.
pub const INVALID_VALUE: f32 = -1.0e38;

/// Plane that carries the validity flag in products with more than
/// `VALIDITY_PLANE` planes.
pub const VALIDITY_PLANE: usize = 7;

/// An auxiliary measurement plane as declared in the file header.
#[derive(Debug, Clone, PartialEq)]
pub struct Backplane {
    /// Plane index in the grid.
    pub index: usize,
    /// Raw name from the header.
    pub name: String,
    /// Raw unit from the header, if any.
    pub unit: Option<String>,
}

/// Which plane holds which quantity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaneLayout {
    pub x: Option<usize>,
    pub y: Option<usize>,
    pub z: Option<usize>,
    /// Every non-coordinate plane, in order of declaration.
    pub backplanes: Vec<Backplane>,
    /// Plane whose non-zero value marks a cell as valid.
    pub validity: Option<usize>,
}

impl PlaneLayout {
    /// Layout with only coordinate planes.
    pub fn xyz(x: usize, y: usize, z: usize) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: Some(z),
            ..Self::default()
        }
    }

    /// Add a backplane.
    pub fn with_backplane(mut self, index: usize, name: impl Into<String>, unit: Option<&str>) -> Self {
        self.backplanes.push(Backplane {
            index,
            name: name.into(),
            unit: unit.map(str::to_string),
        });
        self
    }

    /// Designate the validity plane.
    pub fn with_validity(mut self, index: usize) -> Self {
        self.validity = Some(index);
        self
    }

    /// Coordinate plane indices, checked against the plane count.
    pub(crate) fn coordinate_planes(&self, planes: usize) -> Result<[usize; 3]> {
        let x = self.x.ok_or(GeometryError::MissingPlane('X'))?;
        let y = self.y.ok_or(GeometryError::MissingPlane('Y'))?;
        let z = self.z.ok_or(GeometryError::MissingPlane('Z'))?;

        let declared = [x, y, z]
            .into_iter()
            .chain(self.backplanes.iter().map(|b| b.index))
            .chain(self.validity);
        for index in declared {
            if index >= planes {
                return Err(GeometryError::PlaneOutOfRange { index, planes });
            }
        }
        Ok([x, y, z])
    }
}

/// A `rows x cols` grid with `planes` samples per cell, stored plane-major.
#[derive(Debug, Clone)]
pub struct RawGrid {
    rows: usize,
    cols: usize,
    planes: usize,
    data: Vec<f32>,
    layout: PlaneLayout,
}

impl RawGrid {
    /// Wrap a plane-major sample buffer (`data[p * rows * cols + r * cols + c]`).
    pub fn new(rows: usize, cols: usize, planes: usize, data: Vec<f32>, layout: PlaneLayout) -> Result<Self> {
        // An overflowing shape can never match a real buffer.
        let expected = rows
            .checked_mul(cols)
            .and_then(|cells| cells.checked_mul(planes))
            .unwrap_or(usize::MAX);
        if data.len() != expected {
            return Err(GeometryError::ShapeMismatch {
                rows,
                cols,
                planes,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            rows,
            cols,
            planes,
            data,
            layout,
        })
    }

    /// Build from one `rows * cols` buffer per plane.
    pub fn from_planes(rows: usize, cols: usize, planes: Vec<Vec<f32>>, layout: PlaneLayout) -> Result<Self> {
        let count = planes.len();
        let cells = rows.checked_mul(cols).unwrap_or(usize::MAX);
        let mut data = Vec::with_capacity(planes.iter().map(Vec::len).sum());
        for plane in planes {
            if plane.len() != cells {
                return Err(GeometryError::ShapeMismatch {
                    rows,
                    cols,
                    planes: count,
                    expected: cells.saturating_mul(count),
                    actual: plane.len().saturating_mul(count),
                });
            }
            data.extend(plane);
        }
        Self::new(rows, cols, count, data, layout)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn planes(&self) -> usize {
        self.planes
    }

    pub fn layout(&self) -> &PlaneLayout {
        &self.layout
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Sample of `plane` at (`row`, `col`).
    #[inline]
    pub fn get(&self, plane: usize, row: usize, col: usize) -> f32 {
        self.data[(plane * self.rows + row) * self.cols + col]
    }

    /// Mutable sample access, used to prepare fixtures.
    #[inline]
    pub fn set(&mut self, plane: usize, row: usize, col: usize, value: f32) {
        self.data[(plane * self.rows + row) * self.cols + col] = value;
    }

    /// All samples of one plane in row-major order.
    pub fn plane(&self, plane: usize) -> &[f32] {
        let len = self.rows * self.cols;
        &self.data[plane * len..(plane + 1) * len]
    }
}
