//! Structured grid triangulation.

use crate::error::GeometryError;
use crate::feature::{FeatureChannel, FeatureData};
use crate::grid::{RawGrid, INVALID_VALUE};
use crate::mesh::{DemMesh, SurfaceMesh};
use crate::topology::{bounds_center, extract_boundary, vertex_normals};
use crate::Result;
use demscope_common::ViewMode;
use nalgebra::Point3;
use tracing::debug;

/// Observer for long-running work such as mesh builds and downloads.
pub trait ProgressMonitor {
    /// Polled between units of work. Returning `true` stops the work.
    fn is_cancelled(&self) -> bool;

    /// Fraction of work done, in `[0, 1]`.
    fn progress(&mut self, fraction: f64);
}

/// Monitor that never cancels and discards progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMonitor;

impl ProgressMonitor for NoopMonitor {
    fn is_cancelled(&self) -> bool {
        false
    }

    fn progress(&mut self, _fraction: f64) {}
}

/// Converts a [`RawGrid`] into a [`DemMesh`].
///
/// A cell becomes a vertex when its X, Y, Z and every backplane sample differ
/// from the invalid sentinel, and (under [`ViewMode::ValidOnly`]) its validity
/// sample is non-zero. Each 2x2 window of cells yields up to two triangles
/// with a fixed winding.
///
/// [`ViewMode::Plain`] builds geometry only: backplanes are neither checked
/// nor carried as features.
#[derive(Debug, Clone, Copy)]
pub struct GridMeshBuilder {
    invalid_value: f32,
}

impl Default for GridMeshBuilder {
    fn default() -> Self {
        Self::new(INVALID_VALUE)
    }
}

impl GridMeshBuilder {
    pub fn new(invalid_value: f32) -> Self {
        Self { invalid_value }
    }

    pub fn invalid_value(&self) -> f32 {
        self.invalid_value
    }

    /// Build without progress reporting or cancellation.
    pub fn build(&self, grid: &RawGrid, mode: ViewMode) -> Result<DemMesh> {
        self.build_monitored(grid, mode, &mut NoopMonitor)
    }

    /// Build, reporting progress (first pass 0..0.5, second pass 0.5..1) and
    /// polling for cancellation between rows.
    ///
    /// Returns [`GeometryError::Cancelled`] once the monitor reports
    /// cancellation.
    pub fn build_monitored(&self, grid: &RawGrid, mode: ViewMode, monitor: &mut dyn ProgressMonitor) -> Result<DemMesh> {
        let layout = grid.layout();
        let [xi, yi, zi] = layout.coordinate_planes(grid.planes())?;
        let (rows, cols) = (grid.rows(), grid.cols());

        let backplanes: &[_] = if mode == ViewMode::Plain {
            &[]
        } else {
            &layout.backplanes[..]
        };
        let validity = match mode {
            ViewMode::ValidOnly => layout.validity,
            _ => None,
        };
        let channels: Vec<FeatureChannel> = backplanes
            .iter()
            .map(|b| FeatureChannel::normalized(&b.name, b.unit.as_deref()))
            .collect();

        // First pass: admit cells and assign dense vertex indices.
        let mut indices: Vec<Option<u32>> = vec![None; rows * cols];
        let mut positions: Vec<Point3<f32>> = Vec::new();
        let mut values: Vec<Vec<f32>> = vec![Vec::new(); channels.len()];

        for r in 0..rows {
            if monitor.is_cancelled() {
                return Err(GeometryError::Cancelled);
            }
            monitor.progress(r as f64 / rows as f64 * 0.5);

            for c in 0..cols {
                let (x, y, z) = (grid.get(xi, r, c), grid.get(yi, r, c), grid.get(zi, r, c));
                let admitted = self.is_defined(x)
                    && self.is_defined(y)
                    && self.is_defined(z)
                    && backplanes.iter().all(|b| self.is_defined(grid.get(b.index, r, c)))
                    && validity.map_or(true, |v| grid.get(v, r, c) != 0.0);
                if !admitted {
                    continue;
                }

                indices[r * cols + c] = Some(positions.len() as u32);
                positions.push(Point3::new(x, y, z));
                for ((plane, channel), out) in backplanes.iter().zip(&channels).zip(values.iter_mut()) {
                    out.push(grid.get(plane.index, r, c) * channel.scale);
                }
            }
        }

        if positions.is_empty() {
            return Err(GeometryError::NoAdmittedVertices { mode });
        }

        // Second pass: two triangles per fully admitted half-window.
        let mut triangles: Vec<[u32; 3]> = Vec::new();
        for r in 1..rows {
            if monitor.is_cancelled() {
                return Err(GeometryError::Cancelled);
            }
            monitor.progress(r as f64 / rows as f64 * 0.5 + 0.5);

            for c in 1..cols {
                let i0 = indices[(r - 1) * cols + (c - 1)];
                let i1 = indices[r * cols + (c - 1)];
                let i2 = indices[(r - 1) * cols + c];
                let i3 = indices[r * cols + c];

                if let (Some(i0), Some(i2), Some(i1)) = (i0, i2, i1) {
                    triangles.push([i0, i2, i1]);
                }
                if let (Some(i2), Some(i3), Some(i1)) = (i2, i3, i1) {
                    triangles.push([i2, i3, i1]);
                }
            }
        }

        if monitor.is_cancelled() {
            return Err(GeometryError::Cancelled);
        }

        let normals = vertex_normals(&positions, &triangles, true);
        let boundary = extract_boundary(&positions, &triangles);
        let features = channels
            .into_iter()
            .zip(values)
            .map(|(channel, per_vertex)| FeatureData::from_vertices(channel, per_vertex, &triangles))
            .collect();

        let center = match indices[(rows / 2) * cols + cols / 2] {
            Some(idx) => positions[idx as usize],
            None => bounds_center(&positions).unwrap_or_else(Point3::origin),
        };

        debug!(
            rows,
            cols,
            %mode,
            vertices = positions.len(),
            triangles = triangles.len(),
            boundary_segments = boundary.segments.len(),
            "Built DEM mesh"
        );
        monitor.progress(1.0);

        Ok(DemMesh {
            interior: SurfaceMesh {
                positions,
                triangles,
                normals,
            },
            boundary,
            center,
            features,
            mode,
        })
    }

    #[inline]
    fn is_defined(&self, value: f32) -> bool {
        value != self.invalid_value
    }
}
