//! # demscope-mesh
//!
//! Turns structured DEM grids into triangulated surface meshes.
//!
//! ## Overview
//!
//! A DEM product stores a `rows x cols` grid with several planes per cell: the
//! X, Y and Z body-fixed coordinates plus any number of *backplanes* (slope,
//! geopotential height, albedo, ...). Undefined samples hold the sentinel
//! [`INVALID_VALUE`]. Products with more than eight planes carry a validity
//! flag in plane [`VALIDITY_PLANE`].
//!
//! [`GridMeshBuilder`] admits the defined cells as vertices, stitches each
//! 2x2 window into up to two triangles, computes vertex normals and the
//! boundary polyline, and resamples every backplane onto both vertices and
//! triangles as a [`FeatureData`].
//!
//! ## Example
//!
//! ```
//! use demscope_common::ViewMode;
//! use demscope_mesh::{GridMeshBuilder, PlaneLayout, RawGrid};
//!
//! // A flat 3x3 patch: plane 0 = X, plane 1 = Y, plane 2 = Z.
//! let xs = vec![0.0, 1.0, 2.0, 0.0, 1.0, 2.0, 0.0, 1.0, 2.0];
//! let ys = vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0];
//! let zs = vec![0.0; 9];
//! let grid = RawGrid::from_planes(3, 3, vec![xs, ys, zs], PlaneLayout::xyz(0, 1, 2))?;
//!
//! let mesh = GridMeshBuilder::default().build(&grid, ViewMode::IncludingInvalid)?;
//! assert_eq!(mesh.vertex_count(), 9);
//! assert_eq!(mesh.triangle_count(), 8);
//! # Ok::<(), demscope_mesh::GeometryError>(())
//! ```

mod builder;
mod error;
mod feature;
mod grid;
mod mesh;
mod topology;

pub use builder::{ProgressMonitor, GridMeshBuilder, NoopMonitor};
pub use error::GeometryError;
pub use feature::{FeatureChannel, FeatureData};
pub use grid::{Backplane, PlaneLayout, RawGrid, INVALID_VALUE, VALIDITY_PLANE};
pub use mesh::{BoundaryMesh, DemMesh, SurfaceMesh};
pub use topology::{bounds_center, extract_boundary, vertex_normals, EdgeAdjacency};

/// Result type for mesh operations.
pub type Result<T> = std::result::Result<T, GeometryError>;
