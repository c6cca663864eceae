//! Error types for mesh construction.

use demscope_common::ViewMode;
use thiserror::Error;

/// Errors that can occur while turning a grid (or raw triangles) into a mesh.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// The plane layout does not declare one of the coordinate planes.
    #[error("Grid does not contain a plane for the {0} coordinate")]
    MissingPlane(char),

    /// A declared plane index is beyond the number of planes in the grid.
    #[error("Plane index {index} is out of range (grid has {planes} planes)")]
    PlaneOutOfRange {
        /// Declared plane index.
        index: usize,
        /// Number of planes in the grid.
        planes: usize,
    },

    /// Sample buffer length disagrees with the declared shape.
    #[error("Grid data has {actual} samples but shape {rows}x{cols}x{planes} needs {expected}")]
    ShapeMismatch {
        /// Row count.
        rows: usize,
        /// Column count.
        cols: usize,
        /// Plane count.
        planes: usize,
        /// Samples required by the shape.
        expected: usize,
        /// Samples supplied.
        actual: usize,
    },

    /// Every cell was rejected by the admission rule.
    #[error("No cells admitted under view mode {mode}")]
    NoAdmittedVertices {
        /// Mode the build ran under.
        mode: ViewMode,
    },

    /// A triangle mesh was supplied with no vertices.
    #[error("Mesh contains no vertices")]
    EmptyMesh,

    /// A triangle references a vertex that does not exist.
    #[error("Triangle {triangle} references vertex {vertex} but the mesh has {count} vertices")]
    IndexOutOfRange {
        /// Offending triangle.
        triangle: usize,
        /// Offending vertex index.
        vertex: u32,
        /// Number of vertices.
        count: usize,
    },

    /// The build observed its cancellation flag and stopped.
    #[error("Mesh build was cancelled")]
    Cancelled,
}
