//! Mesh artifacts produced by a DEM load.

use crate::error::GeometryError;
use crate::feature::FeatureData;
use crate::topology::{bounds_center, extract_boundary, vertex_normals};
use crate::Result;
use demscope_common::ViewMode;
use nalgebra::{Point3, Vector3};

/// Interior triangle surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceMesh {
    pub positions: Vec<Point3<f32>>,
    pub triangles: Vec<[u32; 3]>,
    /// One unit normal per position.
    pub normals: Vec<Vector3<f32>>,
}

/// Boundary polyline of a surface. Carries no scalar data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundaryMesh {
    pub points: Vec<Point3<f32>>,
    pub segments: Vec<[u32; 2]>,
}

/// Everything a renderer or analysis tool needs from one loaded DEM.
#[derive(Debug, Clone, PartialEq)]
pub struct DemMesh {
    pub interior: SurfaceMesh,
    pub boundary: BoundaryMesh,
    pub center: Point3<f32>,
    pub features: Vec<FeatureData>,
    /// Validity policy the mesh was built under.
    pub mode: ViewMode,
}

impl DemMesh {
    /// Plain mesh from an arbitrary triangle soup (e.g. an OBJ shape model).
    ///
    /// No feature channels, center at the bounding box center.
    pub fn from_triangles(positions: Vec<Point3<f32>>, triangles: Vec<[u32; 3]>) -> Result<Self> {
        let center = bounds_center(&positions).ok_or(GeometryError::EmptyMesh)?;
        let count = positions.len();
        for (triangle, tri) in triangles.iter().enumerate() {
            if let Some(&vertex) = tri.iter().find(|&&v| v as usize >= count) {
                return Err(GeometryError::IndexOutOfRange { triangle, vertex, count });
            }
        }

        let normals = vertex_normals(&positions, &triangles, false);
        let boundary = extract_boundary(&positions, &triangles);
        Ok(Self {
            interior: SurfaceMesh {
                positions,
                triangles,
                normals,
            },
            boundary,
            center,
            features: Vec::new(),
            mode: ViewMode::Plain,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.interior.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.interior.triangles.len()
    }

    /// Feature channel by (normalized) name.
    pub fn feature(&self, name: &str) -> Option<&FeatureData> {
        self.features.iter().find(|f| f.channel.name == name)
    }

    /// True when every value array matches the vertex and triangle counts.
    pub fn is_consistent(&self) -> bool {
        let vertices = self.vertex_count();
        let triangles = self.triangle_count();
        self.interior.normals.len() == vertices
            && self
                .features
                .iter()
                .all(|f| f.per_vertex.len() == vertices && f.per_triangle.len() == triangles)
    }
}
