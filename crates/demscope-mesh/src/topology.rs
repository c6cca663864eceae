//! Edge adjacency, boundary extraction and vertex normals.

use crate::mesh::BoundaryMesh;
use nalgebra::{Point3, Vector3};
use std::collections::HashMap;

/// Edge to face-count map for a triangle list.
///
/// Edges are stored with the smaller vertex index first.
#[derive(Debug, Clone)]
pub struct EdgeAdjacency {
    edge_faces: HashMap<(u32, u32), u32>,
}

impl EdgeAdjacency {
    pub fn build(triangles: &[[u32; 3]]) -> Self {
        let mut edge_faces: HashMap<(u32, u32), u32> = HashMap::with_capacity(triangles.len() * 2);
        for tri in triangles {
            for edge in triangle_edges(tri) {
                *edge_faces.entry(edge).or_default() += 1;
            }
        }
        Self { edge_faces }
    }

    /// Number of faces sharing the edge `(a, b)`.
    pub fn face_count(&self, a: u32, b: u32) -> u32 {
        self.edge_faces.get(&normalize_edge(a, b)).copied().unwrap_or(0)
    }

    pub fn is_boundary(&self, a: u32, b: u32) -> bool {
        self.face_count(a, b) == 1
    }

    pub fn boundary_edge_count(&self) -> usize {
        self.edge_faces.values().filter(|&&n| n == 1).count()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_faces.len()
    }
}

fn normalize_edge(a: u32, b: u32) -> (u32, u32) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

fn triangle_edges(tri: &[u32; 3]) -> [(u32, u32); 3] {
    [
        normalize_edge(tri[0], tri[1]),
        normalize_edge(tri[1], tri[2]),
        normalize_edge(tri[2], tri[0]),
    ]
}

/// Extract the edges that belong to exactly one triangle.
///
/// The result references its own compacted point list and carries no scalar
/// data. Segment order follows triangle order so the output is deterministic.
pub fn extract_boundary(positions: &[Point3<f32>], triangles: &[[u32; 3]]) -> BoundaryMesh {
    let adjacency = EdgeAdjacency::build(triangles);

    let mut remap: HashMap<u32, u32> = HashMap::new();
    let mut boundary = BoundaryMesh::default();

    for tri in triangles {
        let directed = [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])];
        for (a, b) in directed {
            if !adjacency.is_boundary(a, b) {
                continue;
            }
            let mut local = |v: u32| {
                *remap.entry(v).or_insert_with(|| {
                    boundary.points.push(positions[v as usize]);
                    (boundary.points.len() - 1) as u32
                })
            };
            let la = local(a);
            let lb = local(b);
            boundary.segments.push([la, lb]);
        }
    }

    boundary
}

/// Per-vertex normals: the normalized sum of the unit normals of every
/// incident triangle. Degenerate triangles contribute nothing and vertices
/// with no usable triangle get a zero vector.
pub fn vertex_normals(positions: &[Point3<f32>], triangles: &[[u32; 3]], flip: bool) -> Vec<Vector3<f32>> {
    let mut sums = vec![Vector3::zeros(); positions.len()];

    for tri in triangles {
        let a = positions[tri[0] as usize];
        let b = positions[tri[1] as usize];
        let c = positions[tri[2] as usize];
        let Some(face) = (b - a).cross(&(c - a)).try_normalize(f32::EPSILON) else {
            continue;
        };
        for &v in tri {
            sums[v as usize] += face;
        }
    }

    let sign = if flip { -1.0 } else { 1.0 };
    sums.into_iter()
        .map(|n| n.try_normalize(f32::EPSILON).map_or_else(Vector3::zeros, |n| n * sign))
        .collect()
}

/// Center of the axis-aligned bounding box of `positions`.
pub fn bounds_center(positions: &[Point3<f32>]) -> Option<Point3<f32>> {
    let first = positions.first()?;
    let (min, max) = positions.iter().fold((first.coords, first.coords), |(min, max), p| {
        (min.inf(&p.coords), max.sup(&p.coords))
    });
    Some(Point3::from((min + max) * 0.5))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quad() -> (Vec<Point3<f32>>, Vec<[u32; 3]>) {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        (positions, vec![[0, 1, 2], [1, 3, 2]])
    }

    #[test]
    fn test_quad_boundary() {
        let (positions, triangles) = quad();
        let adj = EdgeAdjacency::build(&triangles);
        assert_eq!(adj.edge_count(), 5);
        assert_eq!(adj.boundary_edge_count(), 4);
        assert!(!adj.is_boundary(1, 2));

        let boundary = extract_boundary(&positions, &triangles);
        assert_eq!(boundary.segments.len(), 4);
        assert_eq!(boundary.points.len(), 4);
    }

    #[test]
    fn test_normals_flip() {
        let (positions, triangles) = quad();
        let up = vertex_normals(&positions, &triangles, false);
        let down = vertex_normals(&positions, &triangles, true);
        for (u, d) in up.iter().zip(&down) {
            assert_relative_eq!(u.z, 1.0);
            assert_relative_eq!(d.z, -1.0);
        }
    }

    #[test]
    fn test_isolated_vertex_gets_zero_normal() {
        let (mut positions, triangles) = quad();
        positions.push(Point3::new(5.0, 5.0, 5.0));
        let normals = vertex_normals(&positions, &triangles, false);
        assert_eq!(normals[4], Vector3::zeros());
    }

    #[test]
    fn test_bounds_center() {
        let (positions, _) = quad();
        let center = bounds_center(&positions).unwrap();
        assert_relative_eq!(center, Point3::new(0.5, 0.5, 0.0));
        assert!(bounds_center(&[]).is_none());
    }
}
