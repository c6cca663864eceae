//! Wavefront OBJ shape models.

use crate::error::ParseError;
use crate::Result;
use demscope_mesh::DemMesh;
use nalgebra::Point3;

/// Parse an OBJ document into a plain [`DemMesh`].
///
/// `v` and `f` records are read; polygons are fan-triangulated and the
/// `a/b/c` index forms and negative (relative) indices are accepted. Every
/// other record is ignored.
pub fn parse_obj(text: &str) -> Result<DemMesh> {
    let mut positions = Vec::new();
    let mut triangles: Vec<[u32; 3]> = Vec::new();

    for (number, line) in text.lines().enumerate() {
        let line_no = number + 1;
        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("v") => {
                let mut coord = [0.0f32; 3];
                for slot in coord.iter_mut() {
                    let field = fields.next().ok_or_else(|| invalid(line_no, "vertex needs three coordinates"))?;
                    *slot = field
                        .parse()
                        .map_err(|_| invalid(line_no, &format!("bad coordinate '{field}'")))?;
                }
                positions.push(Point3::from(coord));
            }
            Some("f") => {
                let corners = fields
                    .map(|field| resolve_index(field, positions.len(), line_no))
                    .collect::<Result<Vec<u32>>>()?;
                if corners.len() < 3 {
                    return Err(invalid(line_no, "face needs at least three vertices"));
                }
                for i in 1..corners.len() - 1 {
                    triangles.push([corners[0], corners[i], corners[i + 1]]);
                }
            }
            _ => {}
        }
    }

    Ok(DemMesh::from_triangles(positions, triangles)?)
}

fn resolve_index(field: &str, vertex_count: usize, line: usize) -> Result<u32> {
    let raw = field.split('/').next().unwrap_or_default();
    let index: i64 = raw
        .parse()
        .map_err(|_| invalid(line, &format!("bad face index '{field}'")))?;

    let resolved = match index {
        0 => None,
        i if i > 0 => Some(i - 1),
        i => Some(vertex_count as i64 + i),
    };
    resolved
        .filter(|&i| i >= 0 && (i as usize) < vertex_count)
        .map(|i| i as u32)
        .ok_or_else(|| invalid(line, &format!("face index {index} out of range")))
}

fn invalid(line: usize, reason: &str) -> ParseError {
    ParseError::InvalidObj {
        line,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use demscope_common::ViewMode;
    use demscope_mesh::GeometryError;

    const SQUARE: &str = "\
# unit square
o square
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vn 0 0 1
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    #[test]
    fn test_quad_is_fan_triangulated() {
        let mesh = parse_obj(SQUARE).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.interior.triangles, vec![[0, 1, 2], [0, 2, 3]]);
        assert_eq!(mesh.boundary.segments.len(), 4);
        assert_eq!(mesh.mode, ViewMode::Plain);
        assert!(mesh.features.is_empty());
    }

    #[test]
    fn test_negative_indices() {
        let mesh = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n").unwrap();
        assert_eq!(mesh.interior.triangles, vec![[0, 1, 2]]);
    }

    #[test]
    fn test_empty_obj_fails() {
        let err = parse_obj("# nothing here\n").unwrap_err();
        assert!(matches!(err, ParseError::Geometry(GeometryError::EmptyMesh)));
    }

    #[test]
    fn test_bad_records() {
        assert!(matches!(
            parse_obj("v 0 0\n").unwrap_err(),
            ParseError::InvalidObj { line: 1, .. }
        ));
        assert!(matches!(
            parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 9\n").unwrap_err(),
            ParseError::InvalidObj { line: 4, .. }
        ));
        assert!(matches!(
            parse_obj("v 0 0 0\nv 1 0 0\nf 1 2\n").unwrap_err(),
            ParseError::InvalidObj { line: 3, .. }
        ));
    }
}
