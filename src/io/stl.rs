//! STL (stereolithography) format support.
//!
//! STL only stores triangles. Loading welds coincident corners back into
//! shared vertices; saving fan-triangulates any non-triangular face.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use nalgebra::{Point3, Vector3};

use crate::error::{MeshError, Result};
use crate::mesh::{build_from_triangles, triangulate_faces, HalfEdgeMesh, MeshIndex};

/// Load a mesh from an STL file (binary or ASCII).
///
/// Triangles that collapse after welding are dropped.
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    let mut file = File::open(path)?;

    let stl = stl_io::read_stl(&mut file).map_err(|e| MeshError::parse(path, 0, e.to_string()))?;

    // Weld on exact bit patterns of the f32 coordinates
    let mut index_of: HashMap<[u32; 3], usize> = HashMap::new();
    let mut vertices: Vec<Point3<f64>> = Vec::new();
    let mut weld = |p: &stl_io::Vertex| {
        let key = [p[0].to_bits(), p[1].to_bits(), p[2].to_bits()];
        *index_of.entry(key).or_insert_with(|| {
            vertices.push(Point3::new(p[0] as f64, p[1] as f64, p[2] as f64));
            vertices.len() - 1
        })
    };

    let mut faces: Vec<[usize; 3]> = Vec::with_capacity(stl.faces.len());
    for tri in &stl.faces {
        let [a, b, c] = tri.vertices.map(|i| weld(&stl.vertices[i]));
        if a != b && b != c && a != c {
            faces.push([a, b, c]);
        }
    }

    if faces.is_empty() {
        return Err(MeshError::parse(path, 0, "no valid triangles"));
    }

    build_from_triangles(&vertices, &faces)
}

/// Save a mesh as a binary STL file.
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    let vertices = mesh.positions();

    let triangles: Vec<stl_io::Triangle> = triangulate_faces(mesh)
        .into_iter()
        .map(|(corners, _)| {
            let [p0, p1, p2] = corners.map(|i| vertices[i]);
            let n = (p1 - p0).cross(&(p2 - p0)).try_normalize(0.0).unwrap_or_else(Vector3::zeros);
            let vertex = |p: Point3<f64>| stl_io::Vertex::new([p.x as f32, p.y as f32, p.z as f32]);

            stl_io::Triangle {
                normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [vertex(p0), vertex(p1), vertex(p2)],
            }
        })
        .collect();

    stl_io::write_stl(&mut writer, triangles.iter()).map_err(|e| MeshError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_quads;

    #[test]
    fn test_quads_are_triangulated() {
        let dir = tempfile::tempdir().unwrap();
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh: HalfEdgeMesh = build_from_quads(&vertices, &[[0, 1, 2, 3]]).unwrap();

        let path = dir.path().join("quad.stl");
        save(&mesh, &path).unwrap();
        let loaded: HalfEdgeMesh = load(&path).unwrap();

        assert!(loaded.is_triangle_mesh());
        assert_eq!(loaded.num_faces(), 2);
        assert_eq!(loaded.num_vertices(), 4);
        assert!((loaded.surface_area() - 1.0).abs() < 1e-6);
    }
}
