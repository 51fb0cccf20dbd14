//! Wavefront OBJ support.
//!
//! Only geometry is read: `v` and `f` records. Texture coordinates, normals,
//! groups and materials are ignored. Face tokens may be `i`, `i/t`, `i//n` or
//! `i/t/n`, and negative indices count back from the last vertex.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;

use crate::error::{MeshError, Result};
use crate::mesh::{build_from_polygons, to_face_vertex, HalfEdgeMesh, MeshIndex};

/// Load a mesh from an OBJ file.
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    parse(&text, path)
}

/// Parse OBJ text.
pub fn parse<I: MeshIndex>(text: &str, path: &Path) -> Result<HalfEdgeMesh<I>> {
    let mut vertices: Vec<Point3<f64>> = Vec::new();
    let mut faces: Vec<Vec<usize>> = Vec::new();

    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        let mut tokens = raw.split_whitespace();
        match tokens.next() {
            Some("v") => {
                let mut xyz = [0.0; 3];
                for c in &mut xyz {
                    let token = tokens
                        .next()
                        .ok_or_else(|| MeshError::parse(path, line, "vertex needs three coordinates"))?;
                    *c = token.parse().map_err(|_| {
                        MeshError::parse(path, line, format!("invalid coordinate '{}'", token))
                    })?;
                }
                vertices.push(Point3::from(xyz));
            }
            Some("f") => {
                let face = tokens
                    .map(|t| vertex_index(t, vertices.len(), path, line))
                    .collect::<Result<Vec<_>>>()?;
                faces.push(face);
            }
            _ => {}
        }
    }

    build_from_polygons(&vertices, &faces)
}

/// Zero-based vertex index of a face token such as `7`, `7/2/3` or `-1//4`.
fn vertex_index(token: &str, num_vertices: usize, path: &Path, line: usize) -> Result<usize> {
    let head = token.split('/').next().unwrap_or(token);
    let index: i64 = head
        .parse()
        .map_err(|_| MeshError::parse(path, line, format!("invalid face index '{}'", token)))?;

    let resolved = match index {
        0 => None,
        i if i > 0 => Some(i as usize - 1),
        i => num_vertices.checked_sub(i.unsigned_abs() as usize),
    };
    resolved.ok_or_else(|| MeshError::parse(path, line, format!("face index {} out of range", index)))
}

/// Save a mesh as an OBJ file.
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    let (vertices, faces) = to_face_vertex(mesh);

    writeln!(writer, "# quadsnap")?;
    for v in &vertices {
        writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?;
    }
    for f in &faces {
        write!(writer, "f")?;
        for i in f {
            write!(writer, " {}", i + 1)?;
        }
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}
