//! OFF (Object File Format) support.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;

use crate::error::{MeshError, Result};
use crate::mesh::{build_from_polygons, to_face_vertex, HalfEdgeMesh, MeshIndex};

/// Load a mesh from an OFF file.
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    parse(&text, path)
}

/// Parse OFF text. Face lines may carry trailing color values.
pub fn parse<I: MeshIndex>(text: &str, path: &Path) -> Result<HalfEdgeMesh<I>> {
    // Non-empty lines with comments removed, keeping 1-based line numbers
    let mut lines = text.lines().enumerate().filter_map(|(i, l)| {
        let content = l.split('#').next().unwrap_or("").trim();
        (!content.is_empty()).then_some((i + 1, content))
    });

    let (line, header) = lines
        .next()
        .ok_or_else(|| MeshError::parse(path, 1, "empty file"))?;
    let mut counts_text = match header.strip_prefix("OFF") {
        Some(rest) => rest.trim().to_string(),
        None => return Err(MeshError::parse(path, line, "missing OFF header")),
    };
    let mut counts_line = line;
    if counts_text.is_empty() {
        let (l, text) = lines
            .next()
            .ok_or_else(|| MeshError::parse(path, line, "missing vertex and face counts"))?;
        counts_text = text.to_string();
        counts_line = l;
    }

    let counts = numbers::<usize>(&counts_text, path, counts_line)?;
    if counts.len() < 2 {
        return Err(MeshError::parse(path, counts_line, "expected vertex and face counts"));
    }
    let (nv, nf) = (counts[0], counts[1]);
    // Each vertex and face takes a line of its own
    let available = text.lines().count();

    let mut vertices = Vec::with_capacity(nv.min(available));
    for _ in 0..nv {
        let (l, text) = lines
            .next()
            .ok_or_else(|| MeshError::parse(path, counts_line, "unexpected end of vertex list"))?;
        let xyz = numbers::<f64>(text, path, l)?;
        if xyz.len() < 3 {
            return Err(MeshError::parse(path, l, "vertex needs three coordinates"));
        }
        vertices.push(Point3::new(xyz[0], xyz[1], xyz[2]));
    }

    let mut faces = Vec::with_capacity(nf.min(available));
    for _ in 0..nf {
        let (l, text) = lines
            .next()
            .ok_or_else(|| MeshError::parse(path, counts_line, "unexpected end of face list"))?;
        let mut tokens = text.split_whitespace();
        let k: usize = parse_token(tokens.next(), path, l)?;
        let face = (0..k)
            .map(|_| parse_token(tokens.next(), path, l))
            .collect::<Result<Vec<usize>>>()?;
        faces.push(face);
    }

    build_from_polygons(&vertices, &faces)
}

fn numbers<T: std::str::FromStr>(text: &str, path: &Path, line: usize) -> Result<Vec<T>> {
    text.split_whitespace()
        .map(|t| parse_token(Some(t), path, line))
        .collect()
}

fn parse_token<T: std::str::FromStr>(token: Option<&str>, path: &Path, line: usize) -> Result<T> {
    let token = token.ok_or_else(|| MeshError::parse(path, line, "line ends early"))?;
    token
        .parse()
        .map_err(|_| MeshError::parse(path, line, format!("invalid number '{}'", token)))
}

/// Save a mesh as an OFF file.
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    let (vertices, faces) = to_face_vertex(mesh);
    let num_edges = mesh.num_edges();

    writeln!(writer, "OFF")?;
    writeln!(writer, "{} {} {}", vertices.len(), faces.len(), num_edges)?;
    for v in &vertices {
        writeln!(writer, "{} {} {}", v.x, v.y, v.z)?;
    }
    for f in &faces {
        write!(writer, "{}", f.len())?;
        for i in f {
            write!(writer, " {}", i)?;
        }
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}
