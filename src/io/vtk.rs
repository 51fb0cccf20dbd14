//! Legacy ASCII VTK support.
//!
//! Reads `POLYDATA` (`POLYGONS`) and `UNSTRUCTURED_GRID` (`CELLS` /
//! `CELL_TYPES`) datasets. Surface cells (triangle, polygon, quad) become
//! faces directly. Tetrahedra and hexahedra contribute the faces that are not
//! shared with another volume cell, so a volume mesh loads as its boundary
//! surface. Other cell types are skipped with a warning.
//!
//! [`save`] writes an `UNSTRUCTURED_GRID`, [`save_faces`] a `POLYDATA` with
//! only the polygons.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use nalgebra::Point3;

use crate::error::{MeshError, Result};
use crate::mesh::{build_from_polygons, to_face_vertex, HalfEdgeMesh, MeshIndex};

const VTK_TRIANGLE: u32 = 5;
const VTK_POLYGON: u32 = 7;
const VTK_QUAD: u32 = 9;
const VTK_TETRA: u32 = 10;
const VTK_HEXAHEDRON: u32 = 12;

/// Outward faces of a VTK tetrahedron.
const TETRA_FACES: [&[usize]; 4] = [&[0, 2, 1], &[0, 1, 3], &[1, 2, 3], &[0, 3, 2]];

/// Outward faces of a VTK hexahedron.
const HEXAHEDRON_FACES: [&[usize]; 6] = [
    &[0, 3, 2, 1],
    &[4, 5, 6, 7],
    &[0, 1, 5, 4],
    &[1, 2, 6, 5],
    &[2, 3, 7, 6],
    &[3, 0, 4, 7],
];

/// Load a mesh from a legacy VTK file.
///
/// ```no_run
/// use quadsnap::io::vtk;
/// use quadsnap::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = vtk::load("quad.vtk").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    parse(&text, path)
}

/// Parse legacy VTK text. `path` is only used in error messages.
pub fn parse<I: MeshIndex>(text: &str, path: &Path) -> Result<HalfEdgeMesh<I>> {
    let mut lines = text.lines();

    match lines.next() {
        Some(l) if l.trim_start().starts_with("# vtk DataFile") => {}
        _ => return Err(MeshError::parse(path, 1, "missing '# vtk DataFile' header")),
    }
    lines.next(); // title
    match lines.next().map(str::trim) {
        Some(enc) if enc.eq_ignore_ascii_case("ASCII") => {}
        Some(enc) => {
            return Err(MeshError::parse(
                path,
                3,
                format!("unsupported encoding '{}', only ASCII is read", enc),
            ))
        }
        None => return Err(MeshError::parse(path, 3, "missing encoding line")),
    }

    let mut tokens = Tokens::new(path, lines, 4);

    let dataset = match tokens.next() {
        Some((_, "DATASET")) => tokens.expect("dataset type")?.1.to_ascii_uppercase(),
        Some((line, other)) => {
            return Err(MeshError::parse(path, line, format!("expected DATASET, found '{}'", other)))
        }
        None => return Err(MeshError::parse(path, 4, "missing DATASET")),
    };
    if dataset != "POLYDATA" && dataset != "UNSTRUCTURED_GRID" {
        return Err(MeshError::parse(
            path,
            tokens.line(),
            format!("unsupported dataset '{}'", dataset),
        ));
    }

    let mut vertices: Vec<Point3<f64>> = Vec::new();
    let mut faces: Vec<Vec<usize>> = Vec::new();
    let mut cells: Vec<Vec<usize>> = Vec::new();
    let mut cell_types: Vec<u32> = Vec::new();

    while let Some((line, keyword)) = tokens.next() {
        match keyword.to_ascii_uppercase().as_str() {
            "POINTS" => {
                let n: usize = tokens.parse("point count")?;
                tokens.expect("point data type")?;
                // Counts come from the file; never reserve past what it holds
                vertices.reserve(n.min(tokens.remaining() / 3));
                for _ in 0..n {
                    let x = tokens.parse("x coordinate")?;
                    let y = tokens.parse("y coordinate")?;
                    let z = tokens.parse("z coordinate")?;
                    vertices.push(Point3::new(x, y, z));
                }
            }
            "POLYGONS" => faces.extend(tokens.cell_block()?),
            "CELLS" => cells = tokens.cell_block()?,
            "CELL_TYPES" => {
                let n: usize = tokens.parse("cell type count")?;
                cell_types = (0..n)
                    .map(|_| tokens.parse("cell type"))
                    .collect::<Result<_>>()?;
            }
            "VERTICES" | "LINES" | "TRIANGLE_STRIPS" => {
                let skipped = tokens.cell_block()?;
                if !skipped.is_empty() {
                    log::warn!("{}: skipping {} {} cells", path.display(), skipped.len(), keyword);
                }
            }
            // Attribute data follows the geometry; nothing after it is needed.
            "POINT_DATA" | "CELL_DATA" | "FIELD" | "METADATA" => break,
            other => {
                return Err(MeshError::parse(path, line, format!("unexpected keyword '{}'", other)))
            }
        }
    }

    if !cells.is_empty() {
        if cell_types.len() != cells.len() {
            return Err(MeshError::parse(
                path,
                tokens.line(),
                format!("{} cells but {} cell types", cells.len(), cell_types.len()),
            ));
        }
        faces.extend(surface_of_cells(&cells, &cell_types, path));
    }

    log::debug!(
        "{}: {} points, {} faces",
        path.display(),
        vertices.len(),
        faces.len()
    );
    build_from_polygons(&vertices, &faces)
}

/// Faces of surface cells plus unshared faces of volume cells.
fn surface_of_cells(cells: &[Vec<usize>], types: &[u32], path: &Path) -> Vec<Vec<usize>> {
    let mut faces = Vec::new();
    let mut volume_faces: Vec<Vec<usize>> = Vec::new();
    let mut skipped: HashMap<u32, usize> = HashMap::new();

    for (cell, &kind) in cells.iter().zip(types) {
        let local: &[&[usize]] = match kind {
            VTK_TRIANGLE | VTK_POLYGON | VTK_QUAD => {
                faces.push(cell.clone());
                continue;
            }
            VTK_TETRA if cell.len() == 4 => &TETRA_FACES,
            VTK_HEXAHEDRON if cell.len() == 8 => &HEXAHEDRON_FACES,
            _ => {
                *skipped.entry(kind).or_default() += 1;
                continue;
            }
        };
        volume_faces.extend(local.iter().map(|f| f.iter().map(|&i| cell[i]).collect()));
    }

    for (kind, count) in skipped {
        log::warn!("{}: skipping {} cells of type {}", path.display(), count, kind);
    }

    let mut uses: HashMap<Vec<usize>, usize> = HashMap::new();
    for face in &volume_faces {
        *uses.entry(sorted(face)).or_default() += 1;
    }
    faces.extend(
        volume_faces
            .into_iter()
            .filter(|face| uses.get(&sorted(face)) == Some(&1)),
    );
    faces
}

fn sorted(face: &[usize]) -> Vec<usize> {
    let mut key = face.to_vec();
    key.sort_unstable();
    key
}

/// Whitespace-separated tokens tagged with their 1-based line number.
struct Tokens<'a> {
    path: &'a Path,
    items: std::vec::IntoIter<(usize, &'a str)>,
    last_line: usize,
}

impl<'a> Tokens<'a> {
    fn new(path: &'a Path, lines: std::str::Lines<'a>, first_line: usize) -> Self {
        let items: Vec<(usize, &str)> = lines
            .enumerate()
            .flat_map(|(i, l)| l.split_whitespace().map(move |t| (i + first_line, t)))
            .collect();
        Self {
            path,
            items: items.into_iter(),
            last_line: first_line,
        }
    }

    fn line(&self) -> usize {
        self.last_line
    }

    fn remaining(&self) -> usize {
        self.items.len()
    }

    fn next(&mut self) -> Option<(usize, &'a str)> {
        let item = self.items.next()?;
        self.last_line = item.0;
        Some(item)
    }

    fn expect(&mut self, what: &str) -> Result<(usize, &'a str)> {
        let line = self.last_line;
        self.next()
            .ok_or_else(|| MeshError::parse(self.path, line, format!("unexpected end of file, expected {}", what)))
    }

    fn parse<T: FromStr>(&mut self, what: &str) -> Result<T> {
        let (line, token) = self.expect(what)?;
        token
            .parse()
            .map_err(|_| MeshError::parse(self.path, line, format!("invalid {} '{}'", what, token)))
    }

    /// `<n> <size>` followed by `n` lists of `<k> i0 .. ik-1`.
    fn cell_block(&mut self) -> Result<Vec<Vec<usize>>> {
        let n: usize = self.parse("cell count")?;
        let size: usize = self.parse("cell list size")?;
        let mut cells = Vec::with_capacity(n.min(self.remaining()));
        let mut read = 0;
        for _ in 0..n {
            let k: usize = self.parse("cell size")?;
            let cell = (0..k)
                .map(|_| self.parse("point index"))
                .collect::<Result<Vec<usize>>>()?;
            read += k + 1;
            cells.push(cell);
        }
        if read != size {
            return Err(MeshError::parse(
                self.path,
                self.last_line,
                format!("cell list size is {} but {} values were read", size, read),
            ));
        }
        Ok(cells)
    }
}

fn cell_type(corners: usize) -> u32 {
    match corners {
        3 => VTK_TRIANGLE,
        4 => VTK_QUAD,
        _ => VTK_POLYGON,
    }
}

fn write_points<W: Write>(writer: &mut W, vertices: &[Point3<f64>]) -> std::io::Result<()> {
    writeln!(writer, "POINTS {} double", vertices.len())?;
    for v in vertices {
        writeln!(writer, "{} {} {}", v.x, v.y, v.z)?;
    }
    Ok(())
}

fn write_cells<W: Write>(writer: &mut W, keyword: &str, faces: &[Vec<usize>]) -> std::io::Result<()> {
    let size: usize = faces.iter().map(|f| f.len() + 1).sum();
    writeln!(writer, "{} {} {}", keyword, faces.len(), size)?;
    for f in faces {
        write!(writer, "{}", f.len())?;
        for i in f {
            write!(writer, " {}", i)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// Save a mesh as a legacy ASCII `UNSTRUCTURED_GRID`.
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    let (vertices, faces) = to_face_vertex(mesh);

    writeln!(writer, "# vtk DataFile Version 2.0")?;
    writeln!(writer, "quadsnap mesh")?;
    writeln!(writer, "ASCII")?;
    writeln!(writer, "DATASET UNSTRUCTURED_GRID")?;
    write_points(&mut writer, &vertices)?;
    write_cells(&mut writer, "CELLS", &faces)?;
    writeln!(writer, "CELL_TYPES {}", faces.len())?;
    for f in &faces {
        writeln!(writer, "{}", cell_type(f.len()))?;
    }

    writer.flush()?;
    Ok(())
}

/// Save only the surface polygons as a legacy ASCII `POLYDATA`.
pub fn save_faces<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    let (vertices, faces) = to_face_vertex(mesh);

    writeln!(writer, "# vtk DataFile Version 2.0")?;
    writeln!(writer, "quadsnap faces")?;
    writeln!(writer, "ASCII")?;
    writeln!(writer, "DATASET POLYDATA")?;
    write_points(&mut writer, &vertices)?;
    write_cells(&mut writer, "POLYGONS", &faces)?;

    writer.flush()?;
    Ok(())
}
