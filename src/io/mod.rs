//! Mesh file I/O.
//!
//! # Supported Formats
//!
//! | Format | Extension | Load | Save | Notes |
//! |--------|-----------|------|------|-------|
//! | Legacy VTK | `.vtk` | ✓ | ✓ | ASCII; volume cells load as their boundary |
//! | OFF | `.off` | ✓ | ✓ | Polygon faces |
//! | Wavefront OBJ | `.obj` | ✓ | ✓ | Geometry only |
//! | PLY | `.ply` | ✓ | ✓ | Reads ASCII and binary, writes ASCII |
//! | STL | `.stl` | ✓ | ✓ | Triangles only; polygons are split on save |
//!
//! # Usage
//!
//! ```no_run
//! use quadsnap::io::{load, save};
//! use quadsnap::mesh::HalfEdgeMesh;
//!
//! let mesh: HalfEdgeMesh = load("quad.vtk").unwrap();
//! save(&mesh, "quad.off").unwrap();
//! ```

pub mod obj;
pub mod off;
pub mod ply;
pub mod stl;
pub mod vtk;

use std::path::Path;

use crate::error::{MeshError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex};

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Legacy VTK.
    Vtk,
    /// Object File Format.
    Off,
    /// Wavefront OBJ.
    Obj,
    /// Stanford polygon format.
    Ply,
    /// Stereolithography.
    Stl,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "vtk" => Some(Format::Vtk),
            "off" => Some(Format::Off),
            "obj" => Some(Format::Obj),
            "ply" => Some(Format::Ply),
            "stl" => Some(Format::Stl),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }

    /// Canonical extension.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Vtk => "vtk",
            Format::Off => "off",
            Format::Obj => "obj",
            Format::Ply => "ply",
            Format::Stl => "stl",
        }
    }
}

fn detect(path: &Path) -> Result<Format> {
    Format::from_path(path).ok_or_else(|| MeshError::UnsupportedFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })
}

/// Load a mesh, choosing the reader from the file extension.
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    let mesh = match detect(path)? {
        Format::Vtk => vtk::load(path),
        Format::Off => off::load(path),
        Format::Obj => obj::load(path),
        Format::Ply => ply::load(path),
        Format::Stl => stl::load(path),
    }?;
    log::info!(
        "loaded {}: {} vertices, {} faces",
        path.display(),
        mesh.num_vertices(),
        mesh.num_faces()
    );
    Ok(mesh)
}

/// Save a mesh, choosing the writer from the file extension.
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Vtk => vtk::save(mesh, path),
        Format::Off => off::save(mesh, path),
        Format::Obj => obj::save(mesh, path),
        Format::Ply => ply::save(mesh, path),
        Format::Stl => stl::save(mesh, path),
    }?;
    log::info!(
        "saved {}: {} vertices, {} faces",
        path.display(),
        mesh.num_vertices(),
        mesh.num_faces()
    );
    Ok(())
}

/// Write the faces-only VTK side file, whatever the primary output format.
pub fn save_faces_vtk<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    vtk::save_faces(mesh, path)?;
    log::info!("saved faces to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_quads;
    use nalgebra::Point3;

    #[test]
    fn test_format_detection() {
        assert_eq!(Format::from_path("a/quad.VTK"), Some(Format::Vtk));
        assert_eq!(Format::from_path("tri.off"), Some(Format::Off));
        assert_eq!(Format::from_path("mesh.gltf"), None);
        assert_eq!(Format::from_path("noext"), None);
        assert_eq!(Format::Ply.extension(), "ply");
    }

    #[test]
    fn test_unsupported_extension() {
        let result = load::<_, u32>("mesh.gltf");
        assert!(matches!(
            result,
            Err(MeshError::UnsupportedFormat { extension }) if extension == "gltf"
        ));
    }

    #[test]
    fn test_convert_between_formats() {
        let dir = tempfile::tempdir().unwrap();
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh: HalfEdgeMesh = build_from_quads(&vertices, &[[0, 1, 2, 3]]).unwrap();

        let mut previous = mesh.positions();
        for format in [Format::Vtk, Format::Off, Format::Obj, Format::Ply] {
            let path = dir.path().join(format!("quad.{}", format.extension()));
            save(&mesh, &path).unwrap();
            let loaded: HalfEdgeMesh = load(&path).unwrap();
            assert!(loaded.is_quad_mesh(), "{:?}", format);
            assert_eq!(loaded.positions(), previous);
            previous = loaded.positions();
        }
    }
}
