//! # quadsnap
//!
//! Feature-aware smoothing of quad meshes and projection onto a reference
//! triangle surface.
//!
//! A quad mesh extracted from (or fitted to) a triangle surface tends to
//! drift away from it and to carry badly shaped elements. quadsnap repeats a
//! simple loop until both are acceptable:
//!
//! 1. label the quad mesh's boundary and crease vertices,
//! 2. Laplacian-smooth it, letting feature vertices slide only along their
//!    feature curves,
//! 3. project every movable vertex onto the closest point of the reference.
//!
//! ## Features
//!
//! - **Half-edge polygon mesh**: triangles, quads and mixed meshes with O(1)
//!   adjacency queries and type-safe indices
//! - **Feature labels**: boundary and dihedral-angle creases classified into
//!   interior, regular, sharp and corner vertices
//! - **Parallel passes**: smoothing and projection run on rayon with
//!   Jacobi-style updates, so results do not depend on thread count
//! - **File formats**: legacy VTK, OFF, OBJ, PLY, STL
//!
//! ## Quick Start
//!
//! ```no_run
//! use quadsnap::prelude::*;
//!
//! let reference: HalfEdgeMesh = quadsnap::io::load("tri.vtk").unwrap();
//! let reference = ReferenceSurface::new(reference, DEFAULT_COS_ANGLE).unwrap();
//!
//! let mut quads: HalfEdgeMesh = quadsnap::io::load("quad.vtk").unwrap();
//! let options = DriverOptions::default().with_iterations(5);
//! ProjectionDriver::new(&reference, options).run(&mut quads).unwrap();
//!
//! quadsnap::io::save(&quads, "out.vtk").unwrap();
//! ```
//!
//! ## Building Meshes Programmatically
//!
//! ```
//! use quadsnap::prelude::*;
//! use nalgebra::Point3;
//!
//! let mut vertices = Vec::new();
//! for j in 0..3 {
//!     for i in 0..3 {
//!         vertices.push(Point3::new(i as f64, j as f64, 0.0));
//!     }
//! }
//! let faces = vec![[0, 1, 4, 3], [1, 2, 5, 4], [3, 4, 7, 6], [4, 5, 8, 7]];
//!
//! let mut mesh: HalfEdgeMesh = build_from_quads(&vertices, &faces).unwrap();
//! assert_eq!(mesh.num_edges(), 12);
//!
//! mesh.extract_boundary();
//! let summary = label_surface(&mut mesh, &LabelOptions::default()).unwrap();
//! assert_eq!(summary.interior, 1);
//! assert_eq!(mesh.label(VertexId::new(4)), VertexLabel::Interior);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod config;
pub mod error;
pub mod io;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// ```
/// use quadsnap::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::driver::{DriverOptions, ProjectionDriver};
    pub use crate::algo::label::{
        label_surface, FeaturePolicy, LabelOptions, VertexRole, DEFAULT_COS_ANGLE,
    };
    pub use crate::algo::project::ReferenceSurface;
    pub use crate::algo::smooth::{smooth_surface, SmoothOptions};
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        build_from_polygons, build_from_quads, build_from_triangles, to_face_vertex, EdgeId,
        FaceId, HalfEdgeId, HalfEdgeMesh, MeshIndex, VertexId, VertexLabel,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;
