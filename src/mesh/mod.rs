//! Core mesh data structures.
//!
//! This module provides the half-edge mesh representation used for both the
//! reference triangle surface and the target quad mesh.
//!
//! # Overview
//!
//! The primary type is [`HalfEdgeMesh`], a polygon mesh stored as a half-edge
//! (doubly-connected edge list). On top of the raw connectivity it carries
//! two layers of derived state:
//!
//! - [`BoundaryInfo`] from [`HalfEdgeMesh::extract_boundary`]
//! - [`SurfaceLabels`] from [`crate::algo::label::label_surface`]
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe index wrappers:
//! - [`VertexId`] - Identifies a vertex
//! - [`HalfEdgeId`] - Identifies a half-edge
//! - [`EdgeId`] - Identifies an undirected edge
//! - [`FaceId`] - Identifies a face
//!
//! # Construction
//!
//! ```
//! use quadsnap::mesh::{HalfEdgeMesh, build_from_quads};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2, 3]];
//!
//! let mut mesh: HalfEdgeMesh = build_from_quads(&vertices, &faces).unwrap();
//! assert_eq!(mesh.extract_boundary(), 4);
//! ```

mod builder;
mod halfedge;
mod index;
mod labels;

pub use builder::{
    build_from_polygons, build_from_quads, build_from_triangles, to_face_vertex,
    triangulate_faces,
};
pub use halfedge::{
    Edge, Face, FaceHalfEdgeIter, HalfEdge, HalfEdgeMesh, Vertex, VertexHalfEdgeIter,
};
pub use index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};
pub use labels::{BoundaryInfo, SurfaceLabels, VertexLabel};
