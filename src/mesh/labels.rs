//! Per-element classification attached to a mesh.
//!
//! [`BoundaryInfo`] is topological and produced by
//! [`HalfEdgeMesh::extract_boundary`](super::HalfEdgeMesh::extract_boundary).
//! [`SurfaceLabels`] depend on geometry and a cosine threshold; they are
//! produced by [`crate::algo::label`] and must be cleared before every relabel.

use super::index::{EdgeId, MeshIndex, VertexId};

/// Classification of a vertex with respect to boundary and feature curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VertexLabel {
    /// Not on any boundary or feature curve (or not yet labeled).
    #[default]
    Interior,
    /// Topological corner: feature degree other than two.
    Corner,
    /// On a feature curve that turns sharper than the threshold here.
    SharpFeature,
    /// On a feature curve that is locally smooth.
    Regular,
}

impl VertexLabel {
    /// Short lowercase name, used in logs and `info` output.
    pub fn name(self) -> &'static str {
        match self {
            VertexLabel::Interior => "interior",
            VertexLabel::Corner => "corner",
            VertexLabel::SharpFeature => "sharp",
            VertexLabel::Regular => "regular",
        }
    }
}

/// Boundary flags of a mesh, valid for the connectivity they were built from.
#[derive(Debug, Clone, Default)]
pub struct BoundaryInfo {
    pub(crate) vertices: Vec<bool>,
    pub(crate) edges: Vec<bool>,
    pub(crate) loops: Vec<Vec<usize>>,
}

impl BoundaryInfo {
    /// Whether `v` lies on a boundary loop.
    #[inline]
    pub fn is_boundary_vertex<I: MeshIndex>(&self, v: VertexId<I>) -> bool {
        self.vertices[v.index()]
    }

    /// Whether `e` has a face on one side only.
    #[inline]
    pub fn is_boundary_edge<I: MeshIndex>(&self, e: EdgeId<I>) -> bool {
        self.edges[e.index()]
    }

    /// Number of boundary edges.
    pub fn num_boundary_edges(&self) -> usize {
        self.edges.iter().filter(|&&b| b).count()
    }

    /// Number of boundary vertices.
    pub fn num_boundary_vertices(&self) -> usize {
        self.vertices.iter().filter(|&&b| b).count()
    }

    /// Boundary loops as ordered vertex index cycles.
    pub fn loops(&self) -> &[Vec<usize>] {
        &self.loops
    }
}

/// Geometric labels of a mesh surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceLabels {
    pub(crate) vertices: Vec<VertexLabel>,
    pub(crate) sharp_edges: Vec<bool>,
}

impl SurfaceLabels {
    pub(crate) fn cleared(num_vertices: usize, num_edges: usize) -> Self {
        Self {
            vertices: vec![VertexLabel::Interior; num_vertices],
            sharp_edges: vec![false; num_edges],
        }
    }

    /// Label of `v`.
    #[inline]
    pub fn vertex<I: MeshIndex>(&self, v: VertexId<I>) -> VertexLabel {
        self.vertices[v.index()]
    }

    /// Whether `e` was marked as a sharp crease.
    #[inline]
    pub fn is_sharp<I: MeshIndex>(&self, e: EdgeId<I>) -> bool {
        self.sharp_edges[e.index()]
    }

    /// All vertex labels, indexed by vertex.
    pub fn vertex_labels(&self) -> &[VertexLabel] {
        &self.vertices
    }

    /// Count vertices carrying `label`.
    pub fn count(&self, label: VertexLabel) -> usize {
        self.vertices.iter().filter(|&&l| l == label).count()
    }

    /// Number of sharp edges.
    pub fn num_sharp_edges(&self) -> usize {
        self.sharp_edges.iter().filter(|&&s| s).count()
    }
}
