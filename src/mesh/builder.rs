//! Mesh construction utilities.
//!
//! This module builds half-edge meshes from face-vertex lists as they come out
//! of mesh files, and converts meshes back into that form for writing.

use std::collections::HashMap;

use nalgebra::Point3;

use super::halfedge::{Edge, Face, HalfEdge, HalfEdgeMesh, Vertex};
use super::index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};
use super::labels::SurfaceLabels;
use crate::error::{MeshError, Result};

/// Build a half-edge mesh from vertices and triangle faces.
///
/// # Example
/// ```
/// use quadsnap::mesh::{build_from_triangles, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2]];
///
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_from_triangles<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<HalfEdgeMesh<I>> {
    build_from_polygons(vertices, faces)
}

/// Build a half-edge mesh from vertices and quad faces (counter-clockwise).
pub fn build_from_quads<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 4]],
) -> Result<HalfEdgeMesh<I>> {
    build_from_polygons(vertices, faces)
}

/// Build a half-edge mesh from vertices and polygon faces of any valence.
///
/// # Errors
///
/// - [`MeshError::EmptyMesh`] if `faces` is empty
/// - [`MeshError::InvalidVertexIndex`] if a face points past `vertices`
/// - [`MeshError::DegenerateFace`] for faces with fewer than three corners or
///   a repeated corner
/// - [`MeshError::NonManifoldEdge`] if two faces traverse the same directed
///   edge (inconsistent orientation, or more than two faces on one edge)
pub fn build_from_polygons<I: MeshIndex, F: AsRef<[usize]>>(
    vertices: &[Point3<f64>],
    faces: &[F],
) -> Result<HalfEdgeMesh<I>> {
    if faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }
    assemble(vertices, faces)
}

/// Validate faces and assemble the full connectivity.
pub(crate) fn assemble<I: MeshIndex, F: AsRef<[usize]>>(
    vertices: &[Point3<f64>],
    faces: &[F],
) -> Result<HalfEdgeMesh<I>> {
    for (fi, face) in faces.iter().enumerate() {
        let face = face.as_ref();
        if face.len() < 3 {
            return Err(MeshError::DegenerateFace { face: fi });
        }
        for (k, &vi) in face.iter().enumerate() {
            if vi >= vertices.len() {
                return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
            }
            if face[..k].contains(&vi) {
                return Err(MeshError::DegenerateFace { face: fi });
            }
        }
    }

    let corners: usize = faces.iter().map(|f| f.as_ref().len()).sum();
    let mut mesh = HalfEdgeMesh::<I> {
        vertices: vertices.iter().map(|&p| Vertex::new(p)).collect(),
        halfedges: Vec::with_capacity(corners + corners / 4),
        faces: Vec::with_capacity(faces.len()),
        ..HalfEdgeMesh::new()
    };

    // Directed edge (v0, v1) -> interior half-edge
    let mut edge_map: HashMap<(usize, usize), HalfEdgeId<I>> = HashMap::with_capacity(corners);

    // First pass: one half-edge per face corner
    for face in faces {
        let face = face.as_ref();
        let n = face.len();
        let base = mesh.halfedges.len();
        let face_id = FaceId::<I>::new(mesh.faces.len());

        for k in 0..n {
            let he = HalfEdgeId::new(base + k);
            let (v0, v1) = (face[k], face[(k + 1) % n]);
            if edge_map.insert((v0, v1), he).is_some() {
                return Err(MeshError::NonManifoldEdge { v0, v1 });
            }
            mesh.halfedges.push(HalfEdge {
                origin: VertexId::new(v0),
                next: HalfEdgeId::new(base + (k + 1) % n),
                prev: HalfEdgeId::new(base + (k + n - 1) % n),
                face: face_id,
                ..HalfEdge::new()
            });
            mesh.vertices[v0].halfedge = he;
        }

        mesh.faces.push(Face {
            halfedge: HalfEdgeId::new(base),
            valence: n,
        });
    }

    // Second pass: link twins in creation order, adding boundary half-edges
    let num_interior = mesh.halfedges.len();
    for i in 0..num_interior {
        if mesh.halfedges[i].twin.is_valid() {
            continue;
        }
        let he = HalfEdgeId::<I>::new(i);
        let v0 = mesh.halfedges[i].origin.index();
        let v1 = mesh.halfedges[mesh.halfedges[i].next.index()].origin.index();

        let twin = match edge_map.get(&(v1, v0)) {
            Some(&twin) => twin,
            None => {
                let boundary_he = HalfEdgeId::new(mesh.halfedges.len());
                mesh.halfedges.push(HalfEdge {
                    origin: VertexId::new(v1),
                    ..HalfEdge::new()
                });
                boundary_he
            }
        };
        mesh.halfedges[i].twin = twin;
        mesh.halfedges[twin.index()].twin = he;
    }

    link_boundary_loops(&mut mesh);
    fix_boundary_vertex_halfedges(&mut mesh);
    assign_edges(&mut mesh);

    mesh.labels = SurfaceLabels::cleared(mesh.vertices.len(), mesh.edges.len());
    Ok(mesh)
}

/// Link boundary half-edges into loops.
///
/// Around each boundary vertex the faces form one or more fans. Each fan
/// starts at a boundary half-edge leaving the vertex and ends at one arriving
/// at it. The arriving half-edge of fan `k` is linked to the leaving half-edge
/// of fan `k + 1`, so rotating around a pinched vertex visits every fan.
fn link_boundary_loops<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) {
    let mut outgoing: Vec<Vec<HalfEdgeId<I>>> = vec![Vec::new(); mesh.vertices.len()];
    for he in mesh.halfedge_ids() {
        if mesh.is_boundary_halfedge(he) {
            outgoing[mesh.origin(he).index()].push(he);
        }
    }

    for leaving in outgoing.iter().filter(|list| !list.is_empty()) {
        let arriving: Vec<Option<HalfEdgeId<I>>> =
            leaving.iter().map(|&bo| fan_end(mesh, bo)).collect();
        let m = leaving.len();
        for (k, bi) in arriving.into_iter().enumerate() {
            if let Some(bi) = bi {
                let bo = leaving[(k + 1) % m];
                mesh.halfedges[bi.index()].next = bo;
                mesh.halfedges[bo.index()].prev = bi;
            }
        }
    }
}

/// Walk the fan that starts at boundary half-edge `bo` to the boundary
/// half-edge arriving at the same vertex.
fn fan_end<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, bo: HalfEdgeId<I>) -> Option<HalfEdgeId<I>> {
    let mut he = mesh.next(mesh.twin(bo));
    for _ in 0..mesh.halfedges.len() {
        let incoming = mesh.twin(he);
        if mesh.is_boundary_halfedge(incoming) {
            return Some(incoming);
        }
        he = mesh.next(incoming);
    }
    None
}

/// Ensure boundary vertices point to a boundary half-edge.
fn fix_boundary_vertex_halfedges<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) {
    for i in 0..mesh.vertices.len() {
        let vid = VertexId::<I>::new(i);
        let boundary_he = mesh
            .vertex_halfedges(vid)
            .find(|&he| mesh.is_boundary_halfedge(he));
        if let Some(he) = boundary_he {
            mesh.vertices[i].halfedge = he;
        }
    }
}

/// Give every twin pair an undirected edge id, numbered by the lower half-edge.
fn assign_edges<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) {
    mesh.edges.clear();
    for i in 0..mesh.halfedges.len() {
        if mesh.halfedges[i].edge.is_valid() {
            continue;
        }
        let e = EdgeId::<I>::new(mesh.edges.len());
        let twin = mesh.halfedges[i].twin;
        mesh.halfedges[i].edge = e;
        mesh.halfedges[twin.index()].edge = e;
        mesh.edges.push(Edge {
            halfedge: HalfEdgeId::new(i),
        });
    }
}

/// Convert a half-edge mesh back to a face-vertex representation.
///
/// Returns (vertices, faces), each face in its original winding order.
pub fn to_face_vertex<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
    let vertices = mesh.positions();
    let faces = mesh
        .face_ids()
        .map(|f| mesh.face_vertices(f).map(|v| v.index()).collect())
        .collect();

    (vertices, faces)
}

/// Fan-triangulate every face, returning the triangles and the face each came from.
pub fn triangulate_faces<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Vec<([usize; 3], usize)> {
    let mut triangles = Vec::with_capacity(mesh.num_faces() * 2);
    for f in mesh.face_ids() {
        let corners: Vec<usize> = mesh.face_vertices(f).map(|v| v.index()).collect();
        for k in 1..corners.len() - 1 {
            triangles.push(([corners[0], corners[k], corners[k + 1]], f.index()));
        }
    }
    triangles
}
