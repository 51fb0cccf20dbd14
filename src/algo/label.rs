//! Boundary and feature labeling.
//!
//! Labeling classifies every vertex by how it sits on the mesh's feature
//! curves. A *feature edge* is a boundary edge or, when
//! [`LabelOptions::detect_creases`] is set, an interior edge whose two face
//! normals meet at a cosine below the threshold (a sharp crease). With the
//! feature degree of a vertex being its number of incident feature edges:
//!
//! | feature degree | turning cosine | label |
//! |----------------|----------------|-------|
//! | 0 | - | [`VertexLabel::Interior`] |
//! | 2 | `>= cos_angle` | [`VertexLabel::Regular`] |
//! | 2 | `< cos_angle` | [`VertexLabel::SharpFeature`] |
//! | anything else | - | [`VertexLabel::Corner`] |
//!
//! Labels are stored on the mesh. They must be cleared with
//! [`clear_labels`] before each relabel; [`label_surface`] refuses to run on
//! stale labels.
//!
//! Crease detection is off by default. On a noisy quad mesh a single bumpy
//! vertex would otherwise pick up four creases and be pinned as a corner.
//! Reference surfaces turn it on to collect their feature curves.
//!
//! How labels affect motion is decided separately by [`FeaturePolicy`], which
//! folds the "treat as regular" and "preserve" switches into one
//! [`VertexRole`] per vertex.
//!
//! # Example
//!
//! ```
//! use quadsnap::prelude::*;
//! use quadsnap::algo::label::{clear_labels, label_surface, LabelOptions};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mut mesh: HalfEdgeMesh = build_from_quads(&vertices, &[[0, 1, 2, 3]]).unwrap();
//! mesh.extract_boundary();
//!
//! clear_labels(&mut mesh);
//! label_surface(&mut mesh, &LabelOptions::default()).unwrap();
//! // Every corner of a square turns by 90 degrees
//! assert_eq!(mesh.label(VertexId::new(0)), VertexLabel::SharpFeature);
//! ```

use std::fmt;

use nalgebra::Point3;

use crate::error::{MeshError, Result};
use crate::mesh::{EdgeId, HalfEdgeMesh, MeshIndex, SurfaceLabels, VertexId, VertexLabel};

/// Default cosine threshold, cos(20°).
pub const DEFAULT_COS_ANGLE: f64 = 0.939692621;

/// Options for [`label_surface`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelOptions {
    /// Cosine threshold in (-1, 1]. Feature curves turning by more than
    /// `acos(cos_angle)` and creases whose normals differ by more than that
    /// angle are sharp.
    pub cos_angle: f64,
    /// Also mark interior edges with a dihedral cosine below `cos_angle` as
    /// feature edges.
    pub detect_creases: bool,
}

impl Default for LabelOptions {
    fn default() -> Self {
        Self {
            cos_angle: DEFAULT_COS_ANGLE,
            detect_creases: false,
        }
    }
}

impl LabelOptions {
    /// Create options with a validated cosine threshold.
    pub fn with_cos_angle(cos_angle: f64) -> Result<Self> {
        if !(cos_angle > -1.0 && cos_angle <= 1.0) {
            return Err(MeshError::invalid_param(
                "cos_angle",
                cos_angle,
                "must be in (-1, 1]",
            ));
        }
        Ok(Self {
            cos_angle,
            detect_creases: false,
        })
    }

    /// Set whether sharp interior edges count as feature edges.
    pub fn with_creases(mut self, detect: bool) -> Self {
        self.detect_creases = detect;
        self
    }
}

/// Counts produced by one labeling pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelSummary {
    /// Vertices off every feature curve.
    pub interior: usize,
    /// Smooth feature-curve vertices.
    pub regular: usize,
    /// Sharp feature-curve vertices.
    pub sharp: usize,
    /// Corners.
    pub corner: usize,
    /// Interior edges marked as creases.
    pub sharp_edges: usize,
}

impl fmt::Display for LabelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} interior, {} regular, {} sharp, {} corner, {} crease edges",
            self.interior, self.regular, self.sharp, self.corner, self.sharp_edges
        )
    }
}

/// Reset all labels to [`VertexLabel::Interior`] and all edges to not sharp.
pub fn clear_labels<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) {
    mesh.clear_labels();
}

/// Whether `e` is a boundary edge or a labeled crease.
#[inline]
pub fn is_feature_edge<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, e: EdgeId<I>) -> bool {
    mesh.is_boundary_edge(e) || mesh.labels().is_sharp(e)
}

/// Neighbors of `v` reached through feature edges, in rotation order.
pub fn feature_neighbors<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, v: VertexId<I>) -> Vec<VertexId<I>> {
    mesh.vertex_halfedges(v)
        .filter(|&he| is_feature_edge(mesh, mesh.edge_of(he)))
        .map(|he| mesh.dest(he))
        .collect()
}

/// Label crease edges and classify every vertex.
///
/// # Errors
///
/// - [`MeshError::InvalidState`] if the boundary has not been extracted, or if
///   the labels were not cleared since the last labeling pass.
pub fn label_surface<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    options: &LabelOptions,
) -> Result<LabelSummary> {
    if mesh.boundary().is_none() {
        return Err(MeshError::InvalidState(
            "boundary must be extracted before labeling".to_string(),
        ));
    }
    let labels = mesh.labels();
    if labels.vertex_labels().iter().any(|&l| l != VertexLabel::Interior)
        || labels.num_sharp_edges() > 0
    {
        return Err(MeshError::InvalidState(
            "labels must be cleared before relabeling".to_string(),
        ));
    }

    let sharp_edges: Vec<bool> = mesh
        .edge_ids()
        .map(|e| options.detect_creases && is_crease(mesh, e, options.cos_angle))
        .collect();
    mesh.labels_mut().sharp_edges = sharp_edges;

    let vertices: Vec<VertexLabel> = mesh
        .vertex_ids()
        .map(|v| classify_vertex(mesh, v, options.cos_angle))
        .collect();

    let labels = SurfaceLabels {
        vertices,
        sharp_edges: std::mem::take(&mut mesh.labels_mut().sharp_edges),
    };
    let summary = LabelSummary {
        interior: labels.count(VertexLabel::Interior),
        regular: labels.count(VertexLabel::Regular),
        sharp: labels.count(VertexLabel::SharpFeature),
        corner: labels.count(VertexLabel::Corner),
        sharp_edges: labels.num_sharp_edges(),
    };
    *mesh.labels_mut() = labels;

    log::debug!("labeled surface: {}", summary);
    Ok(summary)
}

fn is_crease<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, e: EdgeId<I>, cos_angle: f64) -> bool {
    if mesh.is_boundary_edge(e) {
        return false;
    }
    let [f0, f1] = mesh.edge_faces(e);
    let n0 = mesh.face_normal(f0);
    let n1 = mesh.face_normal(f1);
    // Degenerate faces have no direction to compare
    if n0.norm_squared() == 0.0 || n1.norm_squared() == 0.0 {
        return false;
    }
    n0.dot(&n1) < cos_angle
}

fn classify_vertex<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, v: VertexId<I>, cos_angle: f64) -> VertexLabel {
    let neighbors = feature_neighbors(mesh, v);
    match neighbors.as_slice() {
        [] => VertexLabel::Interior,
        [a, b] => {
            let p = mesh.position(v);
            match turning_cosine(mesh.position(*a), p, mesh.position(*b)) {
                Some(c) if c < cos_angle => VertexLabel::SharpFeature,
                _ => VertexLabel::Regular,
            }
        }
        _ => VertexLabel::Corner,
    }
}

/// Cosine of the turn at `p` on the polyline `a -> p -> b`.
///
/// 1 for a straight continuation, `None` if a segment has zero length.
fn turning_cosine(a: &Point3<f64>, p: &Point3<f64>, b: &Point3<f64>) -> Option<f64> {
    let incoming = (p - a).try_normalize(f64::MIN_POSITIVE)?;
    let outgoing = (b - p).try_normalize(f64::MIN_POSITIVE)?;
    Some(incoming.dot(&outgoing))
}

/// How a vertex participates in smoothing and projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexRole {
    /// Neither smoothed nor projected.
    Fixed,
    /// Smoothed over all edge neighbors, projected onto the reference surface.
    Free,
    /// Smoothed over feature-edge neighbors, projected onto the reference surface.
    Feature,
    /// Smoothed over feature-edge neighbors, projected onto the reference
    /// feature curves.
    Crease,
}

impl VertexRole {
    /// Whether the vertex may move at all.
    #[inline]
    pub fn is_movable(self) -> bool {
        self != VertexRole::Fixed
    }
}

/// Switches deciding how labeled vertices move.
///
/// | label | role |
/// |-------|------|
/// | Interior | `Free` |
/// | Regular | `Feature` |
/// | SharpFeature | `Fixed` if preserved, else `Feature` if treated as regular, else `Crease` |
/// | Corner | `Feature` if treated as regular, else `Fixed` |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeaturePolicy {
    /// Keep sharp feature vertices in place.
    pub preserve_sharp_feature: bool,
    /// Move sharp feature vertices like regular ones.
    pub treat_sharp_feature_as_regular: bool,
    /// Move corners like regular feature vertices.
    pub treat_corner_as_regular: bool,
}

impl Default for FeaturePolicy {
    fn default() -> Self {
        Self {
            preserve_sharp_feature: false,
            treat_sharp_feature_as_regular: true,
            treat_corner_as_regular: false,
        }
    }
}

impl FeaturePolicy {
    /// Set whether sharp feature vertices stay in place.
    pub fn with_preserve_sharp_feature(mut self, preserve: bool) -> Self {
        self.preserve_sharp_feature = preserve;
        self
    }

    /// Set whether sharp feature vertices move like regular ones.
    pub fn with_sharp_feature_as_regular(mut self, demote: bool) -> Self {
        self.treat_sharp_feature_as_regular = demote;
        self
    }

    /// Set whether corners move like regular feature vertices.
    pub fn with_corner_as_regular(mut self, demote: bool) -> Self {
        self.treat_corner_as_regular = demote;
        self
    }

    /// Role of a vertex carrying `label`.
    pub fn role(&self, label: VertexLabel) -> VertexRole {
        match label {
            VertexLabel::Interior => VertexRole::Free,
            VertexLabel::Regular => VertexRole::Feature,
            VertexLabel::SharpFeature if self.preserve_sharp_feature => VertexRole::Fixed,
            VertexLabel::SharpFeature if self.treat_sharp_feature_as_regular => VertexRole::Feature,
            VertexLabel::SharpFeature => VertexRole::Crease,
            VertexLabel::Corner if self.treat_corner_as_regular => VertexRole::Feature,
            VertexLabel::Corner => VertexRole::Fixed,
        }
    }

    /// Roles of every vertex of `mesh` under its current labels.
    pub fn roles<I: MeshIndex>(&self, mesh: &HalfEdgeMesh<I>) -> Vec<VertexRole> {
        mesh.labels()
            .vertex_labels()
            .iter()
            .map(|&label| self.role(label))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_from_quads, build_from_triangles};

    /// `n x n` quad grid in the z=0 plane, unit spacing.
    fn grid(n: usize) -> HalfEdgeMesh {
        let mut vertices = Vec::new();
        for j in 0..=n {
            for i in 0..=n {
                vertices.push(Point3::new(i as f64, j as f64, 0.0));
            }
        }
        let mut faces = Vec::new();
        for j in 0..n {
            for i in 0..n {
                let v00 = j * (n + 1) + i;
                faces.push([v00, v00 + 1, v00 + n + 2, v00 + n + 1]);
            }
        }
        let mut mesh: HalfEdgeMesh = build_from_quads(&vertices, &faces).unwrap();
        mesh.extract_boundary();
        mesh
    }

    fn relabel(mesh: &mut HalfEdgeMesh, cos_angle: f64) -> LabelSummary {
        clear_labels(mesh);
        label_surface(mesh, &LabelOptions::with_cos_angle(cos_angle).unwrap()).unwrap()
    }

    #[test]
    fn test_grid_labels() {
        let mut mesh = grid(3);
        let summary = relabel(&mut mesh, DEFAULT_COS_ANGLE);

        // 4 inner vertices, 8 straight boundary vertices, 4 right-angle corners
        assert_eq!(summary.interior, 4);
        assert_eq!(summary.regular, 8);
        assert_eq!(summary.sharp, 4);
        assert_eq!(summary.corner, 0);
        assert_eq!(summary.sharp_edges, 0);

        assert_eq!(mesh.label(VertexId::new(0)), VertexLabel::SharpFeature);
        assert_eq!(mesh.label(VertexId::new(1)), VertexLabel::Regular);
        assert_eq!(mesh.label(VertexId::new(5)), VertexLabel::Interior);
    }

    #[test]
    fn test_loose_threshold_makes_right_angles_regular() {
        let mut mesh = grid(2);
        // cos(90°) = 0 is not below -0.5
        let summary = relabel(&mut mesh, -0.5);
        assert_eq!(summary.sharp, 0);
        assert_eq!(summary.regular, 8);
    }

    #[test]
    fn test_relabel_is_idempotent() {
        let mut mesh = grid(3);
        relabel(&mut mesh, DEFAULT_COS_ANGLE);
        let first = mesh.labels().clone();
        relabel(&mut mesh, DEFAULT_COS_ANGLE);
        assert_eq!(mesh.labels(), &first);
    }

    #[test]
    fn test_label_requires_cleared_labels() {
        let mut mesh = grid(2);
        relabel(&mut mesh, DEFAULT_COS_ANGLE);
        let result = label_surface(&mut mesh, &LabelOptions::default());
        assert!(matches!(result, Err(MeshError::InvalidState(_))));
    }

    #[test]
    fn test_label_requires_boundary() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        let mut mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        let result = label_surface(&mut mesh, &LabelOptions::default());
        assert!(matches!(result, Err(MeshError::InvalidState(_))));
    }

    #[test]
    fn test_topological_corner() {
        // Two quads touching at vertex 2 only: it has four boundary edges
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
        ];
        let mut mesh: HalfEdgeMesh =
            build_from_quads(&vertices, &[[0, 1, 2, 3], [2, 4, 5, 6]]).unwrap();
        mesh.extract_boundary();
        relabel(&mut mesh, DEFAULT_COS_ANGLE);

        assert_eq!(mesh.label(VertexId::new(2)), VertexLabel::Corner);
    }

    #[test]
    fn test_crease_edges_on_folded_strip() {
        // Two quads folded by 90 degrees along the shared edge 1-4
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
        ];
        let mut mesh: HalfEdgeMesh =
            build_from_quads(&vertices, &[[0, 1, 4, 3], [1, 2, 5, 4]]).unwrap();
        mesh.extract_boundary();
        let options = LabelOptions::default().with_creases(true);
        clear_labels(&mut mesh);
        let summary = label_surface(&mut mesh, &options).unwrap();

        assert_eq!(summary.sharp_edges, 1);
        // Crease endpoints meet two boundary edges and the crease
        assert_eq!(mesh.label(VertexId::new(1)), VertexLabel::Corner);
        assert_eq!(mesh.label(VertexId::new(4)), VertexLabel::Corner);
    }

    #[test]
    fn test_bumpy_interior_vertex_stays_interior() {
        let mut mesh = grid(2);
        let mut positions = mesh.positions();
        positions[4].z = 0.5;
        mesh.commit_positions(positions).unwrap();

        let summary = relabel(&mut mesh, DEFAULT_COS_ANGLE);
        assert_eq!(summary.sharp_edges, 0);
        assert_eq!(summary.corner, 0);
        assert_eq!(mesh.label(VertexId::new(4)), VertexLabel::Interior);
        assert_eq!(mesh.label(VertexId::new(1)), VertexLabel::Regular);

        // With creases on, the bump is a meeting point of four creases
        clear_labels(&mut mesh);
        let options = LabelOptions::default().with_creases(true);
        let summary = label_surface(&mut mesh, &options).unwrap();
        assert_eq!(summary.sharp_edges, 4);
        assert_eq!(mesh.label(VertexId::new(4)), VertexLabel::Corner);
    }

    #[test]
    fn test_invalid_threshold() {
        assert!(LabelOptions::with_cos_angle(-1.0).is_err());
        assert!(LabelOptions::with_cos_angle(1.5).is_err());
        assert!(LabelOptions::with_cos_angle(f64::NAN).is_err());
        assert!(LabelOptions::with_cos_angle(1.0).is_ok());
    }

    #[test]
    fn test_policy_roles() {
        let policy = FeaturePolicy::default();
        assert_eq!(policy.role(VertexLabel::Interior), VertexRole::Free);
        assert_eq!(policy.role(VertexLabel::Regular), VertexRole::Feature);
        assert_eq!(policy.role(VertexLabel::SharpFeature), VertexRole::Feature);
        assert_eq!(policy.role(VertexLabel::Corner), VertexRole::Fixed);

        let strict = policy.with_sharp_feature_as_regular(false);
        assert_eq!(strict.role(VertexLabel::SharpFeature), VertexRole::Crease);

        let preserving = strict.with_preserve_sharp_feature(true);
        assert_eq!(preserving.role(VertexLabel::SharpFeature), VertexRole::Fixed);

        let loose = policy.with_corner_as_regular(true);
        assert_eq!(loose.role(VertexLabel::Corner), VertexRole::Feature);
    }
}
