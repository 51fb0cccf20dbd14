//! Projection onto a reference surface.
//!
//! The reference mesh is wrapped in a [`ReferenceSurface`], which takes
//! ownership and only hands out shared references afterwards. On construction
//! it fan-triangulates every face and collects the reference's feature
//! segments (boundary edges and sharp creases).
//!
//! Closest-point queries scan every triangle, pruned by per-triangle bounding
//! boxes. The result is the global minimum; when several triangles are
//! equally close, the one from the lowest face id (then the lowest fan
//! triangle) wins.
//!
//! # Example
//!
//! ```
//! use quadsnap::prelude::*;
//! use quadsnap::algo::project::ReferenceSurface;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let tri: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
//! let surface = ReferenceSurface::new(tri, 0.939692621).unwrap();
//!
//! let hit = surface.closest_point(&Point3::new(0.0, 0.0, 5.0));
//! assert_eq!(hit.point, Point3::new(0.0, 0.0, 0.0));
//! assert_eq!(hit.distance, 5.0);
//! ```

use std::path::Path;

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use crate::error::{MeshError, Result};
use crate::mesh::{triangulate_faces, FaceId, HalfEdgeMesh, MeshIndex, VertexId};

use super::label::{
    clear_labels, is_feature_edge, label_surface, FeaturePolicy, LabelOptions, VertexRole,
};
use super::smooth::{smooth_pass, SmoothMode};

/// Nearest point found on a reference surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit<I: MeshIndex = u32> {
    /// The closest point.
    pub point: Point3<f64>,
    /// Reference face containing the point.
    pub face: FaceId<I>,
    /// Barycentric coordinates within the fan triangle that was hit.
    pub barycentric: [f64; 3],
    /// Distance from the query point.
    pub distance: f64,
}

#[derive(Debug, Clone)]
struct Triangle {
    corners: [Point3<f64>; 3],
    min: Point3<f64>,
    max: Point3<f64>,
    face: usize,
}

/// Read-only reference surface for projection.
#[derive(Debug, Clone)]
pub struct ReferenceSurface<I: MeshIndex = u32> {
    mesh: HalfEdgeMesh<I>,
    triangles: Vec<Triangle>,
    feature_segments: Vec<[Point3<f64>; 2]>,
}

impl<I: MeshIndex> ReferenceSurface<I> {
    /// Wrap `mesh` as a projection target.
    ///
    /// Extracts the boundary if needed and labels boundary and crease edges
    /// with `cos_angle`; both become feature segments.
    ///
    /// # Errors
    ///
    /// [`MeshError::EmptyReference`] if `mesh` has no faces.
    pub fn new(mut mesh: HalfEdgeMesh<I>, cos_angle: f64) -> Result<Self> {
        if mesh.num_faces() == 0 {
            return Err(MeshError::EmptyReference);
        }
        if mesh.boundary().is_none() {
            mesh.extract_boundary();
        }
        clear_labels(&mut mesh);
        label_surface(&mut mesh, &LabelOptions::with_cos_angle(cos_angle)?.with_creases(true))?;

        let triangles: Vec<Triangle> = triangulate_faces(&mesh)
            .into_iter()
            .map(|(corners, face)| {
                let corners = corners.map(|v| *mesh.position(VertexId::new(v)));
                let mut min = corners[0];
                let mut max = corners[0];
                for c in &corners[1..] {
                    min = min.inf(c);
                    max = max.sup(c);
                }
                Triangle {
                    corners,
                    min,
                    max,
                    face,
                }
            })
            .collect();

        let feature_segments = mesh
            .edge_ids()
            .filter(|&e| is_feature_edge(&mesh, e))
            .map(|e| mesh.edge_vertices(e).map(|v| *mesh.position(v)))
            .collect::<Vec<_>>();

        log::debug!(
            "reference surface: {} faces, {} triangles, {} feature segments",
            mesh.num_faces(),
            triangles.len(),
            feature_segments.len()
        );

        Ok(Self {
            mesh,
            triangles,
            feature_segments,
        })
    }

    /// Load a reference surface from `path`.
    ///
    /// # Errors
    ///
    /// [`MeshError::EmptyReference`] if the file holds no faces, otherwise
    /// whatever [`crate::io::load`] reports.
    pub fn load<P: AsRef<Path>>(path: P, cos_angle: f64) -> Result<Self> {
        let mesh = match crate::io::load(path) {
            Err(MeshError::EmptyMesh) => return Err(MeshError::EmptyReference),
            other => other?,
        };
        Self::new(mesh, cos_angle)
    }

    /// The wrapped mesh.
    pub fn mesh(&self) -> &HalfEdgeMesh<I> {
        &self.mesh
    }

    /// Number of fan triangles searched per query.
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Number of boundary and crease segments.
    pub fn num_feature_segments(&self) -> usize {
        self.feature_segments.len()
    }

    /// Globally nearest point on the surface.
    pub fn closest_point(&self, p: &Point3<f64>) -> SurfaceHit<I> {
        let mut best_dist2 = f64::INFINITY;
        let mut best = (Point3::origin(), 0usize, [1.0, 0.0, 0.0]);

        for tri in &self.triangles {
            if box_distance_squared(p, &tri.min, &tri.max) >= best_dist2 {
                continue;
            }
            let [a, b, c] = &tri.corners;
            let (q, bary) = closest_point_on_triangle(p, a, b, c);
            let d2 = (q - p).norm_squared();
            if d2 < best_dist2 {
                best_dist2 = d2;
                best = (q, tri.face, bary);
            }
        }

        SurfaceHit {
            point: best.0,
            face: FaceId::new(best.1),
            barycentric: best.2,
            distance: best_dist2.sqrt(),
        }
    }

    /// Nearest point on the boundary and crease curves, if there are any.
    pub fn closest_feature_point(&self, p: &Point3<f64>) -> Option<Point3<f64>> {
        let mut best: Option<(f64, Point3<f64>)> = None;
        for [a, b] in &self.feature_segments {
            let q = closest_point_on_segment(p, a, b);
            let d2 = (q - p).norm_squared();
            if best.map_or(true, |(bd, _)| d2 < bd) {
                best = Some((d2, q));
            }
        }
        best.map(|(_, q)| q)
    }

    fn target_for(&self, p: &Point3<f64>, role: VertexRole) -> Point3<f64> {
        match role {
            VertexRole::Fixed => *p,
            VertexRole::Free | VertexRole::Feature => self.closest_point(p).point,
            VertexRole::Crease => self
                .closest_feature_point(p)
                .unwrap_or_else(|| self.closest_point(p).point),
        }
    }
}

/// Options for [`project_to`] and [`project_surface`].
#[derive(Debug, Clone)]
pub struct ProjectOptions {
    /// How labeled vertices are allowed to move.
    pub policy: FeaturePolicy,

    /// Re-smooth after projecting ([`project_surface`] only).
    pub preserve_quality: bool,

    /// Smoothing mode used when re-smoothing.
    pub mode: SmoothMode,

    /// Whether to use parallel execution (default: true).
    pub parallel: bool,
}

impl Default for ProjectOptions {
    fn default() -> Self {
        Self {
            policy: FeaturePolicy::default(),
            preserve_quality: false,
            mode: SmoothMode::EdgeLaplace,
            parallel: true,
        }
    }
}

impl ProjectOptions {
    /// Set the feature policy.
    pub fn with_policy(mut self, policy: FeaturePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set whether [`project_surface`] re-smooths after projecting.
    pub fn with_preserve_quality(mut self, preserve: bool) -> Self {
        self.preserve_quality = preserve;
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Summary of one projection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProjectionReport {
    /// Vertices that were projected.
    pub projected: usize,
    /// Largest distance a projected vertex travelled.
    pub max_distance: f64,
    /// Mean distance travelled by projected vertices.
    pub mean_distance: f64,
}

/// Move every movable vertex of `target` onto `reference`.
///
/// Roles come from `target`'s current labels. `Crease` vertices snap to the
/// reference feature curves when the reference has any.
///
/// A [`ReferenceSurface`] always has at least one face, so an empty
/// reference is reported by [`ReferenceSurface::new`] before any target is
/// touched.
pub fn project_to<I: MeshIndex>(
    target: &mut HalfEdgeMesh<I>,
    reference: &ReferenceSurface<I>,
    options: &ProjectOptions,
) -> Result<ProjectionReport> {
    let roles = options.policy.roles(target);
    project_pass(target, reference, &roles, options.parallel)
}

/// Project, then re-smooth once when `options.preserve_quality` is set.
///
/// Re-smoothing trades closeness to the reference for element quality.
pub fn project_surface<I: MeshIndex>(
    target: &mut HalfEdgeMesh<I>,
    reference: &ReferenceSurface<I>,
    options: &ProjectOptions,
) -> Result<ProjectionReport> {
    let roles = options.policy.roles(target);
    let report = project_pass(target, reference, &roles, options.parallel)?;
    if options.preserve_quality {
        let moved = smooth_pass(target, &roles, options.mode, options.parallel)?;
        log::debug!("quality smoothing after projection: max displacement {:.3e}", moved);
    }
    Ok(report)
}

/// One Jacobi projection pass with precomputed roles.
pub(crate) fn project_pass<I: MeshIndex>(
    target: &mut HalfEdgeMesh<I>,
    reference: &ReferenceSurface<I>,
    roles: &[VertexRole],
    parallel: bool,
) -> Result<ProjectionReport> {
    let frozen: &HalfEdgeMesh<I> = target;
    let step = |i: usize| reference.target_for(frozen.position(VertexId::new(i)), roles[i]);

    let new_positions: Vec<Point3<f64>> = if parallel {
        (0..frozen.num_vertices()).into_par_iter().map(step).collect()
    } else {
        (0..frozen.num_vertices()).map(step).collect()
    };

    let mut report = ProjectionReport::default();
    let mut total = 0.0;
    for (i, p) in new_positions.iter().enumerate() {
        if roles[i].is_movable() {
            let d = (p - frozen.position(VertexId::new(i))).norm();
            report.projected += 1;
            report.max_distance = report.max_distance.max(d);
            total += d;
        }
    }
    if report.projected > 0 {
        report.mean_distance = total / report.projected as f64;
    }

    target.commit_positions(new_positions)?;
    Ok(report)
}

/// Squared distance from `p` to an axis-aligned box, 0 inside.
fn box_distance_squared(p: &Point3<f64>, min: &Point3<f64>, max: &Point3<f64>) -> f64 {
    let mut d2 = 0.0;
    for i in 0..3 {
        let excess = (min[i] - p[i]).max(p[i] - max[i]).max(0.0);
        d2 += excess * excess;
    }
    d2
}

/// Closest point on triangle `abc` and its barycentric coordinates.
///
/// Region tests follow Ericson, *Real-Time Collision Detection*, 5.1.5.
/// Degenerate triangles fall back to the closest of their three edges.
pub fn closest_point_on_triangle(
    p: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> (Point3<f64>, [f64; 3]) {
    let ab = b - a;
    let ac = c - a;

    if ab.cross(&ac).norm_squared() <= f64::EPSILON * ab.norm_squared() * ac.norm_squared() {
        return closest_point_on_degenerate_triangle(p, a, b, c);
    }

    let ap = p - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return (*a, [1.0, 0.0, 0.0]);
    }

    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return (*b, [0.0, 1.0, 0.0]);
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return (a + ab * v, [1.0 - v, v, 0.0]);
    }

    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return (*c, [0.0, 0.0, 1.0]);
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return (a + ac * w, [1.0 - w, 0.0, w]);
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return (b + (c - b) * w, [0.0, 1.0 - w, w]);
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    (a + ab * v + ac * w, [1.0 - v - w, v, w])
}

fn closest_point_on_degenerate_triangle(
    p: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> (Point3<f64>, [f64; 3]) {
    let candidates = [
        (segment_parameter(p, a, b), 0usize),
        (segment_parameter(p, b, c), 1),
        (segment_parameter(p, c, a), 2),
    ];
    let ends = [(a, b), (b, c), (c, a)];

    let mut best: Option<(f64, Point3<f64>, [f64; 3])> = None;
    for (t, k) in candidates {
        let (s, e) = ends[k];
        let q = s + (e - s) * t;
        let d2 = (q - p).norm_squared();
        if best.map_or(true, |(bd, _, _)| d2 < bd) {
            let mut bary = [0.0; 3];
            bary[k] = 1.0 - t;
            bary[(k + 1) % 3] = t;
            best = Some((d2, q, bary));
        }
    }
    let (_, q, bary) = best.unwrap_or((0.0, *a, [1.0, 0.0, 0.0]));
    (q, bary)
}

/// Parameter in [0, 1] of the point on `ab` closest to `p`.
fn segment_parameter(p: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    let ab: Vector3<f64> = b - a;
    let len2 = ab.norm_squared();
    if len2 == 0.0 {
        return 0.0;
    }
    ((p - a).dot(&ab) / len2).clamp(0.0, 1.0)
}

/// Closest point on segment `ab`.
pub fn closest_point_on_segment(p: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> Point3<f64> {
    a + (b - a) * segment_parameter(p, a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::label::DEFAULT_COS_ANGLE;
    use crate::mesh::{build_from_quads, build_from_triangles, VertexLabel};

    fn unit_triangle() -> ReferenceSurface {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        ReferenceSurface::new(mesh, DEFAULT_COS_ANGLE).unwrap()
    }

    /// Unit square in z = 0 split into two triangles.
    fn unit_square() -> ReferenceSurface {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap();
        ReferenceSurface::new(mesh, DEFAULT_COS_ANGLE).unwrap()
    }

    #[test]
    fn test_point_above_corner() {
        let surface = unit_triangle();
        let hit = surface.closest_point(&Point3::new(0.0, 0.0, 5.0));
        assert_eq!(hit.point, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(hit.distance, 5.0);
        assert_eq!(hit.face, FaceId::new(0));
        assert_eq!(hit.barycentric, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_point_above_interior() {
        let surface = unit_triangle();
        let hit = surface.closest_point(&Point3::new(0.25, 0.25, -2.0));
        assert!((hit.point - Point3::new(0.25, 0.25, 0.0)).norm() < 1e-12);
        assert!((hit.distance - 2.0).abs() < 1e-12);
        let [u, v, w] = hit.barycentric;
        assert!((u - 0.5).abs() < 1e-12 && (v - 0.25).abs() < 1e-12 && (w - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_point_outside_edge() {
        let surface = unit_triangle();
        // Beyond the hypotenuse
        let hit = surface.closest_point(&Point3::new(1.0, 1.0, 0.0));
        assert!((hit.point - Point3::new(0.5, 0.5, 0.0)).norm() < 1e-12);
        assert!((hit.distance - 0.5_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_closest_point_is_global_minimum() {
        let surface = unit_square();
        let queries = [
            Point3::new(0.3, 0.8, 1.0),
            Point3::new(1.7, 0.2, -0.4),
            Point3::new(-0.5, -0.5, 0.1),
            Point3::new(0.9, 0.1, 0.0),
        ];
        for q in &queries {
            let hit = surface.closest_point(q);
            // Compare against a dense sample of the square
            for i in 0..=20 {
                for j in 0..=20 {
                    let s = Point3::new(i as f64 / 20.0, j as f64 / 20.0, 0.0);
                    assert!(hit.distance <= (s - q).norm() + 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_tie_goes_to_lowest_face() {
        let surface = unit_square();
        // Above the shared diagonal: both triangles are equally close
        let hit = surface.closest_point(&Point3::new(0.5, 0.5, 1.0));
        assert_eq!(hit.face, FaceId::new(0));
    }

    #[test]
    fn test_degenerate_triangle() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(2.0, 0.0, 0.0);
        let (q, bary) = closest_point_on_triangle(&Point3::new(1.5, 1.0, 0.0), &a, &b, &c);
        assert!((q - Point3::new(1.5, 0.0, 0.0)).norm() < 1e-12);
        assert!((bary.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_reference() {
        let mut target = lifted_quad_grid();
        let before = target.positions();

        let result = ReferenceSurface::new(HalfEdgeMesh::new(), DEFAULT_COS_ANGLE)
            .and_then(|surface| project_to(&mut target, &surface, &ProjectOptions::default()));

        assert!(matches!(result, Err(MeshError::EmptyReference)));
        assert_eq!(target.positions(), before);
    }

    #[test]
    fn test_feature_segments() {
        let surface = unit_square();
        assert_eq!(surface.num_feature_segments(), 4);
        let q = surface.closest_feature_point(&Point3::new(0.5, 0.4, 0.0)).unwrap();
        assert!((q - Point3::new(0.5, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_load_faceless_reference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.off");
        std::fs::write(&path, "OFF\n3 0 0\n0 0 0\n1 0 0\n0 1 0\n").unwrap();

        let result: Result<ReferenceSurface> = ReferenceSurface::load(&path, DEFAULT_COS_ANGLE);
        assert!(matches!(result, Err(MeshError::EmptyReference)));

        let missing: Result<ReferenceSurface> =
            ReferenceSurface::load(dir.path().join("none.off"), DEFAULT_COS_ANGLE);
        assert!(matches!(missing, Err(MeshError::Io(_))));
    }

    #[test]
    fn test_reference_collects_creases() {
        // Two quads folded by 90 degrees along edge 1-4
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
        ];
        let mesh: HalfEdgeMesh =
            build_from_quads(&vertices, &[[0, 1, 4, 3], [1, 2, 5, 4]]).unwrap();
        let surface = ReferenceSurface::new(mesh, DEFAULT_COS_ANGLE).unwrap();

        // Six boundary edges plus the fold
        assert_eq!(surface.num_feature_segments(), 7);
        let q = surface.closest_feature_point(&Point3::new(0.9, 0.5, 0.1)).unwrap();
        assert!((q - Point3::new(1.0, 0.5, 0.0)).norm() < 1e-12);
    }

    fn lifted_quad_grid() -> HalfEdgeMesh {
        // 2x2 quads hovering at z = 0.5 over the unit square, scaled to fit
        let mut vertices = Vec::new();
        for j in 0..3 {
            for i in 0..3 {
                vertices.push(Point3::new(i as f64 * 0.5, j as f64 * 0.5, 0.5));
            }
        }
        let faces = [[0, 1, 4, 3], [1, 2, 5, 4], [3, 4, 7, 6], [4, 5, 8, 7]];
        let mut mesh: HalfEdgeMesh = build_from_quads(&vertices, &faces).unwrap();
        mesh.extract_boundary();
        clear_labels(&mut mesh);
        label_surface(&mut mesh, &LabelOptions::default()).unwrap();
        mesh
    }

    #[test]
    fn test_project_to_respects_roles() {
        let surface = unit_square();
        let mut target = lifted_quad_grid();

        // Default policy: right-angle corners are sharp and demoted to regular
        let report = project_to(&mut target, &surface, &ProjectOptions::default()).unwrap();
        assert_eq!(report.projected, 9);
        assert!((report.max_distance - 0.5).abs() < 1e-12);
        for v in target.vertex_ids() {
            assert_eq!(target.position(v).z, 0.0);
        }
    }

    #[test]
    fn test_project_keeps_preserved_features() {
        let surface = unit_square();
        let mut target = lifted_quad_grid();
        let corner = VertexId::new(0);
        assert_eq!(target.label(corner), VertexLabel::SharpFeature);

        let options = ProjectOptions::default()
            .with_policy(FeaturePolicy::default().with_preserve_sharp_feature(true));
        let report = project_to(&mut target, &surface, &options).unwrap();
        assert_eq!(report.projected, 5);
        assert_eq!(target.position(corner).z, 0.5);
    }

    #[test]
    fn test_crease_vertices_snap_to_feature_curves() {
        let surface = unit_square();
        let mut target = lifted_quad_grid();
        let options = ProjectOptions::default()
            .with_policy(FeaturePolicy::default().with_sharp_feature_as_regular(false))
            .with_parallel(false);
        project_to(&mut target, &surface, &options).unwrap();

        // Corner (1, 1) of the target snaps to the nearest reference boundary point
        let p = target.position(VertexId::new(8));
        assert!((p - Point3::new(1.0, 1.0, 0.0)).norm() < 1e-12);
        // Interior vertex goes straight down
        let centre = target.position(VertexId::new(4));
        assert!((centre - Point3::new(0.5, 0.5, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_project_surface_with_quality_smoothing() {
        let surface = unit_square();
        let mut target = lifted_quad_grid();
        // Push the centre off-centre; projection keeps it there, smoothing recentres it
        let mut positions = target.positions();
        positions[4].x = 0.7;
        target.commit_positions(positions).unwrap();

        let mut plain = target.clone();
        project_surface(&mut plain, &surface, &ProjectOptions::default()).unwrap();
        assert!((plain.position(VertexId::new(4)).x - 0.7).abs() < 1e-12);

        let options = ProjectOptions::default().with_preserve_quality(true);
        project_surface(&mut target, &surface, &options).unwrap();
        assert!((target.position(VertexId::new(4)).x - 0.5).abs() < 1e-12);
    }
}
