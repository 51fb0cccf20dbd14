//! Feature-aware Laplacian smoothing.
//!
//! Each pass moves every movable vertex to the average of its neighbors. Which
//! neighbors count, and whether a vertex moves at all, is decided by its
//! [`VertexRole`]:
//!
//! - `Free` vertices average all edge-connected neighbors
//! - `Feature` and `Crease` vertices average only the neighbors across feature
//!   edges, so they slide along their boundary or crease curve
//! - `Fixed` vertices stay put
//!
//! Updates are Jacobi-style: every new position is computed from the positions
//! at the start of the pass and the whole set is committed at once, so the
//! result does not depend on vertex order and the per-vertex work can run in
//! parallel.
//!
//! # Example
//!
//! ```
//! use quadsnap::prelude::*;
//! use quadsnap::algo::label::{clear_labels, label_surface, LabelOptions};
//! use quadsnap::algo::smooth::{smooth_surface, SmoothOptions};
//! use nalgebra::Point3;
//!
//! let mut vertices = Vec::new();
//! for j in 0..3 {
//!     for i in 0..3 {
//!         vertices.push(Point3::new(i as f64, j as f64, 0.0));
//!     }
//! }
//! vertices[4].x = 1.4; // off-centre middle vertex
//! let faces = vec![[0, 1, 4, 3], [1, 2, 5, 4], [3, 4, 7, 6], [4, 5, 8, 7]];
//! let mut mesh: HalfEdgeMesh = build_from_quads(&vertices, &faces).unwrap();
//! mesh.extract_boundary();
//! clear_labels(&mut mesh);
//! label_surface(&mut mesh, &LabelOptions::default()).unwrap();
//!
//! smooth_surface(&mut mesh, &SmoothOptions::default()).unwrap();
//! assert!((mesh.position(VertexId::new(4)).x - 1.0).abs() < 1e-12);
//! ```

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use crate::error::Result;
use crate::mesh::{HalfEdgeMesh, MeshIndex, VertexId};

use super::label::{feature_neighbors, FeaturePolicy, VertexRole};
use super::Progress;

/// Neighbor weighting used by the smoother.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmoothMode {
    /// Uniform average over edge-connected neighbors.
    #[default]
    EdgeLaplace,
}

/// Options for [`smooth_surface`].
#[derive(Debug, Clone)]
pub struct SmoothOptions {
    /// Number of smoothing passes.
    pub iterations: usize,

    /// Neighbor weighting.
    pub mode: SmoothMode,

    /// How labeled vertices are allowed to move.
    pub policy: FeaturePolicy,

    /// Whether to use parallel execution (default: true).
    pub parallel: bool,
}

impl Default for SmoothOptions {
    fn default() -> Self {
        Self {
            iterations: 1,
            mode: SmoothMode::EdgeLaplace,
            policy: FeaturePolicy::default(),
            parallel: true,
        }
    }
}

impl SmoothOptions {
    /// Set the number of passes.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the feature policy.
    pub fn with_policy(mut self, policy: FeaturePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Smooth the surface of `mesh` in place.
///
/// Vertex roles are derived from the mesh's current labels once per call.
/// Unlabeled meshes treat every vertex as `Free`.
pub fn smooth_surface<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>, options: &SmoothOptions) -> Result<()> {
    smooth_surface_with_progress(mesh, options, &Progress::none())
}

/// [`smooth_surface`] with progress reporting.
pub fn smooth_surface_with_progress<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    options: &SmoothOptions,
    progress: &Progress,
) -> Result<()> {
    if options.iterations == 0 {
        return Ok(());
    }

    let roles = options.policy.roles(mesh);

    for iter in 0..options.iterations {
        progress.report(iter, options.iterations, "Laplacian smoothing");
        let moved = smooth_pass(mesh, &roles, options.mode, options.parallel)?;
        log::debug!("smoothing pass {}: max displacement {:.3e}", iter + 1, moved);
    }
    progress.report(options.iterations, options.iterations, "Laplacian smoothing");

    Ok(())
}

/// One Jacobi pass. Returns the largest displacement.
pub(crate) fn smooth_pass<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    roles: &[VertexRole],
    mode: SmoothMode,
    parallel: bool,
) -> Result<f64> {
    let num_vertices = mesh.num_vertices();
    let frozen: &HalfEdgeMesh<I> = mesh;

    let step = |i: usize| {
        let vid = VertexId::new(i);
        match mode {
            SmoothMode::EdgeLaplace => compute_laplacian_step(frozen, vid, roles[i]),
        }
    };

    let new_positions: Vec<Point3<f64>> = if parallel {
        (0..num_vertices).into_par_iter().map(step).collect()
    } else {
        (0..num_vertices).map(step).collect()
    };

    let max_displacement = frozen
        .vertex_ids()
        .zip(&new_positions)
        .map(|(v, p)| (p - frozen.position(v)).norm())
        .fold(0.0, f64::max);

    mesh.commit_positions(new_positions)?;
    Ok(max_displacement)
}

/// Average of the neighbors that `role` allows, or the current position.
fn compute_laplacian_step<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    v: VertexId<I>,
    role: VertexRole,
) -> Point3<f64> {
    let pos = *mesh.position(v);

    let (sum, count) = match role {
        VertexRole::Fixed => return pos,
        VertexRole::Free => mesh
            .vertex_neighbors(v)
            .fold((Vector3::zeros(), 0usize), |(s, c), n| (s + mesh.position(n).coords, c + 1)),
        VertexRole::Feature | VertexRole::Crease => feature_neighbors(mesh, v)
            .into_iter()
            .fold((Vector3::zeros(), 0usize), |(s, c), n| (s + mesh.position(n).coords, c + 1)),
    };

    if count == 0 {
        return pos;
    }
    Point3::from(sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::label::{clear_labels, label_surface, LabelOptions};
    use crate::mesh::{build_from_quads, build_from_triangles, VertexLabel};

    /// `n x n` quad grid, labeled with the default threshold.
    fn labeled_grid(n: usize, jitter: &[(usize, Vector3<f64>)]) -> HalfEdgeMesh {
        let mut vertices = Vec::new();
        for j in 0..=n {
            for i in 0..=n {
                vertices.push(Point3::new(i as f64, j as f64, 0.0));
            }
        }
        for (i, d) in jitter {
            vertices[*i] += *d;
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
        clear_labels(&mut mesh);
        label_surface(&mut mesh, &LabelOptions::default()).unwrap();
        mesh
    }

    #[test]
    fn test_interior_vertex_moves_to_neighbor_average() {
        let mut mesh = labeled_grid(2, &[(4, Vector3::new(0.3, -0.2, 0.5))]);
        smooth_surface(&mut mesh, &SmoothOptions::default()).unwrap();

        let p = mesh.position(VertexId::new(4));
        assert!((p - Point3::new(1.0, 1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_regular_boundary_vertex_slides_along_boundary() {
        // Vertex 1 sits on the bottom edge, shifted along it
        let mut mesh = labeled_grid(2, &[(1, Vector3::new(0.4, 0.0, 0.0))]);
        assert_eq!(mesh.label(VertexId::new(1)), VertexLabel::Regular);

        smooth_surface(&mut mesh, &SmoothOptions::default()).unwrap();

        // Averaged with boundary neighbors 0 and 2 only: stays on y = 0
        let p = mesh.position(VertexId::new(1));
        assert!((p - Point3::new(1.0, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_corners_never_move() {
        let mut mesh = labeled_grid(3, &[(5, Vector3::new(0.2, 0.1, 0.3))]);
        let policy = FeaturePolicy::default().with_sharp_feature_as_regular(false);
        let corners: Vec<_> = mesh
            .vertex_ids()
            .filter(|&v| mesh.label(v) == VertexLabel::SharpFeature)
            .collect();
        assert_eq!(corners.len(), 4);

        // With preservation on, the right-angle corners are fixed
        let options = SmoothOptions::default()
            .with_iterations(5)
            .with_policy(policy.with_preserve_sharp_feature(true));
        let before = mesh.positions();
        smooth_surface(&mut mesh, &options).unwrap();
        for v in &corners {
            assert_eq!(mesh.position(*v), &before[v.index()]);
        }
    }

    #[test]
    fn test_topological_corner_fixed_unless_demoted() {
        // Two quads pinched at vertex 2
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.2, 0.9, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
        ];
        let faces = [[0, 1, 2, 3], [2, 4, 5, 6]];
        let mut mesh: HalfEdgeMesh = build_from_quads(&vertices, &faces).unwrap();
        mesh.extract_boundary();
        clear_labels(&mut mesh);
        label_surface(&mut mesh, &LabelOptions::default()).unwrap();
        let pinch = VertexId::new(2);
        assert_eq!(mesh.label(pinch), VertexLabel::Corner);

        let mut fixed = mesh.clone();
        smooth_surface(&mut fixed, &SmoothOptions::default().with_iterations(3)).unwrap();
        assert_eq!(fixed.position(pinch), &vertices[2]);

        let demoted = SmoothOptions::default().with_policy(FeaturePolicy::default().with_corner_as_regular(true));
        smooth_surface(&mut mesh, &demoted).unwrap();
        // Mean of boundary neighbors 1, 3, 4, 6
        assert!((mesh.position(pinch) - Point3::new(1.0, 1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_jacobi_update_is_simultaneous() {
        // Vertex 1 is lifted and adjacent to vertex 4. An in-place sweep
        // would flatten 1 first and then feed z = 0 into 4.
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 2.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
        ];
        let faces = vec![[0, 1, 4], [0, 4, 3], [1, 2, 5], [1, 5, 4]];
        let mut mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();

        // No labels: every vertex is free
        let before = mesh.positions();
        let expected: Vec<Point3<f64>> = mesh
            .vertex_ids()
            .map(|v| {
                let ns: Vec<_> = mesh.vertex_neighbors(v).collect();
                let sum: Vector3<f64> = ns.iter().map(|&n| before[n.index()].coords).sum();
                Point3::from(sum / ns.len() as f64)
            })
            .collect();

        smooth_surface(&mut mesh, &SmoothOptions::default().sequential()).unwrap();
        for v in mesh.vertex_ids() {
            assert!((mesh.position(v) - expected[v.index()]).norm() < 1e-12);
        }

        // Vertex 4 saw the old z of vertex 1 (2.0), not its new one (0.0)
        assert_eq!(mesh.position(VertexId::new(1)).z, 0.0);
        let z4 = mesh.position(VertexId::new(4)).z;
        assert!((z4 - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let jitter = [
            (5, Vector3::new(0.1, 0.2, 0.3)),
            (6, Vector3::new(-0.2, 0.1, 0.0)),
            (10, Vector3::new(0.0, 0.0, -0.4)),
        ];
        let mut a = labeled_grid(4, &jitter);
        let mut b = a.clone();

        smooth_surface(&mut a, &SmoothOptions::default().with_iterations(4)).unwrap();
        smooth_surface(&mut b, &SmoothOptions::default().with_iterations(4).sequential()).unwrap();
        assert_eq!(a.positions(), b.positions());
    }

    #[test]
    fn test_zero_iterations_no_change() {
        let mut mesh = labeled_grid(2, &[(4, Vector3::new(0.3, 0.3, 0.3))]);
        let original = mesh.positions();
        smooth_surface(&mut mesh, &SmoothOptions::default().with_iterations(0)).unwrap();
        assert_eq!(mesh.positions(), original);
    }

    #[test]
    fn test_isolated_vertex_stays() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(5.0, 5.0, 5.0),
        ];
        let mut mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        smooth_surface(&mut mesh, &SmoothOptions::default()).unwrap();
        assert_eq!(mesh.position(VertexId::new(3)), &Point3::new(5.0, 5.0, 5.0));
    }
}
