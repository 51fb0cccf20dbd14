//! The label / smooth / project loop.
//!
//! Every round of [`ProjectionDriver::run`]:
//!
//! 1. clears and recomputes the target's surface labels,
//! 2. smooths the target once (skipped when `preserve_quality` is set),
//! 3. projects the target onto the reference, re-smoothing afterwards when
//!    `preserve_quality` is set,
//! 4. hands the target to every registered [`IterationObserver`].
//!
//! ```text
//! Idle -> Labeled -> Smoothed -> Projected -> Labeled ... -> Done
//!                 \_________________^  (preserve_quality)
//! ```
//!
//! Any error aborts the run and is returned as is. With zero iterations the
//! target is labeled once and its positions are left untouched.

use std::path::PathBuf;

use crate::error::{MeshError, Result};
use crate::io::vtk;
use crate::mesh::{HalfEdgeMesh, MeshIndex};

use super::label::{clear_labels, label_surface, FeaturePolicy, LabelOptions, LabelSummary};
use super::project::{project_pass, ProjectionReport, ReferenceSurface};
use super::smooth::{smooth_pass, SmoothMode};
use super::Progress;

/// Where a [`ProjectionDriver`] is in its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverState {
    /// Not started.
    Idle,
    /// Target labels are fresh.
    Labeled,
    /// One smoothing pass has been applied.
    Smoothed,
    /// The target lies on the reference.
    Projected,
    /// All rounds completed.
    Done,
}

/// Options for [`ProjectionDriver`].
#[derive(Debug, Clone)]
pub struct DriverOptions {
    /// Number of label / smooth / project rounds.
    pub iterations: usize,

    /// Smooth after projecting instead of before.
    pub preserve_quality: bool,

    /// How labeled vertices are allowed to move.
    pub policy: FeaturePolicy,

    /// Crease detection threshold.
    pub label: LabelOptions,

    /// Smoothing mode.
    pub mode: SmoothMode,

    /// Whether passes run on the rayon pool (default: true).
    pub parallel: bool,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            iterations: 1,
            preserve_quality: false,
            policy: FeaturePolicy::default(),
            label: LabelOptions::default(),
            mode: SmoothMode::EdgeLaplace,
            parallel: true,
        }
    }
}

impl DriverOptions {
    /// Set the number of rounds.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set whether to smooth after projecting.
    pub fn with_preserve_quality(mut self, preserve: bool) -> Self {
        self.preserve_quality = preserve;
        self
    }

    /// Set the feature policy.
    pub fn with_policy(mut self, policy: FeaturePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the labeling options.
    pub fn with_label_options(mut self, label: LabelOptions) -> Self {
        self.label = label;
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Callback invoked by [`ProjectionDriver`] as it runs.
pub trait IterationObserver<I: MeshIndex = u32> {
    /// Called after round `round` (1-based) completes.
    fn on_round(&mut self, round: usize, mesh: &HalfEdgeMesh<I>) -> Result<()>;

    /// Called on every state transition.
    fn on_state(&mut self, _state: DriverState) {}
}

/// Observer that writes the target to `<prefix>.<round>.vtk` after every round.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    prefix: String,
    written: Vec<PathBuf>,
}

impl SnapshotWriter {
    /// Write snapshots named after `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            written: Vec::new(),
        }
    }

    /// Path of the snapshot for `round`.
    pub fn path_for(&self, round: usize) -> PathBuf {
        PathBuf::from(format!("{}.{}.vtk", self.prefix, round))
    }

    /// Files written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl<I: MeshIndex> IterationObserver<I> for SnapshotWriter {
    fn on_round(&mut self, round: usize, mesh: &HalfEdgeMesh<I>) -> Result<()> {
        let path = self.path_for(round);
        vtk::save(mesh, &path)?;
        log::debug!("snapshot written to {}", path.display());
        self.written.push(path);
        Ok(())
    }
}

/// Outcome of [`ProjectionDriver::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DriverReport {
    /// Rounds completed.
    pub rounds: usize,
    /// Labels from the last labeling pass.
    pub labels: LabelSummary,
    /// Projection statistics from the last round.
    pub projection: ProjectionReport,
}

/// Runs the label / smooth / project loop against a fixed reference surface.
pub struct ProjectionDriver<'a, I: MeshIndex = u32> {
    reference: &'a ReferenceSurface<I>,
    options: DriverOptions,
    observers: Vec<Box<dyn IterationObserver<I> + 'a>>,
    progress: Progress,
    state: DriverState,
}

impl<'a, I: MeshIndex> ProjectionDriver<'a, I> {
    /// Create a driver projecting onto `reference`.
    pub fn new(reference: &'a ReferenceSurface<I>, options: DriverOptions) -> Self {
        Self {
            reference,
            options,
            observers: Vec::new(),
            progress: Progress::none(),
            state: DriverState::Idle,
        }
    }

    /// Register an observer. Observers are called in registration order.
    pub fn with_observer(mut self, observer: impl IterationObserver<I> + 'a) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    /// Report per-round progress to `progress`.
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Current state.
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Options in use.
    pub fn options(&self) -> &DriverOptions {
        &self.options
    }

    fn transition(&mut self, state: DriverState) {
        log::trace!("driver: {:?} -> {:?}", self.state, state);
        self.state = state;
        for observer in &mut self.observers {
            observer.on_state(state);
        }
    }

    /// Run every round on `target`.
    ///
    /// The boundary of `target` is extracted first if it has not been.
    ///
    /// # Errors
    ///
    /// [`MeshError::InvalidState`] if the driver has already run. Any error
    /// from labeling, smoothing, projection or an observer aborts the run.
    pub fn run(&mut self, target: &mut HalfEdgeMesh<I>) -> Result<DriverReport> {
        if self.state != DriverState::Idle {
            return Err(MeshError::InvalidState(format!(
                "driver already ran (state {:?})",
                self.state
            )));
        }
        if target.boundary().is_none() {
            target.extract_boundary();
        }

        let total = self.options.iterations;
        let mut report = DriverReport::default();

        if total == 0 {
            report.labels = self.relabel(target)?;
            self.transition(DriverState::Done);
            return Ok(report);
        }

        for round in 1..=total {
            self.progress.report(round - 1, total, "projection round");

            report.labels = self.relabel(target)?;
            let roles = self.options.policy.roles(target);
            let parallel = self.options.parallel;

            if !self.options.preserve_quality {
                let moved = smooth_pass(target, &roles, self.options.mode, parallel)?;
                log::debug!("round {}: smoothing moved up to {:.3e}", round, moved);
                self.transition(DriverState::Smoothed);
            }

            report.projection = project_pass(target, self.reference, &roles, parallel)?;
            if self.options.preserve_quality {
                let moved = smooth_pass(target, &roles, self.options.mode, parallel)?;
                log::debug!("round {}: quality smoothing moved up to {:.3e}", round, moved);
            }
            self.transition(DriverState::Projected);

            log::info!(
                "round {}/{}: projected {} vertices, max distance {:.3e}, mean {:.3e}",
                round,
                total,
                report.projection.projected,
                report.projection.max_distance,
                report.projection.mean_distance
            );

            for observer in &mut self.observers {
                observer.on_round(round, target)?;
            }
            report.rounds = round;
        }

        self.progress.report(total, total, "projection round");
        self.transition(DriverState::Done);
        Ok(report)
    }

    fn relabel(&mut self, target: &mut HalfEdgeMesh<I>) -> Result<LabelSummary> {
        clear_labels(target);
        let summary = label_surface(target, &self.options.label)?;
        log::debug!("labels: {}", summary);
        self.transition(DriverState::Labeled);
        Ok(summary)
    }
}

impl<I: MeshIndex> std::fmt::Debug for ProjectionDriver<'_, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectionDriver")
            .field("options", &self.options)
            .field("observers", &self.observers.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::label::DEFAULT_COS_ANGLE;
    use crate::mesh::{build_from_quads, build_from_triangles, VertexId, VertexLabel};
    use nalgebra::Point3;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn reference() -> ReferenceSurface {
        let vertices = vec![
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(3.0, -1.0, 0.0),
            Point3::new(3.0, 3.0, 0.0),
            Point3::new(-1.0, 3.0, 0.0),
        ];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap();
        ReferenceSurface::new(mesh, DEFAULT_COS_ANGLE).unwrap()
    }

    fn bumpy_grid() -> HalfEdgeMesh {
        let mut vertices = Vec::new();
        for j in 0..3 {
            for i in 0..3 {
                vertices.push(Point3::new(i as f64, j as f64, 0.1 * (i + j) as f64));
            }
        }
        // Off-centre but still on the plane
        vertices[4] = Point3::new(1.3, 0.8, 0.21);
        let faces = [[0, 1, 4, 3], [1, 2, 5, 4], [3, 4, 7, 6], [4, 5, 8, 7]];
        build_from_quads(&vertices, &faces).unwrap()
    }

    #[derive(Clone, Default)]
    struct Recorder {
        states: Rc<RefCell<Vec<DriverState>>>,
        rounds: Rc<RefCell<Vec<usize>>>,
    }

    impl IterationObserver for Recorder {
        fn on_round(&mut self, round: usize, _mesh: &HalfEdgeMesh) -> Result<()> {
            self.rounds.borrow_mut().push(round);
            Ok(())
        }

        fn on_state(&mut self, state: DriverState) {
            self.states.borrow_mut().push(state);
        }
    }

    #[test]
    fn test_zero_iterations_is_identity() {
        let surface = reference();
        let mut target = bumpy_grid();
        let before = target.positions();

        let mut driver = ProjectionDriver::new(&surface, DriverOptions::default().with_iterations(0));
        let report = driver.run(&mut target).unwrap();

        assert_eq!(report.rounds, 0);
        assert_eq!(driver.state(), DriverState::Done);
        let after = target.positions();
        for (a, b) in before.iter().zip(&after) {
            assert_eq!(a.x.to_bits(), b.x.to_bits());
            assert_eq!(a.y.to_bits(), b.y.to_bits());
            assert_eq!(a.z.to_bits(), b.z.to_bits());
        }
    }

    #[test]
    fn test_state_sequence() {
        let surface = reference();
        let mut target = bumpy_grid();
        let recorder = Recorder::default();

        let mut driver = ProjectionDriver::new(&surface, DriverOptions::default().with_iterations(2))
            .with_observer(recorder.clone());
        driver.run(&mut target).unwrap();

        use DriverState::*;
        assert_eq!(
            *recorder.states.borrow(),
            vec![Labeled, Smoothed, Projected, Labeled, Smoothed, Projected, Done]
        );
        assert_eq!(*recorder.rounds.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_preserve_quality_skips_pre_smoothing() {
        let surface = reference();
        let mut target = bumpy_grid();
        let recorder = Recorder::default();

        let options = DriverOptions::default().with_preserve_quality(true);
        let mut driver = ProjectionDriver::new(&surface, options).with_observer(recorder.clone());
        driver.run(&mut target).unwrap();

        use DriverState::*;
        assert_eq!(*recorder.states.borrow(), vec![Labeled, Projected, Done]);
    }

    #[test]
    fn test_target_ends_on_reference() {
        let surface = reference();
        let mut target = bumpy_grid();

        let mut driver = ProjectionDriver::new(&surface, DriverOptions::default().with_parallel(false));
        let report = driver.run(&mut target).unwrap();

        assert_eq!(report.rounds, 1);
        assert_eq!(report.projection.projected, 9);
        for v in target.vertex_ids() {
            assert_eq!(target.position(v).z, 0.0);
        }
        // Centre was smoothed back to the middle before projection
        let centre = target.position(VertexId::new(4));
        assert!((centre.x - 1.0).abs() < 1e-12);
        assert!((centre.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_spiked_interior_vertex_lands_on_reference() {
        let surface = reference();
        let mut vertices = Vec::new();
        for j in 0..3 {
            for i in 0..3 {
                vertices.push(Point3::new(i as f64, j as f64, 0.0));
            }
        }
        vertices[4].z = 0.5;
        let faces = [[0, 1, 4, 3], [1, 2, 5, 4], [3, 4, 7, 6], [4, 5, 8, 7]];
        let mut target: HalfEdgeMesh = build_from_quads(&vertices, &faces).unwrap();

        let mut driver = ProjectionDriver::new(&surface, DriverOptions::default().with_iterations(5));
        let report = driver.run(&mut target).unwrap();

        assert_eq!(report.labels.corner, 0);
        assert_eq!(report.labels.sharp_edges, 0);
        assert_eq!(target.label(VertexId::new(4)), VertexLabel::Interior);
        assert_eq!(report.projection.projected, 9);
        for v in target.vertex_ids() {
            assert!(target.position(v).z.abs() < 1e-12);
        }
    }

    struct Failing;

    impl IterationObserver for Failing {
        fn on_round(&mut self, _round: usize, _mesh: &HalfEdgeMesh) -> Result<()> {
            Err(MeshError::InvalidState("observer failed".to_string()))
        }
    }

    #[test]
    fn test_observer_error_aborts() {
        let surface = reference();
        let mut target = bumpy_grid();
        let recorder = Recorder::default();

        let mut driver = ProjectionDriver::new(&surface, DriverOptions::default().with_iterations(3))
            .with_observer(Failing)
            .with_observer(recorder.clone());
        let result = driver.run(&mut target);

        assert!(matches!(result, Err(MeshError::InvalidState(_))));
        assert!(recorder.rounds.borrow().is_empty());
        assert_eq!(driver.state(), DriverState::Projected);
    }

    #[test]
    fn test_driver_runs_once() {
        let surface = reference();
        let mut target = bumpy_grid();
        let mut driver = ProjectionDriver::new(&surface, DriverOptions::default());
        driver.run(&mut target).unwrap();
        assert!(matches!(driver.run(&mut target), Err(MeshError::InvalidState(_))));
    }

    #[test]
    fn test_snapshot_writer() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("Smooth");
        let surface = reference();
        let mut target = bumpy_grid();

        let mut writer = SnapshotWriter::new(prefix.to_string_lossy());
        writer.on_round(1, &target).unwrap();
        assert_eq!(writer.written(), &[dir.path().join("Smooth.1.vtk")]);
        assert!(writer.written()[0].exists());

        let mut driver = ProjectionDriver::new(&surface, DriverOptions::default().with_iterations(2))
            .with_observer(SnapshotWriter::new(prefix.to_string_lossy()));
        driver.run(&mut target).unwrap();
        assert!(dir.path().join("Smooth.2.vtk").exists());
    }
}
