//! Surface labeling, smoothing and projection.
//!
//! - [`label`]: boundary and crease detection, vertex labels, feature policy
//! - [`smooth`]: feature-aware Jacobi Laplacian smoothing
//! - [`project`]: closest-point projection onto a reference surface
//! - [`driver`]: the label / smooth / project loop
//!
//! Long-running operations accept a [`Progress`] callback.

pub mod driver;
pub mod label;
pub mod progress;
pub mod project;
pub mod smooth;

pub use progress::{Progress, Step};
