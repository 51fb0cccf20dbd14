//! Progress callbacks for the smoothing and projection loops.
//!
//! ```
//! use quadsnap::algo::Progress;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let calls = Arc::new(AtomicUsize::new(0));
//! let seen = Arc::clone(&calls);
//! let progress = Progress::new(move |step| {
//!     assert!(step.fraction() <= 1.0);
//!     seen.fetch_add(1, Ordering::Relaxed);
//! });
//!
//! progress.report(1, 4, "projection round");
//! assert_eq!(calls.load(Ordering::Relaxed), 1);
//! ```

/// One progress update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step<'a> {
    /// Steps completed so far.
    pub current: usize,
    /// Total number of steps, 0 if unknown.
    pub total: usize,
    /// What is running.
    pub stage: &'a str,
}

impl Step<'_> {
    /// Completed fraction in [0, 1]. Unknown totals report 0.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.current.min(self.total)) as f64 / self.total as f64
        }
    }

    /// Whether this is the final update of its stage.
    pub fn is_finished(&self) -> bool {
        self.total > 0 && self.current >= self.total
    }
}

/// Receiver for [`Step`] updates.
pub struct Progress {
    callback: Option<Box<dyn Fn(Step<'_>) + Send + Sync>>,
}

impl Progress {
    /// Forward every update to `callback`.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(Step<'_>) + Send + Sync + 'static,
    {
        Self {
            callback: Some(Box::new(callback)),
        }
    }

    /// Discard all updates.
    pub fn none() -> Self {
        Self { callback: None }
    }

    /// Send updates to the `log` facade at trace level.
    pub fn logging() -> Self {
        Self::new(|step| log::trace!("{}: {}/{}", step.stage, step.current, step.total))
    }

    /// Whether updates go anywhere.
    pub fn is_enabled(&self) -> bool {
        self.callback.is_some()
    }

    /// Report that `current` of `total` steps of `stage` are done.
    #[inline]
    pub fn report(&self, current: usize, total: usize, stage: &str) {
        if let Some(callback) = &self.callback {
            callback(Step {
                current,
                total,
                stage,
            });
        }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_fraction() {
        let step = Step {
            current: 3,
            total: 4,
            stage: "x",
        };
        assert_eq!(step.fraction(), 0.75);
        assert!(!step.is_finished());

        let unknown = Step {
            current: 3,
            total: 0,
            stage: "x",
        };
        assert_eq!(unknown.fraction(), 0.0);
        assert!(!unknown.is_finished());
    }

    #[test]
    fn test_callback_receives_updates() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let progress = Progress::new(move |step| {
            sink.lock().unwrap().push((step.current, step.total, step.stage.to_string()));
        });
        assert!(progress.is_enabled());

        progress.report(0, 2, "smoothing");
        progress.report(2, 2, "smoothing");

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1], (2, 2, "smoothing".to_string()));
    }

    #[test]
    fn test_none_is_silent() {
        let progress = Progress::none();
        assert!(!progress.is_enabled());
        progress.report(1, 1, "ignored");
    }
}
