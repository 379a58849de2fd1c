use crate::{ErrorFunction, InnerSolver, RobustEstimator};

/// Life-cycle callbacks of [`RobustEstimator::calibrate`].
///
/// Callbacks run synchronously on the calibrating thread while the
/// estimator is locked: every mutating call on `estimator` from inside a
/// callback fails with [`crate::CalibrationError::Locked`].
pub trait CalibrationListener<S, F>
where
    S: InnerSolver,
    F: ErrorFunction<S::Measurement, S::Model>,
{
    fn on_start(&mut self, _estimator: &RobustEstimator<S, F>) {}

    /// Called after the run, on success and on failure alike.
    fn on_end(&mut self, _estimator: &RobustEstimator<S, F>) {}

    /// Called once per sampling iteration, starting at 0.
    fn on_next_iteration(&mut self, _estimator: &RobustEstimator<S, F>, _iteration: usize) {}

    /// Called when progress advanced by at least `progress_delta`.
    fn on_progress_change(&mut self, _estimator: &RobustEstimator<S, F>, _progress: f64) {}
}

/// Emits progress only when it moved by at least `delta`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ProgressThrottle {
    delta: f64,
    last: f64,
}

impl ProgressThrottle {
    pub(crate) fn new(delta: f64) -> Self {
        Self { delta, last: 0.0 }
    }

    pub(crate) fn advance(&mut self, progress: f64) -> Option<f64> {
        if progress > self.last && progress - self.last >= self.delta {
            self.last = progress;
            Some(progress)
        } else {
            None
        }
    }
}
