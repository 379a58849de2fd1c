//! Collaborator interfaces consumed by the robust estimator.
//!
//! The engine knows nothing about the physical model. A calibrator plugs in
//! an [`InnerSolver`] (ordinary, non-robust fit over a set of measurements)
//! and an [`ErrorFunction`] (per-measurement residual for a candidate).

use crate::DMat;

/// Output of a single [`InnerSolver::solve`] call.
#[derive(Debug, Clone)]
pub struct Solution<M> {
    pub model: M,
    /// Covariance of the estimated parameters, when requested and available.
    pub covariance: Option<DMat>,
    /// Mean squared residual over the measurements used for the fit.
    pub mse: Option<f64>,
    /// Chi-square statistic of the fit.
    pub chi_sq: Option<f64>,
}

impl<M> Solution<M> {
    /// A bare solution carrying only the model.
    pub fn new(model: M) -> Self {
        Self {
            model,
            covariance: None,
            mse: None,
            chi_sq: None,
        }
    }
}

/// Ordinary least-squares fit used on minimal subsets and for refinement.
pub trait InnerSolver {
    type Measurement;
    type Model: Clone;

    /// Number of free parameters of the model.
    fn model_dof(&self) -> usize;

    /// Smallest number of measurements that determines the model.
    fn minimal_subset_size(&self) -> usize;

    /// Fit a model to `data[indices]`.
    ///
    /// `initial` is a hint (best candidate so far, or a user supplied model);
    /// closed-form solvers may ignore it. Diagnostics are only expected when
    /// `keep_covariance` is set. Return an error for degenerate or singular
    /// subsets; the engine skips them.
    fn solve(
        &self,
        data: &[Self::Measurement],
        indices: &[usize],
        initial: Option<&Self::Model>,
        keep_covariance: bool,
    ) -> anyhow::Result<Solution<Self::Model>>;
}

/// Residual of one measurement against a candidate model.
pub trait ErrorFunction<M, Model> {
    /// Non-negative **squared** error, compared against `stop_threshold²`.
    fn residual(&self, measurement: &M, model: &Model) -> f64;
}
