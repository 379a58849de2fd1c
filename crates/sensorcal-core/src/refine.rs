//! Final re-fit of the best candidate over its inliers.

use log::warn;

use crate::{DMat, InliersData, InnerSolver};

/// Final output of a successful calibration.
#[derive(Debug, Clone)]
pub struct EstimationResult<M> {
    pub model: M,
    /// Parameter covariance; `None` unless refinement ran with
    /// `keep_covariance` and the solver reported one.
    pub covariance: Option<DMat>,
    pub mse: Option<f64>,
    pub chi_sq: Option<f64>,
    /// `false` when refinement was disabled or fell back to the sampled
    /// candidate.
    pub refined: bool,
    /// Sampling iterations performed.
    pub iterations: usize,
    /// Subsets the inner solver rejected.
    pub failed_subsets: usize,
}

/// Re-runs the inner solver on every inlier of the best candidate.
pub struct Refiner<'a, S: InnerSolver> {
    solver: &'a S,
    data: &'a [S::Measurement],
    refine_result: bool,
    keep_covariance: bool,
}

impl<'a, S: InnerSolver> Refiner<'a, S> {
    pub fn new(
        solver: &'a S,
        data: &'a [S::Measurement],
        refine_result: bool,
        keep_covariance: bool,
    ) -> Self {
        Self {
            solver,
            data,
            refine_result,
            keep_covariance,
        }
    }

    /// Refine `best`; on failure the sampled candidate is returned unrefined
    /// and without diagnostics.
    pub fn refine(
        &self,
        best: S::Model,
        inliers: &InliersData,
        iterations: usize,
        failed_subsets: usize,
    ) -> EstimationResult<S::Model> {
        let unrefined = |model| EstimationResult {
            model,
            covariance: None,
            mse: None,
            chi_sq: None,
            refined: false,
            iterations,
            failed_subsets,
        };

        if !self.refine_result {
            return unrefined(best);
        }

        let indices = inliers.inlier_indices();
        if indices.len() < self.solver.minimal_subset_size() {
            warn!(
                "refinement skipped: {} inliers, solver needs {}",
                indices.len(),
                self.solver.minimal_subset_size()
            );
            return unrefined(best);
        }

        match self
            .solver
            .solve(self.data, &indices, Some(&best), self.keep_covariance)
        {
            Ok(solution) => {
                let keep = self.keep_covariance;
                EstimationResult {
                    model: solution.model,
                    covariance: solution.covariance.filter(|_| keep),
                    mse: solution.mse.filter(|_| keep),
                    chi_sq: solution.chi_sq.filter(|_| keep),
                    refined: true,
                    iterations,
                    failed_subsets,
                }
            }
            Err(err) => {
                warn!(
                    "refinement over {} inliers failed, keeping sampled model: {err:#}",
                    indices.len()
                );
                unrefined(best)
            }
        }
    }
}
