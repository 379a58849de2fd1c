//! Configuration of the robust estimator.

use serde::{Deserialize, Serialize};

use crate::CalibrationError;

/// Configuration parameters for the robust estimator.
///
/// Each field is validated when it is set on a [`crate::RobustEstimator`],
/// never deferred to `calibrate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobustOptions {
    /// Minimum progress increment in `[0, 1]` between two progress
    /// notifications.
    pub progress_delta: f64,
    /// Probability in `[0, 1]` that at least one sampled subset is
    /// outlier-free; sizes the adaptive iteration budget.
    pub confidence: f64,
    /// Hard cap on sampling iterations.
    pub max_iterations: usize,
    /// Residual threshold (same units as the square root of a residual).
    ///
    /// Inlier bound for threshold methods, early stop level for median
    /// methods.
    pub stop_threshold: f64,
    /// Subset size; `None` uses the solver's minimal subset size.
    pub preliminary_subset_size: Option<usize>,
    /// Re-fit the best candidate on all of its inliers.
    pub refine_result: bool,
    /// Ask the solver for covariance, MSE and chi-square during refinement.
    pub keep_covariance: bool,
    /// Random-number generator seed (for reproducibility).
    pub seed: u64,
}

impl Default for RobustOptions {
    fn default() -> Self {
        Self {
            progress_delta: 0.05,
            confidence: 0.99,
            max_iterations: 5000,
            stop_threshold: 1e-2,
            preliminary_subset_size: None,
            refine_result: true,
            keep_covariance: true,
            seed: 1_234_567,
        }
    }
}

impl RobustOptions {
    /// Subset size actually used for a solver with `minimal_subset_size`.
    pub fn subset_size(&self, minimal_subset_size: usize) -> usize {
        self.preliminary_subset_size.unwrap_or(minimal_subset_size)
    }

    /// Check every field; `minimal_subset_size` comes from the solver.
    pub fn validate(&self, minimal_subset_size: usize) -> Result<(), CalibrationError> {
        check_progress_delta(self.progress_delta)?;
        check_confidence(self.confidence)?;
        check_max_iterations(self.max_iterations)?;
        check_stop_threshold(self.stop_threshold)?;
        if let Some(size) = self.preliminary_subset_size {
            check_subset_size(size, minimal_subset_size)?;
        }
        Ok(())
    }
}

pub(crate) fn check_progress_delta(value: f64) -> Result<(), CalibrationError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(CalibrationError::invalid(
            "progress_delta",
            format!("{value} is outside [0, 1]"),
        ));
    }
    Ok(())
}

pub(crate) fn check_confidence(value: f64) -> Result<(), CalibrationError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(CalibrationError::invalid(
            "confidence",
            format!("{value} is outside [0, 1]"),
        ));
    }
    Ok(())
}

pub(crate) fn check_max_iterations(value: usize) -> Result<(), CalibrationError> {
    if value == 0 {
        return Err(CalibrationError::invalid("max_iterations", "must be at least 1"));
    }
    Ok(())
}

pub(crate) fn check_stop_threshold(value: f64) -> Result<(), CalibrationError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(CalibrationError::invalid(
            "stop_threshold",
            format!("{value} is not a positive finite number"),
        ));
    }
    Ok(())
}

pub(crate) fn check_subset_size(value: usize, minimal: usize) -> Result<(), CalibrationError> {
    if value < minimal {
        return Err(CalibrationError::invalid(
            "preliminary_subset_size",
            format!("{value} is below the minimal subset size {minimal}"),
        ));
    }
    Ok(())
}
