use thiserror::Error;

use crate::RobustMethod;

/// Reason why [`crate::RobustEstimator::calibrate`] refused to start.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadinessIssue {
    #[error("need at least {required} measurements, got {available}")]
    NotEnoughMeasurements { available: usize, required: usize },
    #[error("{method} requires quality scores")]
    MissingQualityScores { method: RobustMethod },
    #[error("expected {expected} quality scores, got {got}")]
    QualityScoresLength { expected: usize, got: usize },
}

/// Errors raised by the robust estimator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
    /// A parameter was rejected by its setter.
    #[error("invalid {name}: {reason}")]
    InvalidConfig { name: &'static str, reason: String },
    /// Quality scores do not match the number of measurements.
    #[error("expected {expected} quality scores, got {got}")]
    QualityScoresLength { expected: usize, got: usize },
    /// `calibrate` was called before the estimator was ready.
    #[error("estimator is not ready: {0}")]
    NotReady(#[from] ReadinessIssue),
    /// A mutation or a second `calibrate` was attempted during a run.
    #[error("estimator is locked while a calibration is running")]
    Locked,
    /// The iteration budget ran out without a single acceptable candidate.
    #[error(
        "no consensus model found after {iterations} iterations ({failed_subsets} subsets rejected by the solver)"
    )]
    NoConsensus {
        iterations: usize,
        failed_subsets: usize,
    },
}

impl CalibrationError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            name,
            reason: reason.into(),
        }
    }
}
