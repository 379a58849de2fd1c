use std::fmt;

use serde::{Deserialize, Serialize};

/// Robust estimation method.
///
/// Every method is a pairing of a [`SamplingMode`] and a [`ScoringMode`];
/// the engine itself is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RobustMethod {
    /// Random sample consensus: most inliers under a fixed threshold.
    Ransac,
    /// Least median of squares: lowest median residual.
    #[default]
    Lmeds,
    /// M-estimator sample consensus: lowest truncated residual sum.
    Msac,
    /// Progressive sample consensus: RANSAC with quality-ordered sampling.
    Prosac,
    /// Progressive least median of squares.
    Promeds,
}

/// How minimal subsets are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMode {
    /// Uniform without replacement over all measurements.
    Uniform,
    /// Quality-ordered pool that grows toward the full set.
    Progressive,
}

/// How a candidate is scored against all measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringMode {
    /// Inlier count under `threshold²`, ties broken by residual sum.
    InlierCount,
    /// Sum of residuals truncated at `threshold²`.
    TruncatedSum,
    /// Median residual; inliers derived from the robust scale afterwards.
    Median,
}

impl RobustMethod {
    pub const ALL: [RobustMethod; 5] = [
        RobustMethod::Ransac,
        RobustMethod::Lmeds,
        RobustMethod::Msac,
        RobustMethod::Prosac,
        RobustMethod::Promeds,
    ];

    pub fn sampling(self) -> SamplingMode {
        match self {
            Self::Ransac | Self::Lmeds | Self::Msac => SamplingMode::Uniform,
            Self::Prosac | Self::Promeds => SamplingMode::Progressive,
        }
    }

    pub fn scoring(self) -> ScoringMode {
        match self {
            Self::Ransac | Self::Prosac => ScoringMode::InlierCount,
            Self::Msac => ScoringMode::TruncatedSum,
            Self::Lmeds | Self::Promeds => ScoringMode::Median,
        }
    }

    pub fn requires_quality_scores(self) -> bool {
        self.sampling() == SamplingMode::Progressive
    }

    /// Smallest measurement count for which the method can run.
    ///
    /// Median methods additionally need `n > model_dof` for the robust scale
    /// correction `1 + 5 / (n - dof)`.
    pub fn minimum_required_measurements(self, subset_size: usize, model_dof: usize) -> usize {
        match self.scoring() {
            ScoringMode::Median => subset_size.max(model_dof + 1),
            ScoringMode::InlierCount | ScoringMode::TruncatedSum => subset_size,
        }
    }
}

impl fmt::Display for RobustMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ransac => "RANSAC",
            Self::Lmeds => "LMedS",
            Self::Msac => "MSAC",
            Self::Prosac => "PROSAC",
            Self::Promeds => "PROMedS",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_scores_only_for_progressive_methods() {
        let needing: Vec<_> = RobustMethod::ALL
            .into_iter()
            .filter(|m| m.requires_quality_scores())
            .collect();
        assert_eq!(needing, vec![RobustMethod::Prosac, RobustMethod::Promeds]);
    }

    #[test]
    fn median_methods_need_more_than_dof() {
        assert_eq!(RobustMethod::Ransac.minimum_required_measurements(4, 12), 4);
        assert_eq!(RobustMethod::Msac.minimum_required_measurements(5, 12), 5);
        assert_eq!(RobustMethod::Lmeds.minimum_required_measurements(4, 12), 13);
        assert_eq!(RobustMethod::Promeds.minimum_required_measurements(20, 12), 20);
    }
}
