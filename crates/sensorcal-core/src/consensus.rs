//! Candidate scoring and inlier classification.

use crate::{median_in_place, ScoringMode};

/// Consistency constant of the median absolute deviation for Gaussian noise.
pub const MEDIAN_SCALE_FACTOR: f64 = 1.4826;
/// Multiple of the robust scale below which a residual is an inlier.
pub const MEDIAN_INLIER_FACTOR: f64 = 2.5;
const RESIDUAL_ULPS: f64 = 4.0;

/// Fitness of a candidate model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fitness {
    /// Inlier count (higher is better), ties broken by the lower sum of
    /// inlier residuals.
    Consensus { inliers: usize, residual_sum: f64 },
    /// Cost to minimise: truncated residual sum or median residual.
    Cost(f64),
}

impl Fitness {
    /// Strict comparison; equal fitness never wins.
    pub fn is_better_than(&self, other: &Fitness) -> bool {
        match (self, other) {
            (
                Fitness::Consensus {
                    inliers,
                    residual_sum,
                },
                Fitness::Consensus {
                    inliers: other_inliers,
                    residual_sum: other_sum,
                },
            ) => {
                inliers > other_inliers || (inliers == other_inliers && residual_sum < other_sum)
            }
            (Fitness::Cost(cost), Fitness::Cost(other_cost)) => cost < other_cost,
            _ => false,
        }
    }
}

/// Inlier mask and the bound that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub mask: Vec<bool>,
    pub num_inliers: usize,
    /// Squared residual bound; `r <= bound` is an inlier.
    pub bound: f64,
    /// Robust scale estimate σ̂ (median scoring only).
    pub robust_scale: Option<f64>,
}

impl Classification {
    pub fn inlier_ratio(&self) -> f64 {
        if self.mask.is_empty() {
            return 0.0;
        }
        self.num_inliers as f64 / self.mask.len() as f64
    }
}

/// Inliers of the best candidate together with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct InliersData {
    /// `true` for every measurement consistent with the best candidate.
    pub mask: Vec<bool>,
    /// Squared residuals of every measurement against the best candidate.
    pub residuals: Vec<f64>,
    pub num_inliers: usize,
    pub fitness: Fitness,
    /// Subset whose fit produced the best candidate.
    pub subset: Vec<usize>,
    /// Squared residual bound used for the mask.
    pub bound: f64,
    /// Robust scale estimate σ̂ (median methods only).
    pub robust_scale: Option<f64>,
}

impl InliersData {
    /// Store indices of the inliers, in ascending order.
    pub fn inlier_indices(&self) -> Vec<usize> {
        self.mask
            .iter()
            .enumerate()
            .filter_map(|(i, &inlier)| inlier.then_some(i))
            .collect()
    }
}

/// Converts residuals into a fitness score and an inlier mask.
#[derive(Debug, Clone, Copy)]
pub struct ConsensusSelector {
    mode: ScoringMode,
    threshold_sq: f64,
    model_dof: usize,
}

impl ConsensusSelector {
    pub fn new(mode: ScoringMode, stop_threshold: f64, model_dof: usize) -> Self {
        Self {
            mode,
            threshold_sq: stop_threshold * stop_threshold,
            model_dof,
        }
    }

    pub fn mode(&self) -> ScoringMode {
        self.mode
    }

    /// Score a candidate from the squared residuals of every measurement.
    ///
    /// `scratch` is reused across calls to avoid reallocating for the median.
    pub fn fitness(&self, residuals: &[f64], scratch: &mut Vec<f64>) -> Fitness {
        let t2 = self.threshold_sq;
        match self.mode {
            ScoringMode::InlierCount => {
                let (inliers, residual_sum) = residuals
                    .iter()
                    .filter(|&&r| r <= t2)
                    .fold((0usize, 0.0), |(n, sum), &r| (n + 1, sum + r));
                Fitness::Consensus {
                    inliers,
                    residual_sum,
                }
            }
            ScoringMode::TruncatedSum => Fitness::Cost(residuals.iter().map(|&r| r.min(t2)).sum()),
            ScoringMode::Median => {
                scratch.clear();
                scratch.extend_from_slice(residuals);
                Fitness::Cost(median_in_place(scratch).unwrap_or(f64::INFINITY))
            }
        }
    }

    /// Build the inlier mask for a scored candidate.
    ///
    /// Median scoring derives the bound from the robust scale
    /// `1.4826 · (1 + 5 / (n − dof)) · √median` alone; the stop threshold only
    /// ends the search. The bound is floored at rounding level relative to
    /// the largest residual so that exact fits keep their zero residuals.
    pub fn classify(&self, residuals: &[f64], fitness: &Fitness) -> Classification {
        let (bound, robust_scale) = match (self.mode, fitness) {
            (ScoringMode::Median, Fitness::Cost(median)) => {
                let scale = robust_scale(*median, residuals.len(), self.model_dof);
                let k_sigma = MEDIAN_INLIER_FACTOR * scale;
                ((k_sigma * k_sigma).max(rounding_floor(residuals)), Some(scale))
            }
            _ => (self.threshold_sq, None),
        };

        let mask: Vec<bool> = residuals.iter().map(|&r| r <= bound).collect();
        let num_inliers = mask.iter().filter(|&&m| m).count();
        Classification {
            mask,
            num_inliers,
            bound,
            robust_scale,
        }
    }

    /// Whether a classified candidate counts as a consensus at all.
    ///
    /// Threshold scoring requires the candidate to explain at least a full
    /// subset; median scoring always produces a usable candidate.
    pub fn accepts(&self, classification: &Classification, subset_size: usize) -> bool {
        match self.mode {
            ScoringMode::Median => true,
            ScoringMode::InlierCount | ScoringMode::TruncatedSum => {
                classification.num_inliers >= subset_size
            }
        }
    }

    /// Median scoring stops as soon as the median drops to the threshold.
    pub fn is_converged(&self, fitness: &Fitness) -> bool {
        match (self.mode, fitness) {
            (ScoringMode::Median, Fitness::Cost(median)) => *median <= self.threshold_sq,
            _ => false,
        }
    }
}

/// Smallest squared residual distinguishable from zero at the scale of
/// `residuals`.
fn rounding_floor(residuals: &[f64]) -> f64 {
    let largest = residuals
        .iter()
        .copied()
        .filter(|r| r.is_finite())
        .fold(0.0, f64::max);
    RESIDUAL_ULPS * f64::EPSILON * largest
}

/// Robust standard deviation implied by a median of squared residuals.
pub fn robust_scale(median_sq: f64, n: usize, model_dof: usize) -> f64 {
    let redundancy = n.saturating_sub(model_dof).max(1) as f64;
    MEDIAN_SCALE_FACTOR * (1.0 + 5.0 / redundancy) * median_sq.max(0.0).sqrt()
}
