//! Adaptive iteration budget.

/// Number of iterations needed to draw at least one outlier-free subset with
/// probability `confidence`, given an inlier ratio `inlier_ratio`.
///
/// `N = ceil(ln(1 - p) / ln(1 - w^m))`, clamped to `[1, max_iters]`.
pub fn required_iterations(
    confidence: f64,
    inlier_ratio: f64,
    subset_size: usize,
    max_iters: usize,
) -> usize {
    let max_iters = max_iters.max(1);
    if confidence <= 0.0 {
        return 1;
    }
    if confidence >= 1.0 || inlier_ratio <= 0.0 {
        return max_iters;
    }

    let w_m = inlier_ratio.min(1.0).powi(subset_size as i32);
    if 1.0 - w_m <= f64::EPSILON {
        return 1;
    }

    let denom = (1.0 - w_m).ln();
    if denom >= 0.0 {
        return max_iters;
    }

    let n_iter = ((1.0 - confidence).ln() / denom).ceil();
    if !n_iter.is_finite() || n_iter >= max_iters as f64 {
        return max_iters;
    }
    (n_iter as usize).clamp(1, max_iters)
}

/// Tracks iterations against the adaptive and hard budgets.
#[derive(Debug, Clone)]
pub struct IterationController {
    confidence: f64,
    max_iterations: usize,
    subset_size: usize,
    required: usize,
    iterations: usize,
    single_subset: bool,
}

impl IterationController {
    /// A store that is exactly one subset large has a single possible
    /// sample, so the budget is one iteration.
    pub fn new(confidence: f64, max_iterations: usize, subset_size: usize, len: usize) -> Self {
        let max_iterations = max_iterations.max(1);
        let single_subset = len <= subset_size;
        Self {
            confidence,
            max_iterations,
            subset_size,
            required: if single_subset { 1 } else { max_iterations },
            iterations: 0,
            single_subset,
        }
    }

    pub fn should_continue(&self) -> bool {
        self.iterations < self.required.min(self.max_iterations)
    }

    pub fn record_iteration(&mut self) {
        self.iterations += 1;
    }

    /// Recompute the budget after a new best candidate with `inlier_ratio`.
    pub fn update(&mut self, inlier_ratio: f64) {
        if self.single_subset {
            return;
        }
        self.required = required_iterations(
            self.confidence,
            inlier_ratio,
            self.subset_size,
            self.max_iterations,
        );
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Current budget (adaptive, capped by `max_iterations`).
    pub fn required(&self) -> usize {
        self.required.min(self.max_iterations)
    }

    /// Fraction of the current budget consumed, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        (self.iterations as f64 / self.required() as f64).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn textbook_iteration_counts() {
        // w = 0.5, m = 4, p = 0.99 -> ln(0.01) / ln(1 - 1/16) = 71.35
        assert_eq!(required_iterations(0.99, 0.5, 4, 5000), 72);
        assert_eq!(required_iterations(0.99, 0.5, 4, 50), 50);
    }

    #[test]
    fn degenerate_ratios() {
        assert_eq!(required_iterations(0.99, 1.0, 4, 5000), 1);
        assert_eq!(required_iterations(0.99, 0.0, 4, 5000), 5000);
        assert_eq!(required_iterations(1.0, 0.7, 4, 5000), 5000);
        assert_eq!(required_iterations(0.0, 0.7, 4, 5000), 1);
    }

    #[test]
    fn controller_stops_at_adaptive_budget() {
        let mut ctl = IterationController::new(0.99, 1000, 4, 100);
        assert_eq!(ctl.required(), 1000);
        ctl.record_iteration();
        ctl.update(0.5);
        assert_eq!(ctl.required(), 72);
        while ctl.should_continue() {
            ctl.record_iteration();
        }
        assert_eq!(ctl.iterations(), 72);
    }

    #[test]
    fn perfect_inliers_stop_after_first_iteration() {
        let mut ctl = IterationController::new(0.99, 1000, 4, 100);
        assert!(ctl.should_continue());
        ctl.record_iteration();
        ctl.update(1.0);
        assert!(!ctl.should_continue());
    }

    #[test]
    fn single_subset_store_runs_once() {
        let mut ctl = IterationController::new(0.99, 1000, 4, 4);
        assert!(ctl.should_continue());
        ctl.record_iteration();
        ctl.update(0.25);
        assert!(!ctl.should_continue());
        assert_eq!(ctl.progress(), 1.0);
    }
}
