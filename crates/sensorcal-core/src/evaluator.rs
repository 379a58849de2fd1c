use crate::{ErrorFunction, InnerSolver};

/// Per-run working buffers, allocated once per `calibrate` call.
#[derive(Debug, Default)]
pub struct Scratch {
    pub subset: Vec<usize>,
    pub residuals: Vec<f64>,
    pub sorted: Vec<f64>,
}

impl Scratch {
    pub fn with_capacity(len: usize, subset_size: usize) -> Self {
        Self {
            subset: Vec::with_capacity(subset_size),
            residuals: Vec::with_capacity(len),
            sorted: Vec::with_capacity(len),
        }
    }
}

/// Fits a candidate on a subset and scores it against every measurement.
pub struct CandidateEvaluator<'a, S: InnerSolver, F> {
    solver: &'a S,
    error_fn: &'a F,
    data: &'a [S::Measurement],
}

impl<'a, S, F> CandidateEvaluator<'a, S, F>
where
    S: InnerSolver,
    F: ErrorFunction<S::Measurement, S::Model>,
{
    pub fn new(solver: &'a S, error_fn: &'a F, data: &'a [S::Measurement]) -> Self {
        Self {
            solver,
            error_fn,
            data,
        }
    }

    /// Fit `subset` and write the residual of every measurement.
    ///
    /// A solver error is returned untouched; the caller skips the subset.
    pub fn evaluate(
        &self,
        subset: &[usize],
        initial: Option<&S::Model>,
        residuals: &mut Vec<f64>,
    ) -> anyhow::Result<S::Model> {
        let solution = self.solver.solve(self.data, subset, initial, false)?;
        self.residuals(&solution.model, residuals);
        Ok(solution.model)
    }

    /// Squared residual of every measurement; non-finite values become +inf.
    pub fn residuals(&self, model: &S::Model, out: &mut Vec<f64>) {
        out.clear();
        out.extend(self.data.iter().map(|m| {
            let r = self.error_fn.residual(m, model);
            if r.is_finite() {
                r.max(0.0)
            } else {
                f64::INFINITY
            }
        }));
    }
}
