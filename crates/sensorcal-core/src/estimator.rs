//! Robust estimator orchestrating sampling, scoring and refinement.
//!
//! A single [`RobustEstimator`] covers RANSAC, LMedS, MSAC, PROSAC and
//! PROMedS; the [`RobustMethod`] picks the sampling and scoring strategies.
//! The estimator is reconfigured through `&self` setters, which all fail with
//! [`CalibrationError::Locked`] while [`RobustEstimator::calibrate`] runs,
//! including when called from a [`CalibrationListener`] callback.

use std::cell::{Cell, Ref, RefCell};

use log::{debug, info, warn};

use crate::consensus::{ConsensusSelector, InliersData};
use crate::controller::IterationController;
use crate::evaluator::{CandidateEvaluator, Scratch};
use crate::listener::{CalibrationListener, ProgressThrottle};
use crate::options::{
    check_confidence, check_max_iterations, check_progress_delta, check_stop_threshold,
    check_subset_size,
};
use crate::refine::{EstimationResult, Refiner};
use crate::sampler::SubsetSampler;
use crate::{
    CalibrationError, DMat, ErrorFunction, InnerSolver, MeasurementStore, ReadinessIssue,
    RobustMethod, RobustOptions,
};

/// Listener as stored by the estimator.
pub type BoxedListener<S, F> = Box<dyn CalibrationListener<S, F>>;

/// Robust calibration engine over an [`InnerSolver`] and an [`ErrorFunction`].
pub struct RobustEstimator<S, F>
where
    S: InnerSolver,
    F: ErrorFunction<S::Measurement, S::Model>,
{
    method: RobustMethod,
    solver: RefCell<S>,
    error_fn: F,
    store: RefCell<MeasurementStore<S::Measurement>>,
    options: Cell<RobustOptions>,
    initial_model: RefCell<Option<S::Model>>,
    listener: RefCell<Option<BoxedListener<S, F>>>,
    result: RefCell<Option<EstimationResult<S::Model>>>,
    inliers: RefCell<Option<InliersData>>,
    running: Cell<bool>,
}

/// Clears the running flag on every exit path of `calibrate`.
struct RunningGuard<'a>(&'a Cell<bool>);

impl<'a> RunningGuard<'a> {
    fn engage(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl<S, F> RobustEstimator<S, F>
where
    S: InnerSolver,
    F: ErrorFunction<S::Measurement, S::Model>,
{
    /// Estimator with default options.
    pub fn new(method: RobustMethod, solver: S, error_fn: F) -> Self {
        Self {
            method,
            solver: RefCell::new(solver),
            error_fn,
            store: RefCell::new(MeasurementStore::default()),
            options: Cell::new(RobustOptions::default()),
            initial_model: RefCell::new(None),
            listener: RefCell::new(None),
            result: RefCell::new(None),
            inliers: RefCell::new(None),
            running: Cell::new(false),
        }
    }

    /// Estimator for `method` with validated `options`.
    pub fn create(
        method: RobustMethod,
        solver: S,
        error_fn: F,
        options: RobustOptions,
    ) -> Result<Self, CalibrationError> {
        options.validate(solver.minimal_subset_size())?;
        let estimator = Self::new(method, solver, error_fn);
        estimator.options.set(options);
        Ok(estimator)
    }

    pub fn method(&self) -> RobustMethod {
        self.method
    }

    pub fn options(&self) -> RobustOptions {
        self.options.get()
    }

    pub fn solver(&self) -> Ref<'_, S> {
        self.solver.borrow()
    }

    pub fn measurements(&self) -> Ref<'_, [S::Measurement]> {
        Ref::map(self.store.borrow(), |s| s.measurements())
    }

    pub fn measurements_len(&self) -> usize {
        self.store.borrow().len()
    }

    pub fn quality_scores(&self) -> Option<Vec<f64>> {
        self.store.borrow().quality_scores().map(<[f64]>::to_vec)
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Subset size used for sampling.
    pub fn subset_size(&self) -> usize {
        let minimal = self.solver.borrow().minimal_subset_size();
        self.options.get().subset_size(minimal)
    }

    pub fn minimum_required_measurements(&self) -> usize {
        let model_dof = self.solver.borrow().model_dof();
        self.method
            .minimum_required_measurements(self.subset_size(), model_dof)
    }

    /// Why the estimator cannot run yet, if anything.
    pub fn readiness(&self) -> Result<(), ReadinessIssue> {
        let required = self.minimum_required_measurements();
        let store = self.store.borrow();
        if store.len() < required {
            return Err(ReadinessIssue::NotEnoughMeasurements {
                available: store.len(),
                required,
            });
        }
        if self.method.requires_quality_scores() {
            match store.quality_scores() {
                None => {
                    return Err(ReadinessIssue::MissingQualityScores {
                        method: self.method,
                    })
                }
                Some(scores) if scores.len() != store.len() => {
                    return Err(ReadinessIssue::QualityScoresLength {
                        expected: store.len(),
                        got: scores.len(),
                    })
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.readiness().is_ok()
    }

    // ---- results -----------------------------------------------------

    pub fn result(&self) -> Option<EstimationResult<S::Model>> {
        self.result.borrow().clone()
    }

    pub fn estimated_model(&self) -> Option<S::Model> {
        self.result.borrow().as_ref().map(|r| r.model.clone())
    }

    pub fn estimated_covariance(&self) -> Option<DMat> {
        self.result.borrow().as_ref().and_then(|r| r.covariance.clone())
    }

    pub fn estimated_mse(&self) -> Option<f64> {
        self.result.borrow().as_ref().and_then(|r| r.mse)
    }

    pub fn estimated_chi_sq(&self) -> Option<f64> {
        self.result.borrow().as_ref().and_then(|r| r.chi_sq)
    }

    pub fn inliers_data(&self) -> Option<InliersData> {
        self.inliers.borrow().clone()
    }

    // ---- configuration -----------------------------------------------

    fn assert_idle(&self) -> Result<(), CalibrationError> {
        if self.running.get() {
            return Err(CalibrationError::Locked);
        }
        Ok(())
    }

    fn invalidate(&self) {
        self.result.replace(None);
        self.inliers.replace(None);
    }

    fn update_options(
        &self,
        update: impl FnOnce(&mut RobustOptions) -> Result<(), CalibrationError>,
    ) -> Result<(), CalibrationError> {
        self.assert_idle()?;
        let mut options = self.options.get();
        update(&mut options)?;
        self.options.set(options);
        self.invalidate();
        Ok(())
    }

    pub fn set_measurements(&self, data: Vec<S::Measurement>) -> Result<(), CalibrationError> {
        self.assert_idle()?;
        self.store.borrow_mut().set_measurements(data);
        self.invalidate();
        Ok(())
    }

    pub fn set_quality_scores(&self, scores: Option<Vec<f64>>) -> Result<(), CalibrationError> {
        self.assert_idle()?;
        self.store.borrow_mut().set_quality_scores(scores)?;
        self.invalidate();
        Ok(())
    }

    pub fn set_measurements_with_quality(
        &self,
        data: Vec<S::Measurement>,
        scores: Vec<f64>,
    ) -> Result<(), CalibrationError> {
        self.assert_idle()?;
        self.store.borrow_mut().set_with_quality(data, scores)?;
        self.invalidate();
        Ok(())
    }

    pub fn set_options(&self, options: RobustOptions) -> Result<(), CalibrationError> {
        let minimal = self.solver.borrow().minimal_subset_size();
        self.update_options(|o| {
            options.validate(minimal)?;
            *o = options;
            Ok(())
        })
    }

    pub fn set_progress_delta(&self, value: f64) -> Result<(), CalibrationError> {
        self.update_options(|o| {
            check_progress_delta(value)?;
            o.progress_delta = value;
            Ok(())
        })
    }

    pub fn set_confidence(&self, value: f64) -> Result<(), CalibrationError> {
        self.update_options(|o| {
            check_confidence(value)?;
            o.confidence = value;
            Ok(())
        })
    }

    pub fn set_max_iterations(&self, value: usize) -> Result<(), CalibrationError> {
        self.update_options(|o| {
            check_max_iterations(value)?;
            o.max_iterations = value;
            Ok(())
        })
    }

    pub fn set_stop_threshold(&self, value: f64) -> Result<(), CalibrationError> {
        self.update_options(|o| {
            check_stop_threshold(value)?;
            o.stop_threshold = value;
            Ok(())
        })
    }

    /// `None` restores the solver's minimal subset size.
    pub fn set_preliminary_subset_size(&self, value: Option<usize>) -> Result<(), CalibrationError> {
        let minimal = self.solver.borrow().minimal_subset_size();
        self.update_options(|o| {
            if let Some(size) = value {
                check_subset_size(size, minimal)?;
            }
            o.preliminary_subset_size = value;
            Ok(())
        })
    }

    pub fn set_refine_result(&self, value: bool) -> Result<(), CalibrationError> {
        self.update_options(|o| {
            o.refine_result = value;
            Ok(())
        })
    }

    pub fn set_keep_covariance(&self, value: bool) -> Result<(), CalibrationError> {
        self.update_options(|o| {
            o.keep_covariance = value;
            Ok(())
        })
    }

    pub fn set_seed(&self, value: u64) -> Result<(), CalibrationError> {
        self.update_options(|o| {
            o.seed = value;
            Ok(())
        })
    }

    /// Model hint handed to the solver for every subset fit.
    pub fn set_initial_model(&self, model: Option<S::Model>) -> Result<(), CalibrationError> {
        self.assert_idle()?;
        self.initial_model.replace(model);
        self.invalidate();
        Ok(())
    }

    /// Change solver-side settings (model structure hints).
    ///
    /// Rejected if the new solver needs a larger subset than the configured
    /// preliminary subset size.
    pub fn configure_solver(&self, configure: impl FnOnce(&mut S)) -> Result<(), CalibrationError>
    where
        S: Clone,
    {
        self.assert_idle()?;
        let mut solver = self.solver.borrow().clone();
        configure(&mut solver);
        self.options.get().validate(solver.minimal_subset_size())?;
        self.solver.replace(solver);
        self.invalidate();
        Ok(())
    }

    pub fn set_listener(&self, listener: Option<BoxedListener<S, F>>) -> Result<(), CalibrationError> {
        self.assert_idle()?;
        self.listener.replace(listener);
        Ok(())
    }

    // ---- calibration -------------------------------------------------

    fn notify(&self, call: impl FnOnce(&mut BoxedListener<S, F>)) {
        if let Some(listener) = self.listener.borrow_mut().as_mut() {
            call(listener);
        }
    }

    /// Run the robust estimation.
    ///
    /// On success the model, covariance and inliers are available through the
    /// getters until the next configuration change. The estimator is idle
    /// again when this returns, whatever the outcome.
    pub fn calibrate(&self) -> Result<(), CalibrationError> {
        self.assert_idle()?;
        self.readiness()?;

        let _running = RunningGuard::engage(&self.running);
        self.invalidate();

        self.notify(|l| l.on_start(self));
        let outcome = self.run();
        let status = match outcome {
            Ok((result, inliers)) => {
                info!(
                    "{} finished after {} iterations: {} of {} inliers, refined = {}",
                    self.method,
                    result.iterations,
                    inliers.num_inliers,
                    inliers.mask.len(),
                    result.refined
                );
                self.result.replace(Some(result));
                self.inliers.replace(Some(inliers));
                Ok(())
            }
            Err(err) => {
                warn!("{} calibration failed: {err}", self.method);
                Err(err)
            }
        };
        self.notify(|l| l.on_end(self));
        status
    }

    fn run(&self) -> Result<(EstimationResult<S::Model>, InliersData), CalibrationError> {
        let options = self.options.get();
        let store = self.store.borrow();
        let solver = self.solver.borrow();
        let initial = self.initial_model.borrow().clone();

        let data = store.measurements();
        let len = data.len();
        let subset_size = options.subset_size(solver.minimal_subset_size());

        let mut sampler =
            SubsetSampler::for_store(self.method.sampling(), &*store, subset_size, options.seed);
        let selector = ConsensusSelector::new(
            self.method.scoring(),
            options.stop_threshold,
            solver.model_dof(),
        );
        let evaluator = CandidateEvaluator::new(&*solver, &self.error_fn, data);
        let mut controller = IterationController::new(
            options.confidence,
            options.max_iterations,
            subset_size,
            len,
        );
        let mut progress = ProgressThrottle::new(options.progress_delta);
        let mut scratch = Scratch::with_capacity(len, subset_size);

        let mut best: Option<(S::Model, InliersData)> = None;
        let mut failed_subsets = 0usize;

        while controller.should_continue() {
            let iteration = controller.iterations();
            self.notify(|l| l.on_next_iteration(self, iteration));

            sampler.sample(&mut scratch.subset);
            controller.record_iteration();

            let mut converged = false;
            match evaluator.evaluate(&scratch.subset, initial.as_ref(), &mut scratch.residuals) {
                Err(err) => {
                    failed_subsets += 1;
                    debug!(
                        "iteration {iteration}: subset {:?} rejected by solver: {err:#}",
                        scratch.subset
                    );
                }
                Ok(model) => {
                    let fitness = selector.fitness(&scratch.residuals, &mut scratch.sorted);
                    let improves = best
                        .as_ref()
                        .map_or(true, |(_, b)| fitness.is_better_than(&b.fitness));
                    if improves {
                        let cls = selector.classify(&scratch.residuals, &fitness);
                        if selector.accepts(&cls, subset_size) {
                            debug!(
                                "iteration {iteration}: new best {fitness:?} with {} inliers",
                                cls.num_inliers
                            );
                            controller.update(cls.inlier_ratio());
                            best = Some((
                                model,
                                InliersData {
                                    num_inliers: cls.num_inliers,
                                    mask: cls.mask,
                                    residuals: scratch.residuals.clone(),
                                    fitness,
                                    subset: scratch.subset.clone(),
                                    bound: cls.bound,
                                    robust_scale: cls.robust_scale,
                                },
                            ));
                        }
                    }
                    converged = best
                        .as_ref()
                        .is_some_and(|(_, b)| selector.is_converged(&b.fitness));
                }
            }

            if let Some(p) = progress.advance(controller.progress()) {
                self.notify(|l| l.on_progress_change(self, p));
            }
            if converged {
                debug!("iteration {iteration}: median residual below stop threshold");
                break;
            }
        }

        let iterations = controller.iterations();
        let Some((model, inliers)) = best else {
            return Err(CalibrationError::NoConsensus {
                iterations,
                failed_subsets,
            });
        };

        let refiner = Refiner::new(
            &*solver,
            data,
            options.refine_result,
            options.keep_covariance,
        );
        let result = refiner.refine(model, &inliers, iterations, failed_subsets);
        Ok((result, inliers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Solution;
    use std::rc::Rc;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct LineModel {
        slope: f64,
        intercept: f64,
    }

    /// Least-squares line fit; subsets with a single distinct x are singular.
    #[derive(Debug, Clone, Default)]
    struct LineSolver {
        calls: Rc<Cell<usize>>,
        fail_always: bool,
    }

    impl InnerSolver for LineSolver {
        type Measurement = (f64, f64);
        type Model = LineModel;

        fn model_dof(&self) -> usize {
            2
        }

        fn minimal_subset_size(&self) -> usize {
            2
        }

        fn solve(
            &self,
            data: &[(f64, f64)],
            indices: &[usize],
            _initial: Option<&LineModel>,
            keep_covariance: bool,
        ) -> anyhow::Result<Solution<LineModel>> {
            self.calls.set(self.calls.get() + 1);
            if self.fail_always {
                anyhow::bail!("solver disabled");
            }
            let n = indices.len() as f64;
            let (mut sx, mut sy, mut sxx, mut sxy) = (0.0, 0.0, 0.0, 0.0);
            for &i in indices {
                let (x, y) = data[i];
                sx += x;
                sy += y;
                sxx += x * x;
                sxy += x * y;
            }
            let denom = n * sxx - sx * sx;
            if denom.abs() < 1e-12 {
                anyhow::bail!("singular line fit");
            }
            let slope = (n * sxy - sx * sy) / denom;
            let model = LineModel {
                slope,
                intercept: (sy - slope * sx) / n,
            };
            let mut solution = Solution::new(model);
            if keep_covariance {
                let sse: f64 = indices
                    .iter()
                    .map(|&i| LineError.residual(&data[i], &model))
                    .sum();
                solution.mse = Some(sse / n);
                solution.chi_sq = Some(sse);
                solution.covariance = Some(DMat::identity(2, 2));
            }
            Ok(solution)
        }
    }

    struct LineError;

    impl ErrorFunction<(f64, f64), LineModel> for LineError {
        fn residual(&self, &(x, y): &(f64, f64), m: &LineModel) -> f64 {
            (m.slope * x + m.intercept - y).powi(2)
        }
    }

    fn line_data() -> Vec<(f64, f64)> {
        let mut data: Vec<(f64, f64)> = (0..10)
            .map(|i| {
                let x = i as f64 * 0.5;
                (x, 2.0 * x + 1.0)
            })
            .collect();
        // Gross outliers
        data.push((5.0, -3.0));
        data.push((6.0, 10.0));
        data.push((7.0, -8.0));
        data
    }

    fn estimator(method: RobustMethod, solver: LineSolver) -> RobustEstimator<LineSolver, LineError> {
        let est = RobustEstimator::new(method, solver, LineError);
        est.set_measurements(line_data()).unwrap();
        est
    }

    #[test]
    fn readiness_follows_measurement_count() {
        let est = RobustEstimator::new(RobustMethod::Ransac, LineSolver::default(), LineError);
        assert!(!est.is_ready());
        est.set_measurements(vec![(0.0, 1.0)]).unwrap();
        assert_eq!(
            est.readiness(),
            Err(ReadinessIssue::NotEnoughMeasurements {
                available: 1,
                required: 2
            })
        );
        est.set_measurements(vec![(0.0, 1.0), (1.0, 3.0)]).unwrap();
        assert!(est.is_ready());

        let lmeds = RobustEstimator::new(RobustMethod::Lmeds, LineSolver::default(), LineError);
        lmeds.set_measurements(vec![(0.0, 1.0), (1.0, 3.0)]).unwrap();
        assert!(!lmeds.is_ready(), "LMedS needs more than dof measurements");
        assert!(matches!(
            lmeds.calibrate(),
            Err(CalibrationError::NotReady(
                ReadinessIssue::NotEnoughMeasurements { .. }
            ))
        ));
    }

    #[test]
    fn progressive_methods_need_matching_quality_scores() {
        let est = estimator(RobustMethod::Prosac, LineSolver::default());
        assert_eq!(
            est.readiness(),
            Err(ReadinessIssue::MissingQualityScores {
                method: RobustMethod::Prosac
            })
        );
        assert!(matches!(
            est.set_quality_scores(Some(vec![1.0; 3])),
            Err(CalibrationError::QualityScoresLength { .. })
        ));
        est.set_quality_scores(Some(vec![1.0; 13])).unwrap();
        assert!(est.is_ready());

        est.set_measurements(line_data()[..12].to_vec()).unwrap();
        assert_eq!(
            est.readiness(),
            Err(ReadinessIssue::QualityScoresLength {
                expected: 12,
                got: 13
            })
        );
    }

    #[test]
    fn recovers_line_for_every_method() {
        for method in RobustMethod::ALL {
            let est = estimator(method, LineSolver::default());
            est.set_quality_scores(Some((0..13).map(|i| 13.0 - i as f64).collect()))
                .unwrap();
            est.calibrate().unwrap();

            let model = est.estimated_model().unwrap();
            assert!((model.slope - 2.0).abs() < 1e-9, "{method}: {model:?}");
            assert!((model.intercept - 1.0).abs() < 1e-9, "{method}: {model:?}");

            let inliers = est.inliers_data().unwrap();
            assert_eq!(inliers.inlier_indices(), (0..10).collect::<Vec<_>>());
            assert!(est.estimated_covariance().is_some());
            assert!(!est.is_running());
        }
    }

    #[test]
    fn setters_clear_previous_results() {
        let est = estimator(RobustMethod::Ransac, LineSolver::default());
        est.calibrate().unwrap();
        assert!(est.estimated_model().is_some());
        est.set_stop_threshold(0.5).unwrap();
        assert!(est.estimated_model().is_none());
        assert!(est.inliers_data().is_none());
    }

    #[test]
    fn invalid_values_are_rejected_at_set_time() {
        let est = estimator(RobustMethod::Msac, LineSolver::default());
        assert!(est.set_confidence(1.5).is_err());
        assert!(est.set_progress_delta(-0.1).is_err());
        assert!(est.set_max_iterations(0).is_err());
        assert!(est.set_stop_threshold(-1.0).is_err());
        assert!(est.set_preliminary_subset_size(Some(1)).is_err());
        assert_eq!(est.options(), RobustOptions::default());

        est.set_preliminary_subset_size(Some(3)).unwrap();
        assert_eq!(est.subset_size(), 3);
    }

    #[test]
    fn all_failing_subsets_raise_no_consensus() {
        let solver = LineSolver {
            fail_always: true,
            ..Default::default()
        };
        let calls = solver.calls.clone();
        let est = estimator(RobustMethod::Ransac, solver);
        est.set_max_iterations(25).unwrap();

        let err = est.calibrate().unwrap_err();
        assert_eq!(
            err,
            CalibrationError::NoConsensus {
                iterations: 25,
                failed_subsets: 25
            }
        );
        assert_eq!(calls.get(), 25);
        assert!(est.estimated_model().is_none());
        assert!(!est.is_running());
    }

    #[test]
    fn impossible_threshold_exhausts_budget_without_looping_forever() {
        let solver = LineSolver::default();
        let calls = solver.calls.clone();
        let est = RobustEstimator::new(RobustMethod::Ransac, solver, LineError);
        // points off any common line: every candidate explains only its own pair
        est.set_measurements(vec![(0.0, 0.0), (1.0, 5.0), (2.0, -3.0), (3.0, 9.0)])
            .unwrap();
        est.set_preliminary_subset_size(Some(3)).unwrap();
        est.set_stop_threshold(1e-9).unwrap();
        est.set_max_iterations(40).unwrap();

        assert!(matches!(
            est.calibrate(),
            Err(CalibrationError::NoConsensus { iterations: 40, .. })
        ));
        assert!(calls.get() <= 40);
    }

    #[test]
    fn disabled_refinement_keeps_sampled_candidate() {
        let est = estimator(RobustMethod::Ransac, LineSolver::default());
        est.set_refine_result(false).unwrap();
        est.calibrate().unwrap();
        let result = est.result().unwrap();
        assert!(!result.refined);
        assert!(result.covariance.is_none());
        assert!(result.mse.is_none());
    }

    #[test]
    fn covariance_can_be_skipped() {
        let est = estimator(RobustMethod::Lmeds, LineSolver::default());
        est.set_keep_covariance(false).unwrap();
        est.calibrate().unwrap();
        let result = est.result().unwrap();
        assert!(result.refined);
        assert!(est.estimated_covariance().is_none());
        assert!(est.estimated_mse().is_none());
        assert!(est.estimated_chi_sq().is_none());
    }

    #[test]
    fn single_subset_store_runs_one_iteration() {
        let est = RobustEstimator::new(RobustMethod::Ransac, LineSolver::default(), LineError);
        est.set_measurements(vec![(0.0, 1.0), (1.0, 3.0)]).unwrap();
        est.calibrate().unwrap();
        assert_eq!(est.result().unwrap().iterations, 1);
    }

    #[derive(Default)]
    struct Recorder {
        events: Rc<RefCell<Vec<String>>>,
    }

    impl CalibrationListener<LineSolver, LineError> for Recorder {
        fn on_start(&mut self, est: &RobustEstimator<LineSolver, LineError>) {
            assert!(est.is_running());
            self.events.borrow_mut().push("start".into());
        }

        fn on_end(&mut self, est: &RobustEstimator<LineSolver, LineError>) {
            assert!(est.is_running());
            self.events.borrow_mut().push("end".into());
        }

        fn on_next_iteration(&mut self, est: &RobustEstimator<LineSolver, LineError>, iteration: usize) {
            assert!(est.is_running());
            assert_eq!(est.set_measurements(Vec::new()), Err(CalibrationError::Locked));
            assert_eq!(est.set_confidence(0.5), Err(CalibrationError::Locked));
            assert_eq!(est.set_quality_scores(None), Err(CalibrationError::Locked));
            assert_eq!(est.set_initial_model(None), Err(CalibrationError::Locked));
            assert_eq!(est.configure_solver(|_| {}), Err(CalibrationError::Locked));
            assert_eq!(est.set_listener(None), Err(CalibrationError::Locked));
            assert_eq!(est.calibrate(), Err(CalibrationError::Locked));
            assert_eq!(est.measurements_len(), 13);
            self.events.borrow_mut().push(format!("iteration {iteration}"));
        }

        fn on_progress_change(&mut self, est: &RobustEstimator<LineSolver, LineError>, progress: f64) {
            assert!(est.is_running());
            assert!((0.0..=1.0).contains(&progress));
            self.events.borrow_mut().push("progress".into());
        }
    }

    #[test]
    fn listener_callbacks_see_a_locked_estimator() {
        let est = estimator(RobustMethod::Ransac, LineSolver::default());
        let recorder = Recorder::default();
        let events = recorder.events.clone();
        est.set_listener(Some(Box::new(recorder))).unwrap();

        est.calibrate().unwrap();
        assert!(!est.is_running());

        let events = events.borrow();
        assert_eq!(events.first().map(String::as_str), Some("start"));
        assert_eq!(events.last().map(String::as_str), Some("end"));
        assert_eq!(events.get(1).map(String::as_str), Some("iteration 0"));
        let iterations = events.iter().filter(|e| e.starts_with("iteration")).count();
        assert_eq!(iterations, est.result().unwrap().iterations);
        assert!(events.iter().any(|e| e == "progress"));

        // unlocked again after the run
        est.set_confidence(0.95).unwrap();
    }

    #[test]
    fn identical_seeds_give_identical_results() {
        let run = || {
            let est = estimator(RobustMethod::Msac, LineSolver::default());
            est.set_seed(42).unwrap();
            est.calibrate().unwrap();
            (est.estimated_model().unwrap(), est.inliers_data().unwrap())
        };
        let (m1, i1) = run();
        let (m2, i2) = run();
        assert_eq!(m1.slope.to_bits(), m2.slope.to_bits());
        assert_eq!(m1.intercept.to_bits(), m2.intercept.to_bits());
        assert_eq!(i1, i2);
    }
}
