//! Robust estimation engine for sensor calibration.
//!
//! This crate contains:
//! - a generic robust estimator ([`RobustEstimator`]) supporting RANSAC,
//!   LMedS, MSAC, PROSAC and PROMedS over any model that plugs in an
//!   [`InnerSolver`] and an [`ErrorFunction`],
//! - the building blocks it is made of (subset samplers, consensus scoring,
//!   adaptive iteration control, final refinement),
//! - a linear triaxial sensor model ([`AffineSolver`]) as a ready-made
//!   collaborator,
//! - deterministic synthetic datasets ([`synthetic`]).
//!
//! Pipeline of one run:
//! `sample subset -> fit candidate -> score all residuals -> keep best -> refine on inliers`

/// Linear triaxial sensor model and its least-squares solver.
pub mod affine;
/// Candidate scoring and inlier classification.
pub mod consensus;
/// Adaptive iteration budget.
pub mod controller;
mod error;
/// Robust estimator orchestrating a calibration run.
pub mod estimator;
/// Candidate fitting and residual evaluation.
pub mod evaluator;
/// Progress callbacks.
pub mod listener;
/// Linear algebra type aliases and helpers.
pub mod math;
/// Robust method selection.
pub mod method;
/// Run options and their validation.
pub mod options;
/// Final re-fit on the inliers.
pub mod refine;
/// Random subset selection, uniform and quality-guided.
pub mod sampler;
mod store;
/// Deterministic synthetic datasets.
pub mod synthetic;
/// Collaborator traits.
pub mod traits;

pub use affine::*;
pub use consensus::*;
pub use controller::*;
pub use error::*;
pub use estimator::*;
pub use evaluator::*;
pub use listener::CalibrationListener;
pub use math::*;
pub use method::*;
pub use options::RobustOptions;
pub use refine::*;
pub use sampler::*;
pub use store::*;
pub use traits::*;
