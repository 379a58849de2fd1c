//! Deterministic synthetic calibration datasets.
//!
//! Used by tests and for trying the estimator without hardware:
//! - reference stimuli spread over a sphere ([`sensor::fibonacci_sphere`]),
//! - bounded measurement noise ([`noise::UniformNoise`]),
//! - gross outliers at a chosen fraction, with quality scores that rank
//!   them below the clean measurements.
//!
//! Everything is seeded explicitly and ordered deterministically.
//!
//! # Example
//!
//! ```no_run
//! use sensorcal_core::synthetic::sensor::SensorScenario;
//! use sensorcal_core::{AffineModel, Mat3, Vec3};
//!
//! let truth = AffineModel { bias: Vec3::new(0.1, 0.0, -0.1), matrix: Mat3::identity(), secondary: None };
//! let data = SensorScenario::new(truth, 60, 7).with_outliers(0.3, 2.0).generate();
//! assert_eq!(data.measurements.len(), 60);
//! ```

pub mod noise;
pub mod sensor;
