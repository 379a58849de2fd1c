//! Synthetic triaxial sensor readings for an [`AffineModel`].

use super::noise::{
    symmetric_vec3, unit, unit_vec3, UniformNoise, OUTLIER_OFFSET_STREAM, OUTLIER_PICK_STREAM,
    QUALITY_STREAM, SECONDARY_STREAM,
};
use crate::{AffineMeasurement, AffineModel, Real, Vec3};

/// `n` points of radius `radius` spread evenly over a sphere.
pub fn fibonacci_sphere(n: usize, radius: Real) -> Vec<Vec3> {
    let golden_angle = std::f64::consts::PI * (3.0 - 5.0_f64.sqrt());
    (0..n)
        .map(|i| {
            let y = 1.0 - 2.0 * (i as Real + 0.5) / n as Real;
            let r = (1.0 - y * y).max(0.0).sqrt();
            let theta = golden_angle * i as Real;
            Vec3::new(r * theta.cos(), y, r * theta.sin()) * radius
        })
        .collect()
}

/// Ground truth plus corruption settings for one dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorScenario {
    pub model: AffineModel,
    pub count: usize,
    /// Norm of the reference stimuli.
    pub radius: Real,
    pub noise: UniformNoise,
    /// Fraction of measurements replaced by gross outliers, in `[0, 1]`.
    pub outlier_fraction: Real,
    /// Minimum norm of the offset added to an outlier.
    pub outlier_magnitude: Real,
    pub seed: u64,
}

/// Generated measurements with the ground truth corruption labels.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticDataset {
    pub measurements: Vec<AffineMeasurement>,
    /// Higher for clean measurements.
    pub quality_scores: Vec<Real>,
    pub outliers: Vec<bool>,
}

impl SyntheticDataset {
    pub fn inlier_indices(&self) -> Vec<usize> {
        self.outliers
            .iter()
            .enumerate()
            .filter_map(|(i, &o)| (!o).then_some(i))
            .collect()
    }
}

impl SensorScenario {
    /// Noise-free, outlier-free scenario on the unit sphere.
    pub fn new(model: AffineModel, count: usize, seed: u64) -> Self {
        Self {
            model,
            count,
            radius: 1.0,
            noise: UniformNoise::new(seed, 0.0),
            outlier_fraction: 0.0,
            outlier_magnitude: 1.0,
            seed,
        }
    }

    pub fn with_radius(mut self, radius: Real) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_noise(mut self, max_abs: Real) -> Self {
        self.noise = UniformNoise::new(self.seed, max_abs);
        self
    }

    pub fn with_outliers(mut self, fraction: Real, magnitude: Real) -> Self {
        self.outlier_fraction = fraction.clamp(0.0, 1.0);
        self.outlier_magnitude = magnitude;
        self
    }

    /// Indices picked as outliers: exactly `round(fraction * count)` of them.
    fn outlier_mask(&self) -> Vec<bool> {
        let n_out = (self.outlier_fraction * self.count as Real).round() as usize;
        let mut order: Vec<usize> = (0..self.count).collect();
        order.sort_by(|&a, &b| {
            unit(self.seed, OUTLIER_PICK_STREAM, a)
                .total_cmp(&unit(self.seed, OUTLIER_PICK_STREAM, b))
        });
        let mut mask = vec![false; self.count];
        for &i in order.iter().take(n_out) {
            mask[i] = true;
        }
        mask
    }

    pub fn generate(&self) -> SyntheticDataset {
        let references = fibonacci_sphere(self.count, self.radius);
        let outliers = self.outlier_mask();
        let mut measurements = Vec::with_capacity(self.count);
        let mut quality_scores = Vec::with_capacity(self.count);

        for (i, reference) in references.into_iter().enumerate() {
            let secondary = self
                .model
                .secondary
                .map(|_| symmetric_vec3(self.seed, SECONDARY_STREAM, i));
            let mut measured = self
                .noise
                .apply(i, self.model.predict(&reference, secondary.as_ref()));

            let u = unit(self.seed, QUALITY_STREAM, i);
            let score = if outliers[i] {
                let scale = 1.0 + unit(self.seed, OUTLIER_OFFSET_STREAM, i);
                measured += unit_vec3(self.seed, OUTLIER_OFFSET_STREAM, i)
                    * (self.outlier_magnitude * scale);
                0.5 * u
            } else {
                0.4 + 0.6 * u
            };

            measurements.push(AffineMeasurement {
                reference,
                measured,
                secondary,
                std_dev: None,
            });
            quality_scores.push(score);
        }

        SyntheticDataset {
            measurements,
            quality_scores,
            outliers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AffineError, ErrorFunction, Mat3};

    fn truth() -> AffineModel {
        AffineModel {
            bias: Vec3::new(0.1, -0.05, 0.2),
            matrix: Mat3::new(1.01, 0.02, 0.0, -0.01, 0.99, 0.03, 0.0, 0.01, 1.02),
            secondary: None,
        }
    }

    #[test]
    fn sphere_points_have_requested_radius() {
        let pts = fibonacci_sphere(40, 9.81);
        assert_eq!(pts.len(), 40);
        for p in &pts {
            assert!((p.norm() - 9.81).abs() < 1e-9);
        }
    }

    #[test]
    fn outlier_count_matches_fraction() {
        let data = SensorScenario::new(truth(), 50, 3)
            .with_outliers(0.3, 1.0)
            .generate();
        assert_eq!(data.outliers.iter().filter(|&&o| o).count(), 15);
        assert_eq!(data.inlier_indices().len(), 35);

        for (i, m) in data.measurements.iter().enumerate() {
            let r = AffineError.residual(m, &truth());
            if data.outliers[i] {
                assert!(r >= 1.0 - 1e-9);
            } else {
                assert!(r < 1e-20);
            }
        }
    }

    #[test]
    fn quality_scores_rank_clean_measurements_higher() {
        let data = SensorScenario::new(truth(), 40, 11)
            .with_outliers(0.25, 1.0)
            .generate();
        let mean = |outlier: bool| {
            let vals: Vec<f64> = data
                .quality_scores
                .iter()
                .zip(&data.outliers)
                .filter(|(_, o)| **o == outlier)
                .map(|(&q, _)| q)
                .collect();
            vals.iter().sum::<f64>() / vals.len() as f64
        };
        assert!(mean(false) > mean(true));
    }

    #[test]
    fn generation_is_deterministic() {
        let s = SensorScenario::new(truth(), 20, 5)
            .with_noise(1e-3)
            .with_outliers(0.2, 0.5);
        assert_eq!(s.generate(), s.generate());
        assert_ne!(s.generate(), SensorScenario { seed: 6, ..s }.generate());
    }
}
