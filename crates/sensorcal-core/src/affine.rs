//! Linear sensor model `measured = bias + matrix · reference [+ secondary · input]`.
//!
//! This is the stock collaborator for [`crate::RobustEstimator`]: an ordinary
//! least-squares [`InnerSolver`] and the matching [`ErrorFunction`]. It covers
//! the usual triaxial sensor corrections (offset, scale, cross-coupling and an
//! optional coupling to a secondary quantity such as g-sensitivity).
//!
//! Parameter vector layout, shared by the covariance matrix:
//! `[bias (3) | matrix (9 row-major, or 6 upper-triangular) | secondary (9 row-major)]`.

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};

use crate::{DMat, DVec, ErrorFunction, InnerSolver, Mat3, Real, Solution, Vec3};

/// One sample: known reference stimulus and the raw sensor reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineMeasurement {
    pub reference: Vec3,
    pub measured: Vec3,
    /// Secondary input coupled into the reading (needed when the secondary
    /// term is estimated).
    #[serde(default)]
    pub secondary: Option<Vec3>,
    /// Per-axis standard deviation of `measured`; weights the fit.
    #[serde(default)]
    pub std_dev: Option<Vec3>,
}

impl AffineMeasurement {
    pub fn new(reference: Vec3, measured: Vec3) -> Self {
        Self {
            reference,
            measured,
            secondary: None,
            std_dev: None,
        }
    }

    /// `measured − predicted` for `model`.
    pub fn prediction_error(&self, model: &AffineModel) -> Vec3 {
        self.measured - model.predict(&self.reference, self.secondary.as_ref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineModel {
    pub bias: Vec3,
    pub matrix: Mat3,
    pub secondary: Option<Mat3>,
}

impl AffineModel {
    /// Expected reading for `reference`; a missing secondary input counts as zero.
    pub fn predict(&self, reference: &Vec3, secondary_input: Option<&Vec3>) -> Vec3 {
        let mut out = self.bias + self.matrix * reference;
        if let (Some(s), Some(input)) = (self.secondary.as_ref(), secondary_input) {
            out += s * input;
        }
        out
    }
}

/// Closed-form (weighted) least-squares solver for [`AffineModel`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffineSolver {
    /// Constrain `matrix` to upper-triangular form (sensor axes aligned to a
    /// common frame).
    pub common_axis_used: bool,
    /// Estimate the `secondary` coupling matrix.
    pub estimate_secondary: bool,
}

impl AffineSolver {
    pub fn new(common_axis_used: bool, estimate_secondary: bool) -> Self {
        Self {
            common_axis_used,
            estimate_secondary,
        }
    }

    fn matrix_params(&self) -> usize {
        if self.common_axis_used {
            6
        } else {
            9
        }
    }

    fn secondary_offset(&self) -> usize {
        3 + self.matrix_params()
    }

    /// Column of matrix entry `(row, col)`, `None` when it is fixed at zero.
    fn matrix_index(&self, row: usize, col: usize) -> Option<usize> {
        if !self.common_axis_used {
            return Some(3 + 3 * row + col);
        }
        if col < row {
            return None;
        }
        // upper triangle, row-major: (0,0..3), (1,1..3), (2,2)
        let before = match row {
            0 => 0,
            1 => 3,
            _ => 5,
        };
        Some(3 + before + (col - row))
    }

    fn unpack(&self, x: &DVec) -> AffineModel {
        let bias = Vec3::new(x[0], x[1], x[2]);
        let mut matrix = Mat3::zeros();
        for r in 0..3 {
            for c in 0..3 {
                if let Some(p) = self.matrix_index(r, c) {
                    matrix[(r, c)] = x[p];
                }
            }
        }
        let secondary = self.estimate_secondary.then(|| {
            let off = self.secondary_offset();
            Mat3::from_fn(|r, c| x[off + 3 * r + c])
        });
        AffineModel {
            bias,
            matrix,
            secondary,
        }
    }
}

impl InnerSolver for AffineSolver {
    type Measurement = AffineMeasurement;
    type Model = AffineModel;

    fn model_dof(&self) -> usize {
        3 + self.matrix_params() + if self.estimate_secondary { 9 } else { 0 }
    }

    /// Rows decouple per axis; the first axis always keeps its full row
    /// (bias, three matrix entries and the secondary row when estimated).
    fn minimal_subset_size(&self) -> usize {
        if self.estimate_secondary {
            7
        } else {
            4
        }
    }

    fn solve(
        &self,
        data: &[AffineMeasurement],
        indices: &[usize],
        _initial: Option<&AffineModel>,
        keep_covariance: bool,
    ) -> Result<Solution<AffineModel>> {
        let dof = self.model_dof();
        let rows = 3 * indices.len();
        if rows < dof {
            bail!("need at least {dof} equations, got {rows}");
        }

        let used = indices
            .iter()
            .map(|&i| {
                data.get(i)
                    .ok_or_else(|| anyhow!("measurement index {i} out of range"))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut a = DMat::zeros(rows, dof);
        let mut b = DVec::zeros(rows);
        let mut weighted = false;

        for (k, m) in used.iter().enumerate() {
            let secondary = if self.estimate_secondary {
                Some(
                    m.secondary
                        .ok_or_else(|| anyhow!("measurement {} has no secondary input", indices[k]))?,
                )
            } else {
                None
            };

            for axis in 0..3 {
                let w = match m.std_dev {
                    Some(sd) => {
                        let s = sd[axis];
                        if !(s.is_finite() && s > 0.0) {
                            bail!("measurement {} has invalid std_dev {s}", indices[k]);
                        }
                        weighted = true;
                        1.0 / s
                    }
                    None => 1.0,
                };

                let r = 3 * k + axis;
                a[(r, axis)] = w;
                for col in 0..3 {
                    if let Some(p) = self.matrix_index(axis, col) {
                        a[(r, p)] = w * m.reference[col];
                    }
                }
                if let Some(input) = secondary {
                    let off = self.secondary_offset() + 3 * axis;
                    for col in 0..3 {
                        a[(r, off + col)] = w * input[col];
                    }
                }
                b[r] = w * m.measured[axis];
            }
        }

        let svd = a.clone().svd(true, true);
        let tol = svd.singular_values.max() * rows as Real * Real::EPSILON;
        let rank = svd.rank(tol);
        if rank < dof {
            bail!("singular system: rank {rank} < {dof} parameters");
        }
        let x = svd
            .solve(&b, tol)
            .map_err(|e| anyhow!("least squares failed: {e}"))?;

        let model = self.unpack(&x);
        let mut solution = Solution::new(model);
        if keep_covariance {
            let chi_sq = (&a * &x - &b).norm_squared();
            let mse = used
                .iter()
                .map(|m| m.prediction_error(&model).norm_squared())
                .sum::<Real>()
                / used.len() as Real;
            let mut covariance = (a.transpose() * &a)
                .try_inverse()
                .ok_or_else(|| anyhow!("normal matrix is not invertible"))?;
            if !weighted && rows > dof {
                covariance *= chi_sq / (rows - dof) as Real;
            }
            solution.covariance = Some(covariance);
            solution.mse = Some(mse);
            solution.chi_sq = Some(chi_sq);
        }
        Ok(solution)
    }
}

/// Squared norm of the prediction error, each axis divided by its
/// `std_dev` when given. This is the per-measurement term [`AffineSolver`]
/// minimises, so a refit on the inliers never raises their summed residual.
#[derive(Debug, Clone, Copy, Default)]
pub struct AffineError;

impl ErrorFunction<AffineMeasurement, AffineModel> for AffineError {
    fn residual(&self, m: &AffineMeasurement, model: &AffineModel) -> f64 {
        let err = m.prediction_error(model);
        match m.std_dev {
            Some(sd) => err.component_div(&sd).norm_squared(),
            None => err.norm_squared(),
        }
    }
}
