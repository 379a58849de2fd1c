//! Deterministic pseudo-random streams for synthetic datasets.
//!
//! Values are derived by hashing `(seed, stream, index)` with SplitMix64, so
//! a dataset depends only on its seed and never on the `rand` version.

use crate::{Real, Vec3};

/// Uniform per-axis noise in `[-max_abs, +max_abs]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UniformNoise {
    pub seed: u64,
    pub max_abs: Real,
}

impl UniformNoise {
    pub fn new(seed: u64, max_abs: Real) -> Self {
        Self { seed, max_abs }
    }

    /// Noise vector for measurement `index`.
    pub fn sample(&self, index: usize) -> Vec3 {
        let max_abs = self.max_abs.abs();
        if max_abs == 0.0 {
            return Vec3::zeros();
        }
        symmetric_vec3(self.seed, NOISE_STREAM, index) * max_abs
    }

    pub fn apply(&self, index: usize, v: Vec3) -> Vec3 {
        v + self.sample(index)
    }
}

pub(crate) const NOISE_STREAM: u64 = 1;
pub(crate) const OUTLIER_PICK_STREAM: u64 = 2;
pub(crate) const OUTLIER_OFFSET_STREAM: u64 = 3;
pub(crate) const QUALITY_STREAM: u64 = 4;
pub(crate) const SECONDARY_STREAM: u64 = 5;

/// Uniform value in `[0, 1)`.
pub(crate) fn unit(seed: u64, stream: u64, index: usize) -> Real {
    u64_to_unit(splitmix64(mix_key(seed, stream, index)))
}

/// Vector with each component uniform in `[-1, 1)`.
pub(crate) fn symmetric_vec3(seed: u64, stream: u64, index: usize) -> Vec3 {
    let key = mix_key(seed, stream, index);
    let c = |salt: u64| 2.0 * u64_to_unit(splitmix64(key ^ salt)) - 1.0;
    Vec3::new(c(0), c(0x94D0_49BB_1331_11EB), c(0xD6E8_FEB8_6659_FD93))
}

/// Uniformly distributed unit vector.
pub(crate) fn unit_vec3(seed: u64, stream: u64, index: usize) -> Vec3 {
    let key = mix_key(seed, stream, index);
    let z = 2.0 * u64_to_unit(splitmix64(key)) - 1.0;
    let phi = std::f64::consts::TAU * u64_to_unit(splitmix64(key ^ 0x94D0_49BB_1331_11EB));
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

fn mix_key(seed: u64, stream: u64, index: usize) -> u64 {
    seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (index as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9)
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Top 53 bits as a double in `[0, 1)`.
fn u64_to_unit(x: u64) -> Real {
    (x >> 11) as Real * (1.0 / (1u64 << 53) as Real)
}
