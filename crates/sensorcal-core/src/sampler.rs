//! Minimal-subset samplers.
//!
//! [`UniformSampler`] backs RANSAC, LMedS and MSAC. [`ProgressiveSampler`]
//! backs PROSAC and PROMedS: it draws from a pool of the highest-quality
//! measurements that grows with the iteration count (Chum & Matas, 2005) and
//! ends up uniform over the whole set.

use rand::prelude::IndexedRandom;
use rand::{rngs::StdRng, SeedableRng};

use crate::{MeasurementStore, SamplingMode};

/// Number of samples after which the progressive pool would cover the full
/// set (`T_N` in the PROSAC paper).
pub const PROSAC_GROWTH_HORIZON: usize = 200_000;

/// Uniform sampling without replacement over `0..len`.
#[derive(Debug, Clone)]
pub struct UniformSampler {
    indices: Vec<usize>,
    subset_size: usize,
    rng: StdRng,
}

impl UniformSampler {
    pub fn new(len: usize, subset_size: usize, seed: u64) -> Self {
        debug_assert!(subset_size <= len);
        Self {
            indices: (0..len).collect(),
            subset_size,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn sample(&mut self, out: &mut Vec<usize>) {
        out.clear();
        out.extend(
            self.indices
                .as_slice()
                .choose_multiple(&mut self.rng, self.subset_size)
                .copied(),
        );
    }
}

/// Quality-ordered progressive sampling.
#[derive(Debug, Clone)]
pub struct ProgressiveSampler {
    /// Store indices sorted by descending quality.
    order: Vec<usize>,
    subset_size: usize,
    /// Current pool size `n`.
    pool: usize,
    /// `T_n`, expected number of samples drawn only from the top `n`.
    t_n: f64,
    /// `T'_n`, iteration at which the pool grows to `n + 1`.
    t_n_prime: usize,
    iteration: usize,
    rng: StdRng,
}

impl ProgressiveSampler {
    /// Build a sampler over `quality_scores.len()` measurements.
    ///
    /// Ties keep the original index order. When every score is equal the
    /// pool starts at the full set, i.e. the sampler is uniform.
    pub fn new(quality_scores: &[f64], subset_size: usize, seed: u64) -> Self {
        let len = quality_scores.len();
        debug_assert!(subset_size <= len);

        let mut order: Vec<usize> = (0..len).collect();
        order.sort_by(|&a, &b| quality_scores[b].total_cmp(&quality_scores[a]));

        let all_equal = quality_scores
            .windows(2)
            .all(|w| w[0].total_cmp(&w[1]).is_eq());

        let mut t_n = PROSAC_GROWTH_HORIZON as f64;
        for i in 0..subset_size {
            t_n *= (subset_size - i) as f64 / (len - i) as f64;
        }

        let pool = if all_equal { len } else { subset_size };
        Self {
            order,
            subset_size,
            pool,
            t_n,
            // a pool that starts full is uniform from the first draw
            t_n_prime: usize::from(pool < len),
            iteration: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Current pool size.
    pub fn pool_size(&self) -> usize {
        self.pool
    }

    /// Store indices ordered by descending quality.
    pub fn quality_order(&self) -> &[usize] {
        &self.order
    }

    pub fn sample(&mut self, out: &mut Vec<usize>) {
        self.iteration += 1;
        let len = self.order.len();
        let m = self.subset_size;

        if self.pool < len && self.iteration >= self.t_n_prime {
            let next = self.pool + 1;
            let t_next = self.t_n * next as f64 / (next - m) as f64;
            self.t_n_prime += (t_next - self.t_n).ceil().max(1.0) as usize;
            self.t_n = t_next;
            self.pool = next;
        }

        out.clear();
        if self.t_n_prime < self.iteration {
            // Pool is final: plain uniform draw from the top `pool`.
            out.extend(
                self.order[..self.pool]
                    .choose_multiple(&mut self.rng, m)
                    .copied(),
            );
        } else {
            // Newest pool member plus `m - 1` from the rest of the pool.
            let newest = self.order[self.pool - 1];
            out.extend(
                self.order[..self.pool - 1]
                    .choose_multiple(&mut self.rng, m - 1)
                    .copied(),
            );
            out.push(newest);
        }
    }
}

/// Sampling strategy selected from the method.
#[derive(Debug, Clone)]
pub enum SubsetSampler {
    Uniform(UniformSampler),
    Progressive(ProgressiveSampler),
}

impl SubsetSampler {
    /// Build the sampler for `mode`.
    ///
    /// Progressive sampling without quality scores degrades to uniform
    /// sampling; readiness checks prevent that for PROSAC and PROMedS.
    pub fn for_store<M>(
        mode: SamplingMode,
        store: &MeasurementStore<M>,
        subset_size: usize,
        seed: u64,
    ) -> Self {
        match (mode, store.quality_scores()) {
            (SamplingMode::Progressive, Some(scores)) => {
                Self::Progressive(ProgressiveSampler::new(scores, subset_size, seed))
            }
            _ => Self::Uniform(UniformSampler::new(store.len(), subset_size, seed)),
        }
    }

    /// Fill `out` with `subset_size` distinct store indices.
    pub fn sample(&mut self, out: &mut Vec<usize>) {
        match self {
            Self::Uniform(s) => s.sample(out),
            Self::Progressive(s) => s.sample(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_distinct(subset: &[usize], len: usize) {
        let mut sorted = subset.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), subset.len(), "duplicate index in {subset:?}");
        assert!(subset.iter().all(|&i| i < len));
    }

    #[test]
    fn uniform_draws_distinct_indices() {
        let mut sampler = UniformSampler::new(10, 4, 3);
        let mut out = Vec::new();
        for _ in 0..50 {
            sampler.sample(&mut out);
            assert_eq!(out.len(), 4);
            assert_distinct(&out, 10);
        }
    }

    #[test]
    fn uniform_is_reproducible() {
        let mut a = UniformSampler::new(30, 5, 99);
        let mut b = UniformSampler::new(30, 5, 99);
        let (mut sa, mut sb) = (Vec::new(), Vec::new());
        for _ in 0..20 {
            a.sample(&mut sa);
            b.sample(&mut sb);
            assert_eq!(sa, sb);
        }
    }

    #[test]
    fn full_set_subset_is_always_everything() {
        let mut sampler = UniformSampler::new(4, 4, 1);
        let mut out = Vec::new();
        sampler.sample(&mut out);
        out.sort_unstable();
        assert_eq!(out, vec![0, 1, 2, 3]);

        let mut progressive = ProgressiveSampler::new(&[0.1, 0.9, 0.5, 0.3], 4, 1);
        progressive.sample(&mut out);
        out.sort_unstable();
        assert_eq!(out, vec![0, 1, 2, 3]);
    }

    #[test]
    fn progressive_orders_by_quality_with_stable_ties() {
        let sampler = ProgressiveSampler::new(&[0.2, 0.9, 0.2, 0.5], 2, 0);
        assert_eq!(sampler.quality_order(), &[1, 3, 0, 2]);
    }

    #[test]
    fn progressive_pool_grows_monotonically_to_full_set() {
        let scores: Vec<f64> = (0..40).map(|i| 40.0 - i as f64).collect();
        let mut sampler = ProgressiveSampler::new(&scores, 3, 5);
        assert_eq!(sampler.pool_size(), 3);

        let mut out = Vec::new();
        let mut last_pool = sampler.pool_size();
        for _ in 0..2 * PROSAC_GROWTH_HORIZON {
            sampler.sample(&mut out);
            assert_eq!(out.len(), 3);
            assert_distinct(&out, 40);
            // every drawn index lies inside the current pool
            let pool = &sampler.quality_order()[..sampler.pool_size()];
            assert!(out.iter().all(|i| pool.contains(i)));
            assert!(sampler.pool_size() >= last_pool);
            last_pool = sampler.pool_size();
            if last_pool == 40 {
                break;
            }
        }
        assert_eq!(sampler.pool_size(), 40);
    }

    #[test]
    fn equal_scores_reduce_to_uniform_pool() {
        let sampler = ProgressiveSampler::new(&[1.0; 25], 4, 0);
        assert_eq!(sampler.pool_size(), 25);
    }

    #[test]
    fn progressive_prefers_top_quality_quartile() {
        let len = 100;
        let scores: Vec<f64> = (0..len).map(|i| 1.0 / (1.0 + i as f64)).collect();
        let mut sampler = ProgressiveSampler::new(&scores, 4, 11);

        let top_quartile = len / 4;
        let mut hits = 0usize;
        let mut total = 0usize;
        let mut out = Vec::new();
        for _ in 0..200 {
            sampler.sample(&mut out);
            hits += out.iter().filter(|&&i| i < top_quartile).count();
            total += out.len();
        }

        let fraction = hits as f64 / total as f64;
        assert!(
            fraction > 0.5,
            "top-quartile fraction {fraction} not above uniform expectation"
        );
    }
}
