// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use obq_core::{ObqError, ReproMode, prefix_sums, prefix_sums_kahan};
use std::mem::size_of;

/// Segment cost model over a sorted score slice.
///
/// Range conventions use half-open intervals: `[start, end)` over sorted
/// positions. The cache is built once per quantizer invocation and queried
/// O(num_buckets * n^2) times, so `range_cost` must be O(1).
pub trait RangeCost {
    type Cache;

    fn name(&self) -> &'static str;

    fn repro_mode(&self) -> ReproMode {
        ReproMode::Balanced
    }

    /// Builds the range-query cache over an ascending-sorted score slice.
    fn precompute(&self, sorted: &[f64]) -> Result<Self::Cache, ObqError>;

    /// Worst-case cache size in bytes, `usize::MAX` on overflow.
    fn worst_case_cache_bytes(&self, n: usize) -> usize;

    /// Cost of treating `[start, end)` as one bucket.
    ///
    /// # Panics
    ///
    /// Panics when `start >= end` or `end` exceeds the cached length.
    fn range_cost(&self, cache: &Self::Cache, start: usize, end: usize) -> f64;
}

/// L2 cost: sum of squared deviations from the range mean.
///
/// This is the exact within-bucket MSE contribution of the range, evaluated
/// as `sumSq - sum^2 / len` from prefix sums. Precision degrades for very
/// large magnitude inputs; center or scale the scores beforehand, or run
/// under [`ReproMode::Strict`] for compensated prefix accumulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct L2Cost {
    pub repro_mode: ReproMode,
}

impl L2Cost {
    pub const fn new(repro_mode: ReproMode) -> Self {
        Self { repro_mode }
    }
}

impl Default for L2Cost {
    fn default() -> Self {
        Self::new(ReproMode::Balanced)
    }
}

/// Prefix-stat cache for O(1) L2 range-cost queries.
#[derive(Clone, Debug, PartialEq)]
pub struct L2Cache {
    prefix_sum: Vec<f64>,
    prefix_sum_sq: Vec<f64>,
    n: usize,
}

impl RangeCost for L2Cost {
    type Cache = L2Cache;

    fn name(&self) -> &'static str {
        "l2"
    }

    fn repro_mode(&self) -> ReproMode {
        self.repro_mode
    }

    fn precompute(&self, sorted: &[f64]) -> Result<Self::Cache, ObqError> {
        if sorted.is_empty() {
            return Err(ObqError::invalid_argument(
                "L2Cost requires a non-empty score slice",
            ));
        }

        let squares: Vec<f64> = sorted.iter().map(|&value| value * value).collect();
        let (prefix_sum, prefix_sum_sq) = if matches!(self.repro_mode, ReproMode::Strict) {
            (prefix_sums_kahan(sorted), prefix_sums_kahan(&squares))
        } else {
            (prefix_sums(sorted), prefix_sums(&squares))
        };

        Ok(L2Cache {
            prefix_sum,
            prefix_sum_sq,
            n: sorted.len(),
        })
    }

    fn worst_case_cache_bytes(&self, n: usize) -> usize {
        let prefix_len = match n.checked_add(1) {
            Some(v) => v,
            None => return usize::MAX,
        };
        let entries = match prefix_len.checked_mul(2) {
            Some(v) => v,
            None => return usize::MAX,
        };
        match entries.checked_mul(size_of::<f64>()) {
            Some(v) => v,
            None => usize::MAX,
        }
    }

    fn range_cost(&self, cache: &Self::Cache, start: usize, end: usize) -> f64 {
        assert!(
            start < end,
            "range_cost requires start < end; got start={start}, end={end}"
        );
        assert!(
            end <= cache.n,
            "range_cost end out of bounds: end={end}, n={}",
            cache.n
        );

        let m = (end - start) as f64;
        let sum = cache.prefix_sum[end] - cache.prefix_sum[start];
        let sum_sq = cache.prefix_sum_sq[end] - cache.prefix_sum_sq[start];

        // Rounding can push the closed form a hair below zero on
        // near-constant ranges.
        (sum_sq - sum * sum / m).max(0.0)
    }
}

/// Recomputes the total within-bucket sum of squared deviations of a labeled
/// partition, in record order. Labels need not be contiguous or sorted.
pub fn partition_sse(scores: &[f64], labels: &[usize]) -> f64 {
    assert_eq!(
        scores.len(),
        labels.len(),
        "partition_sse requires one label per score: {} scores, {} labels",
        scores.len(),
        labels.len()
    );

    let bucket_count = labels.iter().copied().max().map_or(0, |max| max + 1);
    let mut counts = vec![0.0_f64; bucket_count];
    let mut sums = vec![0.0_f64; bucket_count];
    let mut sums_sq = vec![0.0_f64; bucket_count];

    for (&score, &label) in scores.iter().zip(labels) {
        counts[label] += 1.0;
        sums[label] += score;
        sums_sq[label] += score * score;
    }

    let mut total = 0.0;
    for bucket in 0..bucket_count {
        if counts[bucket] > 0.0 {
            total += (sums_sq[bucket] - sums[bucket] * sums[bucket] / counts[bucket]).max(0.0);
        }
    }
    total
}
