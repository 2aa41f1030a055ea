// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::assign::{dedup_boundaries, labels_for};
use crate::cost::partition_sse;
use obq_core::{
    BucketPartition, Diagnostics, ExecutionContext, ObqError, Quantizer, ScoreSeries,
};
use std::borrow::Cow;
use std::time::Instant;

/// Configuration for [`EqualFrequencyQuantizer`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EqualFrequencyConfig {
    pub num_buckets: usize,
}

impl Default for EqualFrequencyConfig {
    fn default() -> Self {
        Self { num_buckets: 1 }
    }
}

impl EqualFrequencyConfig {
    fn validate(&self) -> Result<(), ObqError> {
        if self.num_buckets < 1 {
            return Err(ObqError::invalid_argument(
                "num_buckets must be >= 1; got 0",
            ));
        }
        Ok(())
    }
}

/// Heuristic baseline: cuts at ascending rank positions `i * n / num_buckets`.
///
/// Boundaries are data points (the first value of each rank slice). Heavy
/// duplication can land several cuts on one value; dedup then shrinks the
/// effective bucket count, reported as a warning.
#[derive(Debug)]
pub struct EqualFrequencyQuantizer {
    config: EqualFrequencyConfig,
}

impl EqualFrequencyQuantizer {
    pub fn new(config: EqualFrequencyConfig) -> Result<Self, ObqError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EqualFrequencyConfig {
        &self.config
    }
}

impl Quantizer for EqualFrequencyQuantizer {
    fn quantize(
        &self,
        x: &ScoreSeries<'_>,
        ctx: &ExecutionContext<'_>,
    ) -> Result<BucketPartition, ObqError> {
        self.config.validate()?;

        let num_buckets = self.config.num_buckets;
        let n = x.n;
        if num_buckets > n {
            return Err(ObqError::invalid_argument(format!(
                "num_buckets={num_buckets} exceeds record count n={n}"
            )));
        }

        let started_at = Instant::now();
        let scores = x.to_f64_vec();

        let mut sorted = scores.clone();
        sorted.sort_unstable_by(f64::total_cmp);

        let candidates: Vec<f64> = (1..num_buckets)
            .map(|i| sorted[i * n / num_buckets])
            .collect();
        let boundaries = dedup_boundaries(candidates);

        let mut warnings = vec![];
        if boundaries.len() < num_buckets - 1 {
            warnings.push(format!(
                "duplicate rank cuts collapsed after dedup: requested {num_buckets} buckets, partition distinguishes {}",
                boundaries.len() + 1
            ));
        }

        let labels = labels_for(&scores, &boundaries);
        let objective = partition_sse(&scores, &labels);

        let runtime_ms = u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX);
        ctx.record_scalar("quantize.freq.runtime_ms", runtime_ms as f64);
        ctx.report_progress(1.0);

        let diagnostics = Diagnostics {
            n,
            requested_buckets: num_buckets,
            effective_buckets: boundaries.len() + 1,
            runtime_ms: Some(runtime_ms),
            objective: Some(objective),
            notes: vec![format!("num_buckets={num_buckets}")],
            warnings,
            algorithm: Cow::Borrowed("equal_frequency"),
            cost_model: Cow::Borrowed("l2"),
            ..Diagnostics::default()
        };

        BucketPartition::new(n, boundaries, labels, diagnostics)
    }
}
