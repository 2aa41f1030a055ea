// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::assign::{dedup_boundaries, labels_for};
use crate::cost::partition_sse;
use obq_core::{
    BucketPartition, Diagnostics, ExecutionContext, ObqError, Quantizer, ScoreSeries,
};
use std::borrow::Cow;
use std::time::Instant;

/// Configuration for [`EqualWidthQuantizer`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EqualWidthConfig {
    pub num_buckets: usize,
}

impl Default for EqualWidthConfig {
    fn default() -> Self {
        Self { num_buckets: 1 }
    }
}

impl EqualWidthConfig {
    fn validate(&self) -> Result<(), ObqError> {
        if self.num_buckets < 1 {
            return Err(ObqError::invalid_argument(
                "num_buckets must be >= 1; got 0",
            ));
        }
        Ok(())
    }
}

/// Heuristic baseline: cuts `[min, max]` into `num_buckets` equal spans.
///
/// Interior cut values are synthesized (`min + i * width`), not data points,
/// unlike the exact quantizer. Degenerate constant input produces no cuts.
#[derive(Debug)]
pub struct EqualWidthQuantizer {
    config: EqualWidthConfig,
}

impl EqualWidthQuantizer {
    pub fn new(config: EqualWidthConfig) -> Result<Self, ObqError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EqualWidthConfig {
        &self.config
    }
}

impl Quantizer for EqualWidthQuantizer {
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

        let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let width = (max - min) / num_buckets as f64;

        let mut candidates: Vec<f64> = (1..num_buckets)
            .map(|i| min + width * i as f64)
            .collect();
        // A cut at (or below) the minimum would only open an empty first
        // bucket; constant input collapses every cut there.
        candidates.retain(|&cut| cut > min);
        let boundaries = dedup_boundaries(candidates);

        let mut warnings = vec![];
        if boundaries.len() < num_buckets - 1 {
            warnings.push(format!(
                "degenerate value range: requested {num_buckets} buckets, partition distinguishes {}",
                boundaries.len() + 1
            ));
        }

        let labels = labels_for(&scores, &boundaries);
        let objective = partition_sse(&scores, &labels);

        let runtime_ms = u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX);
        ctx.record_scalar("quantize.width.runtime_ms", runtime_ms as f64);
        ctx.report_progress(1.0);

        let diagnostics = Diagnostics {
            n,
            requested_buckets: num_buckets,
            effective_buckets: boundaries.len() + 1,
            runtime_ms: Some(runtime_ms),
            objective: Some(objective),
            notes: vec![format!("num_buckets={num_buckets}"), format!("min={min}, max={max}")],
            warnings,
            algorithm: Cow::Borrowed("equal_width"),
            cost_model: Cow::Borrowed("l2"),
            ..Diagnostics::default()
        };

        BucketPartition::new(n, boundaries, labels, diagnostics)
    }
}
