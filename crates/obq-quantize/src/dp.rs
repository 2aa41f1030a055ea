// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::assign::{dedup_boundaries, labels_for};
use crate::cost::RangeCost;
use obq_core::{
    BucketPartition, Diagnostics, ExecutionContext, ObqError, Quantizer, ScoreSeries,
};
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use std::borrow::Cow;
use std::mem::size_of;
use std::time::Instant;

/// Configuration for [`MseQuantizer`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MseQuantizerConfig {
    pub num_buckets: usize,
}

impl Default for MseQuantizerConfig {
    fn default() -> Self {
        Self { num_buckets: 1 }
    }
}

impl MseQuantizerConfig {
    fn validate(&self) -> Result<(), ObqError> {
        if self.num_buckets < 1 {
            return Err(ObqError::invalid_argument(
                "num_buckets must be >= 1; got 0",
            ));
        }
        Ok(())
    }
}

/// Exact dynamic-programming quantizer: partitions a one-dimensional score
/// series into `num_buckets` contiguous buckets minimizing the total
/// within-bucket sum of squared deviations.
///
/// The sweep is O(num_buckets * n^2) time with rolling cost rows and one
/// dense choice table for backtracking. Cut boundaries are always values
/// present in the input; ties between equally-optimal cut points resolve to
/// the smallest split index for reproducibility. When optimal cut points
/// coincide on one score value the deduplicated boundary list shrinks and
/// the effective bucket count drops below the request; this is reported as a
/// diagnostics warning, never repaired. Duplicate-heavy data can likewise
/// leave the lowest bucket empty when a boundary ties the minimum value.
///
/// Scores must be finite; NaN or infinite inputs are outside the contract.
#[derive(Debug)]
pub struct MseQuantizer<C: RangeCost> {
    cost_model: C,
    config: MseQuantizerConfig,
}

impl<C: RangeCost> MseQuantizer<C> {
    pub fn new(cost_model: C, config: MseQuantizerConfig) -> Result<Self, ObqError> {
        config.validate()?;
        Ok(Self { cost_model, config })
    }

    pub fn cost_model(&self) -> &C {
        &self.cost_model
    }

    pub fn config(&self) -> &MseQuantizerConfig {
        &self.config
    }
}

#[derive(Clone, Copy, Debug)]
struct LayerCell {
    cost: f64,
    split: usize,
    cost_evals: usize,
}

fn checked_usize_mul(lhs: usize, rhs: usize, context: &str) -> Result<usize, ObqError> {
    lhs.checked_mul(rhs)
        .ok_or_else(|| ObqError::resource_limit(format!("{context} overflow")))
}

fn checked_usize_add(lhs: usize, rhs: usize, context: &str) -> Result<usize, ObqError> {
    lhs.checked_add(rhs)
        .ok_or_else(|| ObqError::resource_limit(format!("{context} overflow")))
}

fn checked_counter_add(counter: &mut usize, amount: usize, name: &str) -> Result<(), ObqError> {
    *counter = counter
        .checked_add(amount)
        .ok_or_else(|| ObqError::resource_limit(format!("{name} counter overflow")))?;
    Ok(())
}

/// Estimated bytes for the transient sweep state: sorted copy, two rolling
/// cost rows, and the dense choice table.
fn estimate_sweep_state_bytes(n: usize, num_buckets: usize) -> Result<usize, ObqError> {
    let split_cells = checked_usize_mul(num_buckets, n, "dp choice-table cell count")?;
    let split_bytes = checked_usize_mul(split_cells, size_of::<usize>(), "dp choice-table bytes")?;

    let row_entries = checked_usize_mul(n, 2, "dp cost-row entry count")?;
    let row_bytes = checked_usize_mul(row_entries, size_of::<f64>(), "dp cost-row bytes")?;

    let sorted_bytes = checked_usize_mul(n, size_of::<f64>() + size_of::<usize>(), "sorted copy bytes")?;

    let base = checked_usize_add(split_bytes, row_bytes, "dp state bytes")?;
    checked_usize_add(base, sorted_bytes, "dp state bytes")
}

fn compute_cell<C: RangeCost>(
    model: &C,
    cache: &C::Cache,
    dp_prev: &[f64],
    layer: usize,
    i: usize,
) -> Result<LayerCell, ObqError> {
    let mut best_cost = f64::INFINITY;
    let mut best_split = usize::MAX;
    let mut cost_evals = 0usize;

    // Lower bound layer-1 guarantees every bucket placed so far is non-empty.
    for j in (layer - 1)..i {
        let range_cost = model.range_cost(cache, j + 1, i + 1);
        cost_evals += 1;
        if !range_cost.is_finite() {
            return Err(ObqError::numerical_issue(format!(
                "non-finite range cost at [{}, {}): {range_cost}",
                j + 1,
                i + 1
            )));
        }

        let objective = dp_prev[j] + range_cost;
        if !objective.is_finite() {
            return Err(ObqError::numerical_issue(format!(
                "non-finite objective at layer={layer}, split={j}, end={i}"
            )));
        }

        // Strict `<` keeps the first (smallest) split on ties.
        if objective < best_cost {
            best_cost = objective;
            best_split = j;
        }
    }

    Ok(LayerCell {
        cost: best_cost,
        split: best_split,
        cost_evals,
    })
}

#[cfg(feature = "rayon")]
fn compute_layer<C>(
    model: &C,
    cache: &C::Cache,
    dp_prev: &[f64],
    layer: usize,
    n: usize,
) -> Result<Vec<LayerCell>, ObqError>
where
    C: RangeCost + Sync,
    C::Cache: Sync,
{
    (0..n)
        .into_par_iter()
        .map(|i| compute_cell(model, cache, dp_prev, layer, i))
        .collect()
}

#[cfg(not(feature = "rayon"))]
fn compute_layer<C>(
    model: &C,
    cache: &C::Cache,
    dp_prev: &[f64],
    layer: usize,
    n: usize,
) -> Result<Vec<LayerCell>, ObqError>
where
    C: RangeCost + Sync,
    C::Cache: Sync,
{
    (0..n)
        .map(|i| compute_cell(model, cache, dp_prev, layer, i))
        .collect()
}

fn backtrack_cut_positions(
    splits: &[usize],
    n: usize,
    num_buckets: usize,
) -> Result<Vec<usize>, ObqError> {
    let mut positions = Vec::with_capacity(num_buckets.saturating_sub(1));
    let mut end = n - 1;

    for layer in (1..num_buckets).rev() {
        let split = splits[layer * n + end];
        if split == usize::MAX {
            return Err(ObqError::invalid_argument(format!(
                "backtracking failed at layer={layer}, end={end}"
            )));
        }
        // The boundary is the first sorted position of the next bucket.
        positions.push(split + 1);
        end = split;
    }

    positions.reverse();
    Ok(positions)
}

impl<C> Quantizer for MseQuantizer<C>
where
    C: RangeCost + Sync,
    C::Cache: Sync,
{
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

        let state_bytes = estimate_sweep_state_bytes(n, num_buckets)?;
        let cache_bytes = self.cost_model.worst_case_cache_bytes(n);
        if cache_bytes == usize::MAX {
            return Err(ObqError::resource_limit(format!(
                "cost-model cache size overflow for n={n}"
            )));
        }
        let required_bytes = checked_usize_add(state_bytes, cache_bytes, "quantizer state bytes")?;
        ctx.check_memory_budget(required_bytes)?;

        let scores = x.to_f64_vec();

        // Deterministic sorted view: ties on score break by original index,
        // so boundary selection never depends on sort stability.
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_unstable_by(|&a, &b| scores[a].total_cmp(&scores[b]).then(a.cmp(&b)));
        let sorted: Vec<f64> = order.iter().map(|&idx| scores[idx]).collect();

        let cache = self.cost_model.precompute(&sorted)?;

        let mut cost_evals = 0usize;

        // Base layer: one bucket over the sorted prefix [0, i].
        let mut dp_prev = Vec::with_capacity(n);
        for i in 0..n {
            let range_cost = self.cost_model.range_cost(&cache, 0, i + 1);
            if !range_cost.is_finite() {
                return Err(ObqError::numerical_issue(format!(
                    "non-finite range cost at [0, {}): {range_cost}",
                    i + 1
                )));
            }
            dp_prev.push(range_cost);
        }
        checked_counter_add(&mut cost_evals, n, "cost_evals")?;
        ctx.report_progress(1.0 / num_buckets as f32);

        // Choice table, layer-major; layer 0 has no split and stays MAX.
        let mut splits = vec![usize::MAX; num_buckets * n];

        for layer in 1..num_buckets {
            let cells = compute_layer(&self.cost_model, &cache, &dp_prev, layer, n)?;

            let mut dp_curr = Vec::with_capacity(n);
            let split_row = &mut splits[layer * n..(layer + 1) * n];
            for (i, cell) in cells.into_iter().enumerate() {
                checked_counter_add(&mut cost_evals, cell.cost_evals, "cost_evals")?;
                dp_curr.push(cell.cost);
                split_row[i] = cell.split;
            }

            dp_prev = dp_curr;
            ctx.report_progress((layer + 1) as f32 / num_buckets as f32);
        }

        let objective = dp_prev[n - 1];
        if !objective.is_finite() {
            return Err(ObqError::numerical_issue(format!(
                "non-finite final objective for num_buckets={num_buckets}: {objective}"
            )));
        }

        let cut_positions = backtrack_cut_positions(&splits, n, num_buckets)?;
        let candidates: Vec<f64> = cut_positions.iter().map(|&pos| sorted[pos]).collect();
        let boundaries = dedup_boundaries(candidates);

        let mut notes = vec![];
        let mut warnings = vec![];
        notes.push(format!("num_buckets={num_buckets}"));
        notes.push(format!("final_objective={objective}"));
        notes.push(format!("cost_evals={cost_evals}"));
        if boundaries.len() < num_buckets - 1 {
            warnings.push(format!(
                "tied cut points collapsed after dedup: requested {num_buckets} buckets, partition distinguishes {}",
                boundaries.len() + 1
            ));
        }

        let labels = labels_for(&scores, &boundaries);

        let runtime_ms = u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX);
        ctx.record_scalar("quantize.mse.cost_evals", cost_evals as f64);
        ctx.record_scalar("quantize.mse.runtime_ms", runtime_ms as f64);
        ctx.report_progress(1.0);

        let diagnostics = Diagnostics {
            n,
            requested_buckets: num_buckets,
            effective_buckets: boundaries.len() + 1,
            runtime_ms: Some(runtime_ms),
            objective: Some(objective),
            cost_evals: Some(cost_evals),
            notes,
            warnings,
            algorithm: Cow::Borrowed("mse_dp"),
            cost_model: Cow::Borrowed(self.cost_model.name()),
            repro_mode: self.cost_model.repro_mode(),
            ..Diagnostics::default()
        };

        BucketPartition::new(n, boundaries, labels, diagnostics)
    }
}
