// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use obq_core::bucket_index;

/// Sorts boundary candidates ascending and drops exact duplicates.
///
/// Deduplication can shrink the list below `num_buckets - 1` when several
/// optimal cut points land on the same score value; callers surface that as a
/// diagnostics warning rather than re-splitting.
pub fn dedup_boundaries(mut candidates: Vec<f64>) -> Vec<f64> {
    candidates.sort_unstable_by(f64::total_cmp);
    candidates.dedup_by(|a, b| a == b);
    candidates
}

/// Labels every score against sorted ascending boundaries, in record order.
///
/// Right-open semantics: a score equal to a boundary belongs to the bucket
/// that starts at that boundary.
pub fn labels_for(scores: &[f64], boundaries: &[f64]) -> Vec<usize> {
    scores
        .iter()
        .map(|&score| bucket_index(boundaries, score))
        .collect()
}
