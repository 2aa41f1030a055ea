// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::ObqError;
use crate::diagnostics::Diagnostics;

/// Maps a score to its bucket index for sorted ascending `boundaries`.
///
/// Buckets are right-open: label `i` covers `[boundaries[i-1], boundaries[i])`
/// with `boundaries[-1] = -inf` and `boundaries[len] = +inf`, so a score equal
/// to a boundary falls into the bucket that starts there.
pub fn bucket_index(boundaries: &[f64], score: f64) -> usize {
    boundaries.partition_point(|boundary| *boundary <= score)
}

/// Validates the output boundary contract: finite, strictly increasing.
pub fn validate_boundaries(boundaries: &[f64]) -> Result<(), ObqError> {
    for (idx, &boundary) in boundaries.iter().enumerate() {
        if !boundary.is_finite() {
            return Err(ObqError::invalid_argument(format!(
                "boundary[{idx}] must be finite; got {boundary}"
            )));
        }
    }
    for (idx, pair) in boundaries.windows(2).enumerate() {
        if pair[0] >= pair[1] {
            return Err(ObqError::invalid_argument(format!(
                "boundaries must be strictly increasing: boundary[{idx}]={}, boundary[{}]={}",
                pair[0],
                idx + 1,
                pair[1]
            )));
        }
    }
    Ok(())
}

/// The result of one quantizer invocation: bucket-opening boundary values,
/// one label per input record (in the caller's row order), and run
/// diagnostics.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct BucketPartition {
    pub boundaries: Vec<f64>,
    pub labels: Vec<usize>,
    pub diagnostics: Diagnostics,
}

impl BucketPartition {
    /// Constructs a partition after enforcing the output contract.
    pub fn new(
        n: usize,
        boundaries: Vec<f64>,
        labels: Vec<usize>,
        diagnostics: Diagnostics,
    ) -> Result<Self, ObqError> {
        validate_boundaries(&boundaries)?;

        if labels.len() != n {
            return Err(ObqError::invalid_argument(format!(
                "label count mismatch: got {}, expected n={n}",
                labels.len()
            )));
        }
        if let Some((idx, &label)) = labels
            .iter()
            .enumerate()
            .find(|&(_, &label)| label > boundaries.len())
        {
            return Err(ObqError::invalid_argument(format!(
                "label out of range at record {idx}: label={label}, max={}",
                boundaries.len()
            )));
        }

        Ok(Self {
            boundaries,
            labels,
            diagnostics,
        })
    }

    /// Number of buckets the partition actually distinguishes.
    pub fn bucket_count(&self) -> usize {
        self.boundaries.len() + 1
    }

    /// Bucket index a given score would receive under this partition.
    pub fn bucket_of(&self, score: f64) -> usize {
        bucket_index(&self.boundaries, score)
    }
}
