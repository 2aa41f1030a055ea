// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use obq_core::{BucketPartition, ExecutionContext, ObqError, Quantizer, ScoreSeries};
use obq_quantize::{
    EqualFrequencyConfig, EqualFrequencyQuantizer, EqualWidthConfig, EqualWidthQuantizer, L2Cost,
    MseQuantizer, MseQuantizerConfig, partition_sse,
};
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

const MIN_PROPTEST_CASES: u32 = 256;

fn proptest_cases() -> u32 {
    std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .map(|parsed| parsed.max(MIN_PROPTEST_CASES))
        .unwrap_or(MIN_PROPTEST_CASES)
}

fn mse_partition(values: &[f64], num_buckets: usize) -> Result<BucketPartition, ObqError> {
    let series = ScoreSeries::from_f64(values)?;
    let quantizer = MseQuantizer::new(L2Cost::default(), MseQuantizerConfig { num_buckets })?;
    quantizer.quantize(&series, &ExecutionContext::new())
}

fn width_partition(values: &[f64], num_buckets: usize) -> Result<BucketPartition, ObqError> {
    let series = ScoreSeries::from_f64(values)?;
    let quantizer = EqualWidthQuantizer::new(EqualWidthConfig { num_buckets })?;
    quantizer.quantize(&series, &ExecutionContext::new())
}

fn freq_partition(values: &[f64], num_buckets: usize) -> Result<BucketPartition, ObqError> {
    let series = ScoreSeries::from_f64(values)?;
    let quantizer = EqualFrequencyQuantizer::new(EqualFrequencyConfig { num_buckets })?;
    quantizer.quantize(&series, &ExecutionContext::new())
}

fn scores_and_buckets() -> impl Strategy<Value = (Vec<f64>, usize)> {
    (
        prop::collection::vec(-1_000.0..1_000.0_f64, 1..96),
        1_usize..=6,
    )
        .prop_filter("need at least num_buckets records", |(values, k)| {
            values.len() >= *k
        })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: proptest_cases(),
        failure_persistence: Some(Box::new(FileFailurePersistence::Off)),
        ..ProptestConfig::default()
    })]

    #[test]
    fn boundary_count_never_exceeds_request((values, num_buckets) in scores_and_buckets()) {
        let result = mse_partition(&values, num_buckets).expect("quantize should succeed");
        prop_assert!(result.boundaries.len() <= num_buckets - 1);
        prop_assert_eq!(result.diagnostics.effective_buckets, result.boundaries.len() + 1);
    }

    #[test]
    fn boundaries_are_sorted_distinct_data_points((values, num_buckets) in scores_and_buckets()) {
        let result = mse_partition(&values, num_buckets).expect("quantize should succeed");
        for pair in result.boundaries.windows(2) {
            prop_assert!(pair[0] < pair[1], "boundaries not strictly increasing");
        }
        for boundary in &result.boundaries {
            prop_assert!(
                values.iter().any(|value| value == boundary),
                "boundary {} is not a data point",
                boundary
            );
        }
    }

    #[test]
    fn labels_are_monotone_under_score_order((values, num_buckets) in scores_and_buckets()) {
        let result = mse_partition(&values, num_buckets).expect("quantize should succeed");

        let mut order: Vec<usize> = (0..values.len()).collect();
        order.sort_unstable_by(|&a, &b| values[a].total_cmp(&values[b]));
        let sorted_labels: Vec<usize> = order.iter().map(|&idx| result.labels[idx]).collect();
        for pair in sorted_labels.windows(2) {
            prop_assert!(pair[0] <= pair[1], "labels not monotone under score order");
        }
    }

    #[test]
    fn dp_objective_dominates_heuristic_partitions((values, num_buckets) in scores_and_buckets()) {
        let dp = mse_partition(&values, num_buckets).expect("dp quantize should succeed");
        let width = width_partition(&values, num_buckets).expect("width quantize should succeed");
        let freq = freq_partition(&values, num_buckets).expect("freq quantize should succeed");

        let dp_sse = partition_sse(&values, &dp.labels);
        let width_sse = partition_sse(&values, &width.labels);
        let freq_sse = partition_sse(&values, &freq.labels);

        let tolerance = 1e-6 * (1.0 + dp_sse.abs());
        prop_assert!(
            dp_sse <= width_sse + tolerance,
            "dp {} worse than equal-width {}",
            dp_sse,
            width_sse
        );
        prop_assert!(
            dp_sse <= freq_sse + tolerance,
            "dp {} worse than equal-frequency {}",
            dp_sse,
            freq_sse
        );
    }

    #[test]
    fn quantization_is_deterministic((values, num_buckets) in scores_and_buckets()) {
        let first = mse_partition(&values, num_buckets).expect("first run should succeed");
        let second = mse_partition(&values, num_buckets).expect("second run should succeed");
        prop_assert_eq!(first.boundaries, second.boundaries);
        prop_assert_eq!(first.labels, second.labels);
    }

    #[test]
    fn reported_objective_matches_recomputed_sse((values, num_buckets) in scores_and_buckets()) {
        let result = mse_partition(&values, num_buckets).expect("quantize should succeed");
        let reported = result.diagnostics.objective.expect("objective recorded");
        let recomputed = partition_sse(&values, &result.labels);
        let tolerance = 1e-6 * (1.0 + reported.abs());
        prop_assert!(
            (reported - recomputed).abs() <= tolerance,
            "reported {} vs recomputed {}",
            reported,
            recomputed
        );
    }

    #[test]
    fn one_bucket_per_distinct_record_reaches_zero(values in prop::collection::btree_set(-500_000_i32..500_000, 1..48)) {
        let values: Vec<f64> = values.into_iter().map(f64::from).collect();
        let num_buckets = values.len();
        let result = mse_partition(&values, num_buckets).expect("quantize should succeed");
        prop_assert_eq!(result.boundaries.len(), num_buckets - 1);
        let objective = result.diagnostics.objective.expect("objective recorded");
        prop_assert!(objective.abs() <= 1e-9, "objective {} should be zero", objective);
    }
}

#[test]
fn rejects_more_buckets_than_records() {
    let values = vec![1.0, 2.0, 3.0];
    let err = mse_partition(&values, 4).expect_err("num_buckets > n must fail");
    assert!(matches!(err, ObqError::InvalidArgument(_)));
}

#[test]
fn rejects_zero_buckets_at_construction() {
    let err = MseQuantizer::new(L2Cost::default(), MseQuantizerConfig { num_buckets: 0 })
        .expect_err("num_buckets=0 must fail");
    assert!(matches!(err, ObqError::InvalidArgument(_)));
}
