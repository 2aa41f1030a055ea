// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod diagnostics;
pub mod error;
pub mod execution_context;
pub mod observability;
pub mod quantizer;
pub mod repro;
pub mod result;
pub mod series;
pub mod stats;

pub use diagnostics::{DIAGNOSTICS_SCHEMA_VERSION, Diagnostics};
pub use error::ObqError;
pub use execution_context::ExecutionContext;
pub use observability::{ProgressSink, TelemetrySink};
pub use quantizer::Quantizer;
pub use repro::ReproMode;
pub use result::{BucketPartition, bucket_index, validate_boundaries};
pub use series::{ScoreSeries, ScoreView};
pub use stats::{prefix_sums, prefix_sums_kahan};

/// Core shared types and traits for obq.
pub fn crate_name() -> &'static str {
    "obq-core"
}
