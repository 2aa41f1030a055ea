// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod assign;
pub mod cost;
pub mod dp;
pub mod freq;
pub mod width;

pub use assign::{dedup_boundaries, labels_for};
pub use cost::{L2Cache, L2Cost, RangeCost, partition_sse};
pub use dp::{MseQuantizer, MseQuantizerConfig};
pub use freq::{EqualFrequencyConfig, EqualFrequencyQuantizer};
pub use width::{EqualWidthConfig, EqualWidthQuantizer};

/// Quantizer namespace placeholder.
pub fn crate_name() -> &'static str {
    let _ = obq_core::crate_name();
    "obq-quantize"
}
