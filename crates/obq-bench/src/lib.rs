// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Benchmark namespace placeholder.
pub fn crate_name() -> &'static str {
    let _ = (obq_core::crate_name(), obq_quantize::crate_name());
    "obq-bench"
}
