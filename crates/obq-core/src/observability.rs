// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Receives coarse progress updates in `[0.0, 1.0]`.
pub trait ProgressSink {
    fn on_progress(&self, fraction: f32);
}

/// Receives named scalar measurements from a quantizer run.
pub trait TelemetrySink {
    fn record_scalar(&self, key: &'static str, value: f64);
}
