// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::ObqError;
use crate::observability::{ProgressSink, TelemetrySink};

/// Execution context passed through quantizer calls.
///
/// Carries optional observability sinks and an optional memory budget. There
/// is deliberately no cancellation token or time budget: the quantizer is a
/// pure computation whose only loop exit is completion, and a caller-level
/// deadline wrapper is the externally meaningful timeout mechanism.
#[derive(Default)]
pub struct ExecutionContext<'a> {
    pub memory_budget_bytes: Option<usize>,
    pub progress: Option<&'a dyn ProgressSink>,
    pub telemetry: Option<&'a dyn TelemetrySink>,
}

impl<'a> ExecutionContext<'a> {
    /// Creates a context with no budget and no sinks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the memory budget for transient quantizer state, in bytes.
    pub fn with_memory_budget(mut self, bytes: usize) -> Self {
        self.memory_budget_bytes = Some(bytes);
        self
    }

    /// Sets an optional progress sink.
    pub fn with_progress_sink(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Sets an optional telemetry sink.
    pub fn with_telemetry_sink(mut self, telemetry: &'a dyn TelemetrySink) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Fails when an estimated allocation exceeds the configured budget.
    pub fn check_memory_budget(&self, required_bytes: usize) -> Result<(), ObqError> {
        if let Some(limit_bytes) = self.memory_budget_bytes
            && required_bytes > limit_bytes
        {
            return Err(ObqError::resource_limit(format!(
                "memory_budget_bytes exceeded for quantizer state: required_bytes={required_bytes}, limit_bytes={limit_bytes}; increase the budget or reduce num_buckets"
            )));
        }
        Ok(())
    }

    /// Emits clamped progress to the sink, if configured.
    pub fn report_progress(&self, fraction: f32) {
        if !fraction.is_finite() {
            return;
        }
        if let Some(sink) = self.progress {
            sink.on_progress(fraction.clamp(0.0, 1.0));
        }
    }

    /// Emits a scalar telemetry value to the sink, if configured.
    pub fn record_scalar(&self, key: &'static str, value: f64) {
        if let Some(sink) = self.telemetry {
            sink.record_scalar(key, value);
        }
    }
}
