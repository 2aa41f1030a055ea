// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use obq_core::{BucketPartition, ExecutionContext, ObqError, Quantizer, ReproMode, ScoreSeries};
use obq_quantize::{
    EqualFrequencyConfig, EqualFrequencyQuantizer, EqualWidthConfig, EqualWidthQuantizer, L2Cost,
    MseQuantizer, MseQuantizerConfig,
};

/// Bucketing method selectable from the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Mse,
    EqualWidth,
    EqualFrequency,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mse => "mse",
            Self::EqualWidth => "width",
            Self::EqualFrequency => "freq",
        }
    }

    pub const ALL: [Method; 3] = [Method::Mse, Method::EqualWidth, Method::EqualFrequency];
}

/// Runs the selected quantizer against an input series.
///
/// `strict` switches the MSE quantizer's cost model to compensated prefix
/// accumulation; the heuristics ignore it.
pub fn run_quantizer(
    x: &ScoreSeries<'_>,
    method: Method,
    num_buckets: usize,
    strict: bool,
) -> Result<BucketPartition, ObqError> {
    let ctx = ExecutionContext::new();
    match method {
        Method::Mse => {
            let repro_mode = if strict {
                ReproMode::Strict
            } else {
                ReproMode::Balanced
            };
            let quantizer =
                MseQuantizer::new(L2Cost::new(repro_mode), MseQuantizerConfig { num_buckets })?;
            quantizer.quantize(x, &ctx)
        }
        Method::EqualWidth => {
            let quantizer = EqualWidthQuantizer::new(EqualWidthConfig { num_buckets })?;
            quantizer.quantize(x, &ctx)
        }
        Method::EqualFrequency => {
            let quantizer = EqualFrequencyQuantizer::new(EqualFrequencyConfig { num_buckets })?;
            quantizer.quantize(x, &ctx)
        }
    }
}

/// CLI namespace placeholder.
pub fn crate_name() -> &'static str {
    let _ = (obq_core::crate_name(), obq_quantize::crate_name());
    "obq-cli"
}
