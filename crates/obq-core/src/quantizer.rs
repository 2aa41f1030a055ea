// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::execution_context::ExecutionContext;
use crate::result::BucketPartition;
use crate::series::ScoreSeries;
use crate::ObqError;

/// Quantizer contract: full series in, full partition out.
///
/// One-shot and synchronous; implementations hold configuration, not state,
/// and a single invocation owns all of its transient tables.
pub trait Quantizer {
    fn quantize(
        &self,
        x: &ScoreSeries<'_>,
        ctx: &ExecutionContext<'_>,
    ) -> Result<BucketPartition, ObqError>;
}
