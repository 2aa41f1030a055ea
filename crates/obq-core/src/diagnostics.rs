// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::repro::ReproMode;
use std::borrow::Cow;

/// Diagnostics schema version for quantizer run metadata.
pub const DIAGNOSTICS_SCHEMA_VERSION: u32 = 1;

/// Structured diagnostics captured from a quantizer execution.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostics {
    pub n: usize,
    pub requested_buckets: usize,
    pub effective_buckets: usize,
    pub schema_version: u32,
    pub engine_version: Option<String>,
    pub runtime_ms: Option<u64>,
    /// Total within-bucket sum of squared deviations of the returned partition.
    pub objective: Option<f64>,
    pub cost_evals: Option<usize>,
    pub notes: Vec<String>,
    pub warnings: Vec<String>,
    pub algorithm: Cow<'static, str>,
    pub cost_model: Cow<'static, str>,
    pub repro_mode: ReproMode,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            n: 0,
            requested_buckets: 0,
            effective_buckets: 0,
            schema_version: DIAGNOSTICS_SCHEMA_VERSION,
            engine_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            runtime_ms: None,
            objective: None,
            cost_evals: None,
            notes: vec![],
            warnings: vec![],
            algorithm: Cow::Borrowed(""),
            cost_model: Cow::Borrowed(""),
            repro_mode: ReproMode::Balanced,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DIAGNOSTICS_SCHEMA_VERSION, Diagnostics};
    use crate::ReproMode;
    use std::borrow::Cow;

    #[test]
    fn default_sets_schema_and_engine_version() {
        let diagnostics = Diagnostics::default();
        assert_eq!(diagnostics.schema_version, DIAGNOSTICS_SCHEMA_VERSION);
        assert_eq!(
            diagnostics.engine_version,
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn default_leaves_run_fields_empty() {
        let diagnostics = Diagnostics::default();
        assert_eq!(diagnostics.n, 0);
        assert_eq!(diagnostics.requested_buckets, 0);
        assert_eq!(diagnostics.effective_buckets, 0);
        assert!(diagnostics.runtime_ms.is_none());
        assert!(diagnostics.objective.is_none());
        assert!(diagnostics.cost_evals.is_none());
        assert!(diagnostics.notes.is_empty());
        assert!(diagnostics.warnings.is_empty());
        assert_eq!(diagnostics.algorithm, Cow::Borrowed(""));
        assert_eq!(diagnostics.cost_model, Cow::Borrowed(""));
        assert_eq!(diagnostics.repro_mode, ReproMode::Balanced);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_roundtrip_preserves_all_fields() {
        let diagnostics = Diagnostics {
            n: 1_024,
            requested_buckets: 8,
            effective_buckets: 7,
            schema_version: DIAGNOSTICS_SCHEMA_VERSION,
            engine_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            runtime_ms: Some(12),
            objective: Some(517.25),
            cost_evals: Some(43_690),
            notes: vec!["requested_buckets=8".to_string()],
            warnings: vec!["tied cut points collapsed".to_string()],
            algorithm: Cow::Owned("mse_dp".to_string()),
            cost_model: Cow::Owned("l2".to_string()),
            repro_mode: ReproMode::Strict,
        };

        let encoded = serde_json::to_string(&diagnostics).expect("diagnostics should serialize");
        let decoded: Diagnostics =
            serde_json::from_str(&encoded).expect("diagnostics should deserialize");
        assert_eq!(decoded, diagnostics);
    }
}
