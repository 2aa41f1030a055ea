// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Reproducibility mode controlling determinism/performance trade-offs in
/// floating-point accumulation.
///
/// `Strict` selects compensated (Kahan) prefix sums; `Balanced` and `Fast`
/// use plain summation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReproMode {
    Strict,
    #[default]
    Balanced,
    Fast,
}
