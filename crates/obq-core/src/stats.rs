// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Plain prefix sums: output has length `values.len() + 1` with a leading 0,
/// so `out[end] - out[start]` is the sum over the half-open range
/// `[start, end)`.
pub fn prefix_sums(values: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len() + 1);
    let mut acc = 0.0;
    out.push(acc);
    for &value in values {
        acc += value;
        out.push(acc);
    }
    out
}

/// Kahan-compensated prefix sums with the same shape as [`prefix_sums`].
///
/// Used under `ReproMode::Strict` to bound accumulation error on long or
/// large-magnitude series.
pub fn prefix_sums_kahan(values: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len() + 1);
    let mut acc = 0.0;
    let mut compensation = 0.0;
    out.push(acc);
    for &value in values {
        let adjusted = value - compensation;
        let next = acc + adjusted;
        compensation = (next - acc) - adjusted;
        acc = next;
        out.push(acc);
    }
    out
}
