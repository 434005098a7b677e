//! Analysis windows

use std::f32::consts::PI;

/// Periodic Hann window of length `len`
///
/// Periodic (DFT-even) form: `0.5 - 0.5 * cos(2*pi*n / len)`.
pub fn hann_window(len: usize) -> Vec<f32> {
    (0..len)
        .map(|n| {
            let phase = 2.0 * PI * n as f32 / len as f32;
            0.5 * (1.0 - phase.cos())
        })
        .collect()
}

/// Element-wise square root of the periodic Hann window
///
/// Used for both analysis and synthesis, so the squared window sums to one
/// at 50% overlap.
pub fn sqrt_hann_window(len: usize) -> Vec<f32> {
    hann_window(len).into_iter().map(f32::sqrt).collect()
}
