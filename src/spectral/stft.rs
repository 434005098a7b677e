//! Centred STFT / ISTFT with overlap-add synthesis
//!
//! Framing follows the usual centred convention: the signal is
//! reflect-padded by `n_fft / 2` on each side, so frame `t` is centred on
//! sample `t * hop`. The inverse removes the same padding and normalises by
//! the summed squared-window envelope.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};

use crate::error::{EnhanceError, Result};
use crate::spectral::{sqrt_hann_window, Spectrogram};

/// Smallest envelope value accepted inside the reconstructed region
const NOLA_TOLERANCE: f32 = 1e-11;

/// Short-time transform parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StftConfig {
    /// FFT length in samples
    pub n_fft: usize,
    /// Hop between consecutive frames in samples
    pub hop_length: usize,
    /// Window length in samples (zero-padded to `n_fft` when shorter)
    pub win_length: usize,
}

impl Default for StftConfig {
    fn default() -> Self {
        Self {
            n_fft: 512,
            hop_length: 256,
            win_length: 512,
        }
    }
}

impl StftConfig {
    /// Number of one-sided frequency bins
    pub fn num_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Frames produced for a signal of `len` samples
    pub fn num_frames(&self, len: usize) -> usize {
        1 + len / self.hop_length
    }

    /// Samples reconstructed from `frames` frames without an explicit length
    pub fn output_len(&self, frames: usize) -> usize {
        self.hop_length * frames.saturating_sub(1)
    }

    /// Shortest signal the reflect padding accepts
    pub fn min_signal_len(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// sqrt-Hann window of `win_length`, centred inside `n_fft`
    ///
    /// # Errors
    /// * `PreconditionFailed` - If `win_length` exceeds `n_fft`
    pub fn window(&self) -> Result<Vec<f32>> {
        self.validate()?;
        let win = sqrt_hann_window(self.win_length);
        let offset = (self.n_fft - self.win_length) / 2;
        let mut padded = vec![0.0; self.n_fft];
        padded[offset..offset + self.win_length].copy_from_slice(&win);
        Ok(padded)
    }

    fn validate(&self) -> Result<()> {
        if self.n_fft == 0 || self.hop_length == 0 || self.win_length > self.n_fft {
            return Err(EnhanceError::PreconditionFailed {
                reason: format!(
                    "invalid STFT parameters: n_fft={}, hop={}, win={}",
                    self.n_fft, self.hop_length, self.win_length
                ),
            });
        }
        Ok(())
    }
}

/// Forward STFT of a mono signal
///
/// # Errors
/// * `SignalTooShort` - If the signal cannot be reflect-padded
pub fn stft(samples: &[f32], config: &StftConfig) -> Result<Spectrogram> {
    config.validate()?;
    if samples.len() < config.min_signal_len() {
        return Err(EnhanceError::SignalTooShort {
            samples: samples.len(),
            minimum: config.min_signal_len(),
        });
    }

    let n_fft = config.n_fft;
    let padded = reflect_pad(samples, n_fft / 2);
    let window = config.window()?;
    let frames = config.num_frames(samples.len());
    let bins = config.num_bins();

    let fft: Arc<dyn Fft<f32>> = FftPlanner::<f32>::new().plan_fft_forward(n_fft);
    let mut buffer = vec![Complex::new(0.0, 0.0); n_fft];
    let mut spec = Spectrogram::zeros(bins, frames);

    for frame in 0..frames {
        let start = frame * config.hop_length;
        for (slot, (&sample, &win)) in buffer
            .iter_mut()
            .zip(padded[start..start + n_fft].iter().zip(&window))
        {
            *slot = Complex::new(sample * win, 0.0);
        }

        fft.process(&mut buffer);

        for (bin, value) in buffer.iter().take(bins).enumerate() {
            spec.set(bin, frame, *value);
        }
    }

    Ok(spec)
}

/// Inverse STFT by windowed overlap-add
///
/// Without `length` the result has `hop * (frames - 1)` samples; with it the
/// result is zero-padded or truncated to exactly `length` samples.
///
/// # Errors
/// * `ShapeMismatch` - If the spectrogram does not have `n_fft / 2 + 1` bins
/// * `InvalidWindow` - If the squared-window envelope vanishes
pub fn istft(spec: &Spectrogram, config: &StftConfig, length: Option<usize>) -> Result<Vec<f32>> {
    config.validate()?;
    let n_fft = config.n_fft;
    let hop = config.hop_length;
    let bins = config.num_bins();

    if spec.bins() != bins {
        return Err(EnhanceError::ShapeMismatch {
            expected: vec![bins, spec.frames(), 2],
            actual: spec.shape().to_vec(),
        });
    }
    if spec.frames() == 0 {
        return Ok(vec![0.0; length.unwrap_or(0)]);
    }

    let window = config.window()?;
    let frames = spec.frames();
    let full_len = n_fft + hop * (frames - 1);

    let ifft: Arc<dyn Fft<f32>> = FftPlanner::<f32>::new().plan_fft_inverse(n_fft);
    let mut buffer = vec![Complex::new(0.0, 0.0); n_fft];
    let mut output = vec![0.0f32; full_len];
    let mut envelope = vec![0.0f32; full_len];
    let scale = 1.0 / n_fft as f32;

    for frame in 0..frames {
        fill_hermitian(&mut buffer, spec, frame);
        ifft.process(&mut buffer);

        let start = frame * hop;
        for (i, (value, &win)) in buffer.iter().zip(&window).enumerate() {
            output[start + i] += value.re * scale * win;
            envelope[start + i] += win * win;
        }
    }

    let begin = n_fft / 2;
    let end = match length {
        Some(len) => (begin + len).min(full_len),
        None => full_len - n_fft / 2,
    };

    let mut result = Vec::with_capacity(end.saturating_sub(begin));
    for idx in begin..end {
        if envelope[idx].abs() < NOLA_TOLERANCE {
            return Err(EnhanceError::InvalidWindow { index: idx - begin });
        }
        result.push(output[idx] / envelope[idx]);
    }

    if let Some(len) = length {
        result.resize(len, 0.0);
    }

    Ok(result)
}

/// Rebuild the full conjugate-symmetric spectrum of one frame
///
/// Imaginary parts of the DC and Nyquist bins are dropped, as an inverse
/// real FFT would.
fn fill_hermitian(buffer: &mut [Complex<f32>], spec: &Spectrogram, frame: usize) {
    let n_fft = buffer.len();
    let last = spec.bins() - 1;

    for bin in 0..=last {
        let mut value = spec.get(bin, frame);
        if bin == 0 || (n_fft % 2 == 0 && bin == last) {
            value.im = 0.0;
        }
        buffer[bin] = value;
        if bin != 0 && bin < n_fft - bin {
            buffer[n_fft - bin] = value.conj();
        }
    }
}

/// Mirror `pad` samples at each edge, excluding the edge sample itself
fn reflect_pad(samples: &[f32], pad: usize) -> Vec<f32> {
    let len = samples.len();
    let mut padded = Vec::with_capacity(len + 2 * pad);
    padded.extend((1..=pad).rev().map(|i| samples[i]));
    padded.extend_from_slice(samples);
    padded.extend((1..=pad).map(|i| samples[len - 1 - i]));
    padded
}
