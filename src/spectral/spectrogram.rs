//! Time-frequency representation with split real/imaginary parts

use candle_core::{DType, Device, Tensor};
use rustfft::num_complex::Complex;

use crate::error::{EnhanceError, Result};

/// One-sided spectrogram laid out as `[bins][frames][2]`
///
/// The trailing pair holds the real and imaginary part of each bin, which
/// is the layout the model consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    bins: usize,
    frames: usize,
    data: Vec<f32>,
}

impl Spectrogram {
    /// Zero-filled spectrogram
    pub fn zeros(bins: usize, frames: usize) -> Self {
        Self {
            bins,
            frames,
            data: vec![0.0; bins * frames * 2],
        }
    }

    /// Wrap raw `[bins][frames][2]` data
    pub fn from_raw(bins: usize, frames: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != bins * frames * 2 {
            return Err(EnhanceError::ShapeMismatch {
                expected: vec![bins, frames, 2],
                actual: vec![data.len()],
            });
        }
        Ok(Self { bins, frames, data })
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Shape as `[bins, frames, 2]`
    pub fn shape(&self) -> [usize; 3] {
        [self.bins, self.frames, 2]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Complex value of `bin` in `frame`
    pub fn get(&self, bin: usize, frame: usize) -> Complex<f32> {
        let idx = self.index(bin, frame);
        Complex::new(self.data[idx], self.data[idx + 1])
    }

    pub fn set(&mut self, bin: usize, frame: usize, value: Complex<f32>) {
        let idx = self.index(bin, frame);
        self.data[idx] = value.re;
        self.data[idx + 1] = value.im;
    }

    /// Model input: `(1, bins, frames, 2)` on `device`
    pub fn to_batch_tensor(&self, device: &Device) -> Result<Tensor> {
        let tensor = Tensor::from_slice(&self.data, (1, self.bins, self.frames, 2), device)?;
        Ok(tensor)
    }

    /// Strip the batch dimension from a `(1, bins, frames, 2)` model output
    pub fn from_batch_tensor(tensor: &Tensor) -> Result<Self> {
        let dims = tensor.dims().to_vec();
        match dims.as_slice() {
            [1, bins, frames, 2] => {
                let data = tensor
                    .squeeze(0)?
                    .to_dtype(DType::F32)?
                    .flatten_all()?
                    .to_vec1::<f32>()?;
                Self::from_raw(*bins, *frames, data)
            }
            _ => Err(EnhanceError::ShapeMismatch {
                expected: vec![1, 0, 0, 2],
                actual: dims,
            }),
        }
    }

    fn index(&self, bin: usize, frame: usize) -> usize {
        (bin * self.frames + frame) * 2
    }
}
