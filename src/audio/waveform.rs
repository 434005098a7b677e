//! Mono waveform buffer

use crate::error::{EnhanceError, Result};

/// Mono `f32` samples with their sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Waveform {
    /// Wrap samples recorded at `sample_rate`
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Create a sine wave test tone
    pub fn sine_wave(frequency: f32, duration_secs: f32, sample_rate: u32) -> Self {
        let num_samples = (duration_secs * sample_rate as f32) as usize;
        let angular_freq = 2.0 * std::f32::consts::PI * frequency / sample_rate as f32;

        let samples = (0..num_samples)
            .map(|i| (angular_freq * i as f32).sin())
            .collect();

        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Fail unless the waveform was recorded at `expected` Hz
    ///
    /// No resampling is attempted.
    pub fn require_sample_rate(&self, expected: u32) -> Result<()> {
        if self.sample_rate != expected {
            return Err(EnhanceError::PreconditionFailed {
                reason: format!(
                    "sample rate is {} Hz, model expects {} Hz",
                    self.sample_rate, expected
                ),
            });
        }
        Ok(())
    }
}
