//! Short-time Fourier analysis and synthesis
//!
//! Provides:
//! - `StftConfig` with the frame/hop/FFT sizes and the analysis window
//! - `Spectrogram`, the (bin, frame, re/im) layout consumed by the model
//! - Centred forward and inverse transforms

mod spectrogram;
mod stft;
mod window;

pub use spectrogram::Spectrogram;
pub use stft::{istft, stft, StftConfig};
pub use window::{hann_window, sqrt_hann_window};
