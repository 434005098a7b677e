//! Speech Enhance - offline single-file speech enhancement
//!
//! A pretrained spectral model denoises one mono 16 kHz recording in a
//! strictly sequential run:
//!
//! 1. Model loading: checkpoint parameters validated and bound, eval mode
//! 2. Audio ingest: whole-file WAV read, sample rate checked
//! 3. STFT and a single forward pass of the model
//! 4. ISTFT and WAV output at the original rate
//!
//! The model is opaque: anything implementing `neural::SpectralModel` can
//! be run, including the identity `PassthroughModel`.

pub mod audio;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod neural;
pub mod spectral;

pub use error::{EnhanceError, Result};
