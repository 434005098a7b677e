//! The enhancement run
//!
//! Load model, load audio, transform, infer, resynthesize, write. Each stage
//! runs once, in order, and the first error aborts the run.

use std::io::{self, Stdout, Write};

use serde::Serialize;
use tracing::{debug, info};

use crate::audio::{read_wav, write_wav, Waveform};
use crate::config::{EnhanceConfig, MODEL_SAMPLE_RATE};
use crate::engine::RunState;
use crate::error::Result;
use crate::neural::{ModelArchitecture, ModelLoader};
use crate::spectral::{istft, stft};

/// Shapes and provenance of a completed run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// Architecture that produced the output
    pub architecture: String,
    /// SHA-256 of the checkpoint file
    pub checkpoint_digest: Option<String>,
    pub input_samples: usize,
    /// Spectrogram fed to the model as `[bins, frames, 2]`
    pub input_shape: [usize; 3],
    /// Spectrogram returned by the model
    pub output_shape: [usize; 3],
    /// Samples in the enhanced waveform
    pub output_samples: usize,
    pub sample_rate: u32,
    pub final_state: RunState,
}

/// Drives one enhancement run and tracks its state
///
/// Shape lines are written to `progress`, stdout by default.
pub struct Pipeline<'a, W: Write> {
    config: &'a EnhanceConfig,
    state: RunState,
    progress: W,
}

impl<'a> Pipeline<'a, Stdout> {
    pub fn new(config: &'a EnhanceConfig) -> Self {
        Self::with_progress(config, io::stdout())
    }
}

impl<'a, W: Write> Pipeline<'a, W> {
    pub fn with_progress(config: &'a EnhanceConfig, progress: W) -> Self {
        Self {
            config,
            state: RunState::Unloaded,
            progress,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn into_progress(self) -> W {
        self.progress
    }

    /// Run every stage with the model built by `architecture`
    ///
    /// On error the pipeline is left in `Failed` and the error is returned
    /// unchanged.
    pub fn run_with<A: ModelArchitecture>(&mut self, architecture: A) -> Result<RunReport> {
        match self.execute(architecture) {
            Ok(report) => Ok(report),
            Err(err) => {
                debug!(from = %self.state, error_code = err.error_code(), "Run failed");
                self.state = RunState::Failed;
                Err(err)
            }
        }
    }

    fn execute<A: ModelArchitecture>(&mut self, architecture: A) -> Result<RunReport> {
        let config = self.config;

        let loader = ModelLoader::from_config(config)?;
        let model = loader.load(&config.checkpoint_path, architecture)?;
        self.advance(RunState::ModelLoaded);

        let waveform = read_wav(&config.input_path)?;
        waveform.require_sample_rate(MODEL_SAMPLE_RATE)?;
        self.advance(RunState::AudioLoaded);

        let spec = stft(waveform.samples(), &config.stft)?;
        writeln!(self.progress, "input shape: {:?}", spec.shape())?;
        self.advance(RunState::Transformed);

        let enhanced = model.infer(&spec)?;
        writeln!(self.progress, "output shape: {:?}", enhanced.shape())?;
        self.advance(RunState::Inferred);

        let samples = istft(&enhanced, &config.stft, None)?;
        writeln!(self.progress, "enh shape: [{}]", samples.len())?;
        self.advance(RunState::Resynthesized);

        let output = Waveform::new(samples, waveform.sample_rate());
        write_wav(&output, &config.output_path)?;
        self.advance(RunState::Written);

        info!(
            input = %config.input_path.display(),
            output = %config.output_path.display(),
            samples = output.len(),
            duration_secs = output.duration(),
            "Enhanced audio written"
        );

        Ok(RunReport {
            architecture: model.architecture().to_string(),
            checkpoint_digest: model.checkpoint_digest().map(str::to_string),
            input_samples: waveform.len(),
            input_shape: spec.shape(),
            output_shape: enhanced.shape(),
            output_samples: output.len(),
            sample_rate: output.sample_rate(),
            final_state: self.state,
        })
    }

    fn advance(&mut self, next: RunState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid transition {} -> {}",
            self.state,
            next
        );
        debug!(from = %self.state, to = %next, "Stage complete");
        self.state = next;
    }
}
