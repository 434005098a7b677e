//! Model loading and single-pass inference
//!
//! Loading is the first pipeline stage: the checkpoint must exist, decode,
//! and satisfy the architecture's schema before any audio is touched.

use std::path::{Path, PathBuf};

use candle_core::Device;
use tracing::{debug, info};

use crate::config::EnhanceConfig;
use crate::error::{EnhanceError, Result};
use crate::neural::checkpoint::{
    file_digest, read_checkpoint, require_checkpoint_file, DEFAULT_STATE_DICT_KEY,
};
use crate::neural::{ModelArchitecture, ModelParameters, ModelSchema, SpectralModel};
use crate::spectral::Spectrogram;

/// Reads checkpoints and turns them into ready-to-run models
#[derive(Debug, Clone)]
pub struct ModelLoader {
    device: Device,
    state_dict_key: String,
    manifest: Option<ModelSchema>,
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self {
            device: Device::Cpu,
            state_dict_key: DEFAULT_STATE_DICT_KEY.to_string(),
            manifest: None,
        }
    }
}

impl ModelLoader {
    /// Loader for the device, state-dict key and manifest named in `config`
    pub fn from_config(config: &EnhanceConfig) -> Result<Self> {
        let manifest = match &config.schema_path {
            Some(path) => Some(ModelSchema::from_json_file(path)?),
            None => None,
        };
        Ok(Self {
            device: config.device(),
            state_dict_key: config.state_dict_key.clone(),
            manifest,
        })
    }

    /// Additionally validate checkpoints against `manifest`
    pub fn with_manifest(mut self, manifest: ModelSchema) -> Self {
        self.manifest = Some(manifest);
        self
    }

    /// Read `checkpoint`, validate it and build an eval-mode model
    ///
    /// # Errors
    /// * `FileNotFound` - If the checkpoint does not exist
    /// * `InvalidCheckpoint` - If it is not a file or cannot be decoded
    /// * `SchemaMismatch` - If its parameters do not fit the architecture
    pub fn load<A: ModelArchitecture>(&self, checkpoint: &Path, architecture: A) -> Result<LoadedModel> {
        require_checkpoint_file(checkpoint)?;

        let digest = file_digest(checkpoint)?;
        let parameters = read_checkpoint(checkpoint, Some(&self.state_dict_key), &self.device)?;
        debug!(
            checkpoint = %checkpoint.display(),
            sha256 = %digest,
            "Checkpoint decoded"
        );

        let mut model = self.load_parameters(parameters, architecture)?;
        model.checkpoint = Some(checkpoint.to_path_buf());
        model.checkpoint_digest = Some(digest);

        info!(
            checkpoint = %checkpoint.display(),
            architecture = %model.architecture,
            parameters = model.parameter_count,
            "Model loaded"
        );
        Ok(model)
    }

    /// Validate already-decoded parameters and build an eval-mode model
    pub fn load_parameters<A: ModelArchitecture>(
        &self,
        parameters: ModelParameters,
        architecture: A,
    ) -> Result<LoadedModel> {
        architecture.schema().validate(&parameters)?;
        if let Some(manifest) = &self.manifest {
            manifest.validate(&parameters)?;
        }

        let name = architecture.name().to_string();
        let parameter_count = parameters.total_elements();
        let mut model = architecture.build(parameters)?;
        model.eval();

        Ok(LoadedModel {
            model,
            architecture: name,
            parameter_count,
            checkpoint: None,
            checkpoint_digest: None,
            device: self.device.clone(),
        })
    }
}

/// A model with trained parameters bound, in eval mode
pub struct LoadedModel {
    model: Box<dyn SpectralModel>,
    architecture: String,
    parameter_count: usize,
    checkpoint: Option<PathBuf>,
    checkpoint_digest: Option<String>,
    device: Device,
}

impl LoadedModel {
    pub fn architecture(&self) -> &str {
        &self.architecture
    }

    /// Scalar parameter count across all checkpoint tensors
    pub fn parameter_count(&self) -> usize {
        self.parameter_count
    }

    pub fn checkpoint(&self) -> Option<&Path> {
        self.checkpoint.as_deref()
    }

    pub fn checkpoint_digest(&self) -> Option<&str> {
        self.checkpoint_digest.as_deref()
    }

    /// Enhance one spectrogram
    ///
    /// Adds a batch dimension, runs exactly one forward pass and strips the
    /// batch dimension again. The output must have the input's shape.
    pub fn infer(&self, spec: &Spectrogram) -> Result<Spectrogram> {
        let batch = spec.to_batch_tensor(&self.device)?;
        let output = self.model.forward(&batch)?;

        if output.dims() != batch.dims() {
            return Err(EnhanceError::ShapeMismatch {
                expected: batch.dims().to_vec(),
                actual: output.dims().to_vec(),
            });
        }

        Spectrogram::from_batch_tensor(&output)
    }
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("architecture", &self.architecture)
            .field("parameter_count", &self.parameter_count)
            .field("checkpoint", &self.checkpoint)
            .finish_non_exhaustive()
    }
}
