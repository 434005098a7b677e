//! Run configuration
//!
//! One `EnhanceConfig` is built at startup, either from defaults or a JSON
//! file, then adjusted by command-line flags and passed to the pipeline.

use std::path::{Path, PathBuf};

use candle_core::Device;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{EnhanceError, Result};
use crate::neural::DEFAULT_STATE_DICT_KEY;
use crate::spectral::StftConfig;

/// Sample rate the enhancement model was trained at
pub const MODEL_SAMPLE_RATE: u32 = 16_000;

/// Model backend used for inference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Exported ONNX graph fed with the checkpoint parameters
    Onnx,
    /// Identity model; output equals the STFT/ISTFT round trip
    Passthrough,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Onnx => write!(f, "onnx"),
            Backend::Passthrough => write!(f, "passthrough"),
        }
    }
}

/// Run settings
///
/// The input sample rate is fixed at `MODEL_SAMPLE_RATE` and is not
/// configurable; unknown keys in a JSON file are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnhanceConfig {
    pub checkpoint_path: PathBuf,
    pub input_path: PathBuf,
    pub output_path: PathBuf,

    /// Exported graph for the ONNX backend
    pub graph_path: PathBuf,

    /// Optional JSON manifest the checkpoint must also satisfy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_path: Option<PathBuf>,

    /// Checkpoint entry holding the parameters
    pub state_dict_key: String,

    pub stft: StftConfig,
    pub backend: Backend,

    /// Graph input receiving the spectrum
    pub spectrum_input: String,

    /// ONNX Runtime intra-op threads
    pub intra_threads: usize,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            checkpoint_path: PathBuf::from("checkpoints/model_trained_on_dns3.tar"),
            input_path: PathBuf::from("test_wavs/mix.wav"),
            output_path: PathBuf::from("test_wavs/enh.wav"),
            graph_path: PathBuf::from("checkpoints/model_trained_on_dns3.onnx"),
            schema_path: None,
            state_dict_key: DEFAULT_STATE_DICT_KEY.to_string(),
            stft: StftConfig::default(),
            backend: Backend::Onnx,
            spectrum_input: "mix".to_string(),
            intra_threads: 1,
        }
    }
}

impl EnhanceConfig {
    /// Load a configuration from JSON; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(EnhanceError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Numeric device for tensors and checkpoint parameters
    pub fn device(&self) -> Device {
        Device::Cpu
    }
}
