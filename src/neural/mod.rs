//! Enhancement model loading and inference
//!
//! This module provides:
//! - `SpectralModel` / `ModelArchitecture` traits the pipeline runs against
//! - Checkpoint reading (PyTorch archives and safetensors)
//! - Schema validation of checkpoint parameters
//! - The passthrough identity model and, with the `onnx` feature, an ONNX
//!   Runtime backend

mod checkpoint;
mod loader;
mod mock;
mod model;
#[cfg(feature = "onnx")]
mod onnx;
mod schema;

pub use checkpoint::{
    file_digest, read_checkpoint, CheckpointFormat, ModelParameters, DEFAULT_STATE_DICT_KEY,
};
pub use loader::{LoadedModel, ModelLoader};
pub use mock::{PassthroughArchitecture, PassthroughModel};
pub use model::{FnModel, ModelArchitecture, SpectralModel};
#[cfg(feature = "onnx")]
pub use onnx::{OnnxArchitecture, OnnxModel, DEFAULT_SPECTRUM_INPUT};
pub use schema::{ModelSchema, ParameterSpec, SchemaReport, ShapeMismatch};
