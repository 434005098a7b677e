//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::Path;

use tracing::info;

use crate::config::{Backend, EnhanceConfig};
use crate::engine::{Pipeline, RunReport};
use crate::error::Result;
use crate::neural::{file_digest, read_checkpoint, ModelSchema, PassthroughArchitecture};

/// Run the enhancement pipeline with the configured backend.
pub fn enhance(config: &EnhanceConfig) -> Result<RunReport> {
    info!(
        backend = %config.backend,
        checkpoint = %config.checkpoint_path.display(),
        input = %config.input_path.display(),
        "Starting enhancement"
    );

    match config.backend {
        Backend::Passthrough => Pipeline::new(config).run_with(PassthroughArchitecture::new()),
        Backend::Onnx => enhance_onnx(config),
    }
}

#[cfg(feature = "onnx")]
fn enhance_onnx(config: &EnhanceConfig) -> Result<RunReport> {
    use crate::error::EnhanceError;
    use crate::neural::OnnxArchitecture;

    // Report a missing checkpoint ahead of any graph problem
    if !config.checkpoint_path.exists() {
        return Err(EnhanceError::FileNotFound {
            path: config.checkpoint_path.display().to_string(),
        });
    }

    let architecture = OnnxArchitecture::open(
        &config.graph_path,
        &config.spectrum_input,
        config.intra_threads,
    )?;
    Pipeline::new(config).run_with(architecture)
}

#[cfg(not(feature = "onnx"))]
fn enhance_onnx(_config: &EnhanceConfig) -> Result<RunReport> {
    Err(crate::error::EnhanceError::BackendUnavailable {
        backend: "onnx (built without the 'onnx' feature)".to_string(),
    })
}

/// List the parameters stored in a checkpoint.
///
/// With `manifest` the output is a strict schema in JSON, ready to be used
/// as `--schema` for later runs.
pub fn inspect(checkpoint: &Path, key: &str, manifest: bool) -> Result<()> {
    info!("Inspecting checkpoint: {}", checkpoint.display());

    let parameters = read_checkpoint(checkpoint, Some(key), &candle_core::Device::Cpu)?;

    if manifest {
        println!("{}", ModelSchema::from_parameters(&parameters).to_json()?);
        return Ok(());
    }

    println!("Checkpoint: {}", checkpoint.display());
    println!("SHA-256: {}", file_digest(checkpoint)?);
    println!("{:-<72}", "");
    for (name, tensor) in parameters.iter() {
        println!(
            "{:<48} {:<16} {:?}",
            name,
            format!("{:?}", tensor.dims()),
            tensor.dtype()
        );
    }
    println!("{:-<72}", "");
    println!(
        "{} tensors, {} parameters",
        parameters.len(),
        parameters.total_elements()
    );

    Ok(())
}
