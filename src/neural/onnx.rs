//! ONNX Runtime backend
//!
//! Runs an exported graph of the enhancement network whose weights were left
//! out at export time: every graph input other than the spectrum is a model
//! parameter, fed by name from the checkpoint.

use std::path::Path;
use std::sync::Mutex;

use candle_core::{DType, Tensor};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{DynValue, Value};
use tracing::{debug, info};

use crate::error::{EnhanceError, Result};
use crate::neural::{ModelArchitecture, ModelParameters, ModelSchema, ParameterSpec, SpectralModel};

/// Graph input receiving the `(batch, bins, frames, 2)` spectrum
pub const DEFAULT_SPECTRUM_INPUT: &str = "mix";

/// An opened ONNX graph waiting for its parameters
pub struct OnnxArchitecture {
    session: Session,
    spectrum_input: String,
    output: String,
    schema: ModelSchema,
}

impl OnnxArchitecture {
    /// Open `graph` and derive the expected parameters from its inputs
    ///
    /// # Errors
    /// * `FileNotFound` - If the graph file does not exist
    /// * `Inference` - If the runtime rejects the graph or it lacks `spectrum_input`
    pub fn open(graph: &Path, spectrum_input: &str, intra_threads: usize) -> Result<Self> {
        if !graph.exists() {
            return Err(EnhanceError::FileNotFound {
                path: graph.display().to_string(),
            });
        }

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(intra_threads)?
            .commit_from_file(graph)?;

        if !session.inputs.iter().any(|input| input.name == spectrum_input) {
            return Err(EnhanceError::Inference {
                reason: format!("graph has no input named {}", spectrum_input),
            });
        }
        let output = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| EnhanceError::Inference {
                reason: "graph has no outputs".to_string(),
            })?;

        let parameters = session
            .inputs
            .iter()
            .filter(|input| input.name != spectrum_input)
            .map(|input| ParameterSpec::new(input.name.clone(), None))
            .collect();

        info!(
            graph = %graph.display(),
            inputs = session.inputs.len(),
            output = %output,
            "ONNX graph opened"
        );

        Ok(Self {
            session,
            spectrum_input: spectrum_input.to_string(),
            output,
            schema: ModelSchema::new(parameters, false),
        })
    }
}

impl ModelArchitecture for OnnxArchitecture {
    fn name(&self) -> &str {
        "onnx"
    }

    fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    fn build(self, parameters: ModelParameters) -> Result<Box<dyn SpectralModel>> {
        let bound = self
            .schema
            .parameters()
            .iter()
            .map(|spec| {
                let (shape, data) = parameters.flat_f32(&spec.name)?;
                Ok(BoundParameter {
                    name: spec.name.clone(),
                    shape,
                    data,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(bound = bound.len(), "Parameters bound to graph inputs");

        Ok(Box::new(OnnxModel {
            session: Mutex::new(self.session),
            spectrum_input: self.spectrum_input,
            output: self.output,
            parameters: bound,
        }))
    }
}

struct BoundParameter {
    name: String,
    shape: Vec<usize>,
    data: Vec<f32>,
}

/// ONNX graph with its parameters bound
pub struct OnnxModel {
    session: Mutex<Session>,
    spectrum_input: String,
    output: String,
    parameters: Vec<BoundParameter>,
}

impl SpectralModel for OnnxModel {
    fn forward(&self, batch: &Tensor) -> Result<Tensor> {
        let shape = batch.dims().to_vec();
        let data = batch.to_dtype(DType::F32)?.flatten_all()?.to_vec1::<f32>()?;

        let mut inputs: Vec<(String, DynValue)> = Vec::with_capacity(self.parameters.len() + 1);
        inputs.push((
            self.spectrum_input.clone(),
            Value::from_array((shape, data))?.into_dyn(),
        ));
        for param in &self.parameters {
            inputs.push((
                param.name.clone(),
                Value::from_array((param.shape.clone(), param.data.clone()))?.into_dyn(),
            ));
        }

        let mut session = self.session.lock().map_err(|_| EnhanceError::Inference {
            reason: "session lock poisoned".to_string(),
        })?;
        let outputs = session.run(inputs)?;

        let value = outputs
            .get(self.output.as_str())
            .ok_or_else(|| EnhanceError::Inference {
                reason: format!("missing output {}", self.output),
            })?;
        let (out_shape, out_data) = value.try_extract_tensor::<f32>()?;
        let dims: Vec<usize> = out_shape.iter().map(|&d| d as usize).collect();

        Ok(Tensor::from_slice(out_data, dims, batch.device())?)
    }
}
