//! Identity model for exercising the signal path
//!
//! The passthrough model returns its input unchanged, so a full run with it
//! measures only the STFT/ISTFT round trip.

use candle_core::Tensor;

use crate::error::Result;
use crate::neural::{ModelArchitecture, ModelParameters, ModelSchema, SpectralModel};

/// Returns the input batch unchanged
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughModel {
    eval_mode: bool,
}

impl PassthroughModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_eval(&self) -> bool {
        self.eval_mode
    }
}

impl SpectralModel for PassthroughModel {
    fn forward(&self, batch: &Tensor) -> Result<Tensor> {
        Ok(batch.clone())
    }

    fn eval(&mut self) {
        self.eval_mode = true;
    }
}

/// Architecture producing [`PassthroughModel`]
///
/// Accepts any checkpoint unless given a schema to check against.
#[derive(Debug, Clone, Default)]
pub struct PassthroughArchitecture {
    schema: ModelSchema,
}

impl PassthroughArchitecture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(schema: ModelSchema) -> Self {
        Self { schema }
    }
}

impl ModelArchitecture for PassthroughArchitecture {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    fn build(self, _parameters: ModelParameters) -> Result<Box<dyn SpectralModel>> {
        Ok(Box::new(PassthroughModel::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neural::ParameterSpec;
    use candle_core::{DType, Device};

    #[test]
    fn test_forward_is_identity() {
        let model = PassthroughModel::new();
        let input = Tensor::arange(0f32, 16f32, &Device::Cpu)
            .unwrap()
            .reshape((1, 2, 4, 2))
            .unwrap();

        let output = model.forward(&input).unwrap();
        assert_eq!(output.dims(), input.dims());
        assert_eq!(
            output.flatten_all().unwrap().to_vec1::<f32>().unwrap(),
            input.flatten_all().unwrap().to_vec1::<f32>().unwrap()
        );
    }

    #[test]
    fn test_eval_switch() {
        let mut model = PassthroughModel::new();
        assert!(!model.is_eval());
        model.eval();
        assert!(model.is_eval());
    }

    #[test]
    fn test_schema_is_enforced_when_given() {
        let schema = ModelSchema::new(vec![ParameterSpec::new("mask.weight", Some(vec![4]))], true);
        let arch = PassthroughArchitecture::with_schema(schema);

        let wrong = ModelParameters::from_tensors([(
            "mask.weight".to_string(),
            Tensor::zeros(3, DType::F32, &Device::Cpu).unwrap(),
        )]);
        assert!(arch.schema().validate(&wrong).is_err());
        assert!(PassthroughArchitecture::new().schema().validate(&wrong).is_ok());
    }
}
