//! Spectral model traits
//!
//! The network itself is opaque: anything that maps a batch of
//! spectrograms `(batch, bins, frames, 2)` to a batch of the same shape can
//! serve as the enhancement model.

use candle_core::Tensor;

use crate::error::Result;
use crate::neural::{ModelParameters, ModelSchema};

/// Inference capability of a loaded model
pub trait SpectralModel: Send + Sync {
    /// Run one forward pass over a `(batch, bins, frames, 2)` tensor
    fn forward(&self, batch: &Tensor) -> Result<Tensor>;

    /// Switch off training-only behaviour
    fn eval(&mut self) {}
}

/// Adapts a plain function or closure into a `SpectralModel`
pub struct FnModel<F> {
    forward: F,
}

impl<F> FnModel<F>
where
    F: Fn(&Tensor) -> Result<Tensor> + Send + Sync,
{
    pub fn new(forward: F) -> Self {
        Self { forward }
    }
}

impl<F> SpectralModel for FnModel<F>
where
    F: Fn(&Tensor) -> Result<Tensor> + Send + Sync,
{
    fn forward(&self, batch: &Tensor) -> Result<Tensor> {
        (self.forward)(batch)
    }
}

/// Constructs a model from trained parameters
///
/// An architecture declares the parameter structure it expects and builds
/// the inference capability once the checkpoint has been validated against
/// that structure.
pub trait ModelArchitecture {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Expected parameter names and shapes
    fn schema(&self) -> &ModelSchema;

    /// Take ownership of validated parameters and build the model
    fn build(self, parameters: ModelParameters) -> Result<Box<dyn SpectralModel>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};

    #[test]
    fn test_fn_model_forwards_to_closure() {
        let model = FnModel::new(|batch: &Tensor| Ok(batch.affine(2.0, 0.0)?));
        let input = Tensor::ones((1, 3, 2, 2), DType::F32, &Device::Cpu).unwrap();

        let output = model.forward(&input).unwrap();
        let values = output.flatten_all().unwrap().to_vec1::<f32>().unwrap();
        assert!(values.iter().all(|&v| v == 2.0));
    }
}
