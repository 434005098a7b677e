//! Checkpoint reading
//!
//! Two on-disk formats are understood:
//! - PyTorch `torch.save` archives (zip + pickle), parameters under a
//!   state-dict key such as `model`
//! - safetensors files holding the parameters at top level

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use candle_core::{DType, Device, Tensor};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{EnhanceError, Result};

/// State-dict entry trained checkpoints store their parameters under
pub const DEFAULT_STATE_DICT_KEY: &str = "model";

/// On-disk checkpoint layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointFormat {
    PyTorch,
    SafeTensors,
}

impl CheckpointFormat {
    /// `.safetensors` files are safetensors, anything else is a PyTorch archive
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("safetensors") => CheckpointFormat::SafeTensors,
            _ => CheckpointFormat::PyTorch,
        }
    }
}

/// Named parameter tensors, ordered by name
#[derive(Debug, Clone, Default)]
pub struct ModelParameters {
    tensors: BTreeMap<String, Tensor>,
}

impl ModelParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tensors<I>(tensors: I) -> Self
    where
        I: IntoIterator<Item = (String, Tensor)>,
    {
        Self {
            tensors: tensors.into_iter().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.tensors.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tensors.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tensor)> {
        self.tensors.iter().map(|(name, tensor)| (name.as_str(), tensor))
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Total number of scalar values across all tensors
    pub fn total_elements(&self) -> usize {
        self.tensors.values().map(Tensor::elem_count).sum()
    }

    /// Flatten one parameter to `f32` values together with its shape
    pub fn flat_f32(&self, name: &str) -> Result<(Vec<usize>, Vec<f32>)> {
        let tensor = self.get(name).ok_or_else(|| EnhanceError::Inference {
            reason: format!("parameter {} was not loaded", name),
        })?;
        let data = tensor
            .to_dtype(DType::F32)?
            .flatten_all()?
            .to_vec1::<f32>()?;
        Ok((tensor.dims().to_vec(), data))
    }
}

/// Read every parameter tensor of a checkpoint onto `device`
///
/// `key` selects the state-dict entry of a PyTorch archive and is ignored
/// for safetensors files.
///
/// # Errors
/// * `FileNotFound` - If the checkpoint does not exist
/// * `InvalidCheckpoint` - If the path is not a file, cannot be decoded or
///   lacks `key`
pub fn read_checkpoint(path: &Path, key: Option<&str>, device: &Device) -> Result<ModelParameters> {
    require_checkpoint_file(path)?;

    let format = CheckpointFormat::detect(path);
    let invalid = |e: candle_core::Error| EnhanceError::InvalidCheckpoint {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    let tensors: Vec<(String, Tensor)> = match format {
        CheckpointFormat::PyTorch => candle_core::pickle::read_all_with_key(path, key)
            .map_err(invalid)?
            .into_iter()
            .map(|(name, tensor)| -> Result<(String, Tensor)> {
                Ok((name, tensor.to_device(device)?))
            })
            .collect::<Result<_>>()?,
        CheckpointFormat::SafeTensors => candle_core::safetensors::load(path, device)
            .map_err(invalid)?
            .into_iter()
            .collect(),
    };

    debug!(
        path = %path.display(),
        format = ?format,
        tensors = tensors.len(),
        "Read checkpoint"
    );

    Ok(ModelParameters::from_tensors(tensors))
}

/// Fail unless `path` names an existing regular file
pub(crate) fn require_checkpoint_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(EnhanceError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    if !path.is_file() {
        return Err(EnhanceError::InvalidCheckpoint {
            path: path.display().to_string(),
            reason: "not a regular file".to_string(),
        });
    }
    Ok(())
}

/// Hex SHA-256 of a file
pub fn file_digest(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use tempfile::tempdir;

    /// torch.save archive: {'model': {encoder.weight, encoder.bias}, 'epoch': 10}
    fn torch_fixture() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/tiny_state_dict.tar")
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            CheckpointFormat::detect(Path::new("ckpt/model.safetensors")),
            CheckpointFormat::SafeTensors
        );
        assert_eq!(
            CheckpointFormat::detect(Path::new("checkpoints/model_trained_on_dns3.tar")),
            CheckpointFormat::PyTorch
        );
    }

    #[test]
    fn test_missing_checkpoint() {
        let err = read_checkpoint(Path::new("/nonexistent/model.tar"), Some("model"), &Device::Cpu)
            .unwrap_err();
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");
    }

    #[test]
    fn test_directory_is_not_a_checkpoint() {
        let dir = tempdir().unwrap();
        let err = read_checkpoint(dir.path(), Some("model"), &Device::Cpu).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CHECKPOINT");
    }

    #[test]
    fn test_torch_archive_under_model_key() {
        let params = read_checkpoint(&torch_fixture(), Some("model"), &Device::Cpu).unwrap();

        assert_eq!(
            params.names().collect::<Vec<_>>(),
            vec!["encoder.bias", "encoder.weight"]
        );
        assert_eq!(params.total_elements(), 8);

        let (shape, data) = params.flat_f32("encoder.weight").unwrap();
        assert_eq!(shape, vec![2, 3]);
        assert_eq!(data, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);

        let (shape, data) = params.flat_f32("encoder.bias").unwrap();
        assert_eq!(shape, vec![2]);
        assert_eq!(data, vec![0.5, -0.5]);
    }

    #[test]
    fn test_torch_archive_missing_key() {
        let err = read_checkpoint(&torch_fixture(), Some("state_dict"), &Device::Cpu).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CHECKPOINT");
    }

    #[test]
    fn test_corrupt_archive_is_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.tar");
        std::fs::write(&path, b"not a zip archive").unwrap();

        let err = read_checkpoint(&path, Some("model"), &Device::Cpu).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CHECKPOINT");
    }

    #[test]
    fn test_safetensors_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("params.safetensors");

        let mut tensors = HashMap::new();
        tensors.insert(
            "encoder.weight".to_string(),
            Tensor::arange(0f32, 6f32, &Device::Cpu)
                .unwrap()
                .reshape((2, 3))
                .unwrap(),
        );
        tensors.insert(
            "encoder.bias".to_string(),
            Tensor::zeros(2, DType::F32, &Device::Cpu).unwrap(),
        );
        candle_core::safetensors::save(&tensors, &path).unwrap();

        let params = read_checkpoint(&path, None, &Device::Cpu).unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params.total_elements(), 8);
        assert_eq!(
            params.names().collect::<Vec<_>>(),
            vec!["encoder.bias", "encoder.weight"]
        );

        let (shape, data) = params.flat_f32("encoder.weight").unwrap();
        assert_eq!(shape, vec![2, 3]);
        assert_eq!(data, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_digest_is_stable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        std::fs::write(&path, b"abc").unwrap();

        assert_eq!(
            file_digest(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
