//! Expected model structure and checkpoint compatibility checks

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{EnhanceError, Result};
use crate::neural::ModelParameters;

/// Names listed per category before the report is abbreviated
const REPORT_NAME_LIMIT: usize = 5;

/// One expected parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,

    /// Expected shape, or `None` when only the name is known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<usize>>,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, shape: Option<Vec<usize>>) -> Self {
        Self {
            name: name.into(),
            shape,
        }
    }
}

/// Parameter structure a model expects from its checkpoint
///
/// A strict schema rejects checkpoint entries it does not list; a lenient
/// one only requires its own entries to be present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSchema {
    #[serde(default)]
    parameters: Vec<ParameterSpec>,

    #[serde(default)]
    strict: bool,
}

impl ModelSchema {
    pub fn new(parameters: Vec<ParameterSpec>, strict: bool) -> Self {
        Self { parameters, strict }
    }

    /// Lenient schema with no required parameters
    pub fn empty() -> Self {
        Self::default()
    }

    /// Strict schema matching exactly the names and shapes of `parameters`
    pub fn from_parameters(parameters: &ModelParameters) -> Self {
        let parameters = parameters
            .iter()
            .map(|(name, tensor)| ParameterSpec::new(name, Some(tensor.dims().to_vec())))
            .collect();
        Self {
            parameters,
            strict: true,
        }
    }

    /// Load a schema manifest from JSON
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

    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Compare a checkpoint against this schema
    pub fn check(&self, parameters: &ModelParameters) -> SchemaReport {
        let mut report = SchemaReport::default();

        for spec in &self.parameters {
            match parameters.get(&spec.name) {
                None => report.missing.push(spec.name.clone()),
                Some(tensor) => {
                    if let Some(expected) = &spec.shape {
                        if tensor.dims() != expected.as_slice() {
                            report.mismatched.push(ShapeMismatch {
                                name: spec.name.clone(),
                                expected: expected.clone(),
                                actual: tensor.dims().to_vec(),
                            });
                        }
                    }
                }
            }
        }

        report.unexpected = parameters
            .names()
            .filter(|name| !self.parameters.iter().any(|spec| spec.name == *name))
            .map(str::to_string)
            .collect();

        report
    }

    /// Fail with `SchemaMismatch` unless `parameters` satisfy this schema
    pub fn validate(&self, parameters: &ModelParameters) -> Result<()> {
        let report = self.check(parameters);
        if !report.is_compatible(self.strict) {
            return Err(EnhanceError::SchemaMismatch { report });
        }
        if !report.unexpected.is_empty() {
            warn!(
                count = report.unexpected.len(),
                "Ignoring checkpoint entries the model does not use"
            );
        }
        Ok(())
    }
}

/// Shape disagreement for one parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeMismatch {
    pub name: String,
    pub expected: Vec<usize>,
    pub actual: Vec<usize>,
}

/// Differences between a checkpoint and a schema
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaReport {
    /// Expected by the model, absent from the checkpoint
    pub missing: Vec<String>,
    /// Present in the checkpoint, unknown to the model
    pub unexpected: Vec<String>,
    /// Present in both with different shapes
    pub mismatched: Vec<ShapeMismatch>,
}

impl SchemaReport {
    /// Unexpected entries only count against strict schemas
    pub fn is_compatible(&self, strict: bool) -> bool {
        self.missing.is_empty()
            && self.mismatched.is_empty()
            && (!strict || self.unexpected.is_empty())
    }
}

impl fmt::Display for SchemaReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("missing {}", abbreviate(&self.missing)));
        }
        if !self.unexpected.is_empty() {
            parts.push(format!("unexpected {}", abbreviate(&self.unexpected)));
        }
        for mismatch in self.mismatched.iter().take(REPORT_NAME_LIMIT) {
            parts.push(format!(
                "shape of {}: expected {:?}, got {:?}",
                mismatch.name, mismatch.expected, mismatch.actual
            ));
        }
        if self.mismatched.len() > REPORT_NAME_LIMIT {
            parts.push(format!(
                "{} more shape mismatches",
                self.mismatched.len() - REPORT_NAME_LIMIT
            ));
        }
        if parts.is_empty() {
            return write!(f, "no differences");
        }
        write!(f, "{}", parts.join("; "))
    }
}

fn abbreviate(names: &[String]) -> String {
    let shown = names
        .iter()
        .take(REPORT_NAME_LIMIT)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    if names.len() > REPORT_NAME_LIMIT {
        format!("[{}, +{} more]", shown, names.len() - REPORT_NAME_LIMIT)
    } else {
        format!("[{}]", shown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device, Tensor};
    use pretty_assertions::assert_eq;

    fn params(entries: &[(&str, &[usize])]) -> ModelParameters {
        ModelParameters::from_tensors(entries.iter().map(|(name, shape)| {
            (
                name.to_string(),
                Tensor::zeros(*shape, DType::F32, &Device::Cpu).unwrap(),
            )
        }))
    }

    fn schema(strict: bool) -> ModelSchema {
        ModelSchema::new(
            vec![
                ParameterSpec::new("conv.weight", Some(vec![16, 9, 1, 5])),
                ParameterSpec::new("conv.bias", Some(vec![16])),
                ParameterSpec::new("gru.weight_ih", None),
            ],
            strict,
        )
    }

    #[test]
    fn test_matching_checkpoint_is_accepted() {
        let p = params(&[
            ("conv.weight", &[16, 9, 1, 5]),
            ("conv.bias", &[16]),
            ("gru.weight_ih", &[48, 16]),
        ]);
        assert!(schema(true).validate(&p).is_ok());
    }

    #[test]
    fn test_missing_and_mismatched_are_reported() {
        let p = params(&[("conv.weight", &[16, 9, 1, 3]), ("gru.weight_ih", &[48, 16])]);
        let report = schema(false).check(&p);

        assert_eq!(report.missing, vec!["conv.bias".to_string()]);
        assert_eq!(
            report.mismatched,
            vec![ShapeMismatch {
                name: "conv.weight".to_string(),
                expected: vec![16, 9, 1, 5],
                actual: vec![16, 9, 1, 3],
            }]
        );
        assert!(!report.is_compatible(false));
        assert!(report.to_string().contains("conv.bias"));
    }

    #[test]
    fn test_unexpected_entries_depend_on_strictness() {
        let p = params(&[
            ("conv.weight", &[16, 9, 1, 5]),
            ("conv.bias", &[16]),
            ("gru.weight_ih", &[48, 16]),
            ("bn.num_batches_tracked", &[]),
        ]);

        assert!(schema(false).validate(&p).is_ok());
        match schema(true).validate(&p) {
            Err(EnhanceError::SchemaMismatch { report }) => {
                assert_eq!(report.unexpected, vec!["bn.num_batches_tracked".to_string()]);
            }
            other => panic!("Expected SchemaMismatch, got: {:?}", other),
        }
    }

    #[test]
    fn test_schema_from_parameters_is_exact() {
        let p = params(&[("a", &[2, 3]), ("b", &[4])]);
        let captured = ModelSchema::from_parameters(&p);

        assert!(captured.is_strict());
        assert_eq!(captured.len(), 2);
        assert!(captured.validate(&p).is_ok());
    }

    #[test]
    fn test_json_manifest() {
        let json = r#"{
            "strict": true,
            "parameters": [
                { "name": "erb.erb_fc.weight", "shape": [64, 192] },
                { "name": "mask.scale" }
            ]
        }"#;
        let parsed: ModelSchema = serde_json::from_str(json).unwrap();
        assert!(parsed.is_strict());
        assert_eq!(parsed.parameters()[0].shape, Some(vec![64, 192]));
        assert_eq!(parsed.parameters()[1].shape, None);

        let reparsed: ModelSchema = serde_json::from_str(&parsed.to_json().unwrap()).unwrap();
        assert_eq!(reparsed, parsed);
    }

    #[test]
    fn test_long_report_is_abbreviated() {
        let report = SchemaReport {
            missing: (0..8).map(|i| format!("p{}", i)).collect(),
            ..Default::default()
        };
        let text = report.to_string();
        assert!(text.contains("+3 more"));
        assert!(!text.contains("p7"));
    }
}
