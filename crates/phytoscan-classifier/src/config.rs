//! Predictor configuration

use crate::model_loader::{Architecture, DeviceSpec, ResourceSource, WeightFormat};
use phytoscan_core::{Error, Result, DEFAULT_CONFIDENCE_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Everything needed to bring up a [`crate::Predictor`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorConfig {
    /// Model name used in logs and status output
    #[serde(default = "default_name")]
    pub name: String,

    /// Class label file, one label per line
    pub labels: ResourceSource,

    /// Weight archive
    pub weights: ResourceSource,

    /// Network architecture the weights belong to
    #[serde(default)]
    pub architecture: Architecture,

    /// Weight archive format
    #[serde(default)]
    pub format: WeightFormat,

    /// Device selection policy
    #[serde(default)]
    pub device: DeviceSpec,

    /// Inference settings
    #[serde(default)]
    pub inference: InferenceConfig,
}

fn default_name() -> String {
    "plant-disease-resnet50".to_string()
}

/// Inference configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Confidence threshold used when a call does not pass one
    #[serde(default = "default_threshold")]
    pub threshold: f32,
}

fn default_threshold() -> f32 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
        }
    }
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            labels: ResourceSource::local("./ml_model/class_labels.txt"),
            weights: ResourceSource::local("./ml_model/plant_disease_resnet50.pth"),
            architecture: Architecture::default(),
            format: WeightFormat::default(),
            device: DeviceSpec::default(),
            inference: InferenceConfig::default(),
        }
    }
}

impl PredictorConfig {
    /// Configuration reading both resources from local paths
    pub fn from_local(labels: impl Into<PathBuf>, weights: impl Into<PathBuf>) -> Self {
        Self {
            labels: ResourceSource::local(labels),
            weights: ResourceSource::local(weights),
            ..Default::default()
        }
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&contents).map_err(|e| match e {
            Error::Config(msg) => Error::config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that cannot be expressed in the type system
    pub fn validate(&self) -> Result<()> {
        validate_threshold(self.inference.threshold)?;
        Ok(())
    }

    /// Set model name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set architecture
    pub fn with_architecture(mut self, architecture: Architecture) -> Self {
        self.architecture = architecture;
        self
    }

    /// Set weight format
    pub fn with_format(mut self, format: WeightFormat) -> Self {
        self.format = format;
        self
    }

    /// Set device
    pub fn with_device(mut self, device: DeviceSpec) -> Self {
        self.device = device;
        self
    }

    /// Set the default confidence threshold
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.inference.threshold = threshold;
        self
    }

    /// Replace the weight source
    pub fn with_weights(mut self, weights: ResourceSource) -> Self {
        self.weights = weights;
        self
    }

    /// Replace the label source
    pub fn with_labels(mut self, labels: ResourceSource) -> Self {
        self.labels = labels;
        self
    }
}

/// Reject thresholds outside `[0, 1]` (including NaN)
pub fn validate_threshold(threshold: f32) -> Result<f32> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(Error::config(format!(
            "confidence threshold must be within [0, 1], got {}",
            threshold
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
name: "plantvillage-resnet50"
labels:
  type: local
  path: "./ml_model/class_labels.txt"
weights:
  type: huggingface
  repo: "phytoscan/plantvillage-resnet50"
  filename: "model.safetensors"
architecture: resnet50
format: safetensors
device: "cuda:1"
inference:
  threshold: 0.75
"#;

        let config = PredictorConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.name, "plantvillage-resnet50");
        assert_eq!(config.architecture, Architecture::ResNet50);
        assert_eq!(config.format, WeightFormat::SafeTensors);
        assert_eq!(config.device, DeviceSpec::Cuda(1));
        assert_eq!(config.inference.threshold, 0.75);

        match &config.weights {
            ResourceSource::HuggingFace {
                repo,
                revision,
                filename,
            } => {
                assert_eq!(repo, "phytoscan/plantvillage-resnet50");
                assert_eq!(revision, "main");
                assert_eq!(filename, "model.safetensors");
            }
            _ => panic!("Expected HuggingFace source"),
        }
    }

    #[test]
    fn test_defaults_applied() {
        let yaml = r#"
labels:
  type: local
  path: "labels.txt"
weights:
  type: local
  path: "weights.pth"
"#;

        let config = PredictorConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.name, "plant-disease-resnet50");
        assert_eq!(config.architecture, Architecture::ResNet50);
        assert_eq!(config.format, WeightFormat::Auto);
        assert_eq!(config.device, DeviceSpec::Auto);
        assert_eq!(config.inference.threshold, 0.60);
    }

    #[test]
    fn test_out_of_range_threshold_rejected() {
        let yaml = r#"
labels: { type: local, path: "labels.txt" }
weights: { type: local, path: "weights.pth" }
inference:
  threshold: 1.5
"#;

        assert!(matches!(
            PredictorConfig::from_yaml(yaml).unwrap_err(),
            Error::Config(_)
        ));
    }

    #[test]
    fn test_unknown_device_rejected() {
        let yaml = r#"
labels: { type: local, path: "labels.txt" }
weights: { type: local, path: "weights.pth" }
device: "tpu"
"#;

        assert!(PredictorConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_validate_threshold_bounds() {
        assert!(validate_threshold(0.0).is_ok());
        assert!(validate_threshold(1.0).is_ok());
        assert!(validate_threshold(-0.01).is_err());
        assert!(validate_threshold(f32::NAN).is_err());
    }

    #[test]
    fn test_builder() {
        let config = PredictorConfig::from_local("labels.txt", "weights.safetensors")
            .with_architecture(Architecture::ResNet18)
            .with_device(DeviceSpec::Cpu)
            .with_threshold(0.4);

        assert_eq!(config.labels, ResourceSource::local("labels.txt"));
        assert_eq!(config.architecture, Architecture::ResNet18);
        assert_eq!(config.inference.threshold, 0.4);
    }

    #[test]
    fn test_yaml_roundtrip_of_device() {
        let config = PredictorConfig::default().with_device(DeviceSpec::Metal(0));
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("metal:0"));
    }
}
