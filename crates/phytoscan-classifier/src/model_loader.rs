//! Model loading for Candle-based ResNet classifiers
//!
//! Covers everything between a configuration entry and a ready-to-run
//! network: resolving resource locations (local or Hugging Face Hub),
//! choosing the compute device, opening the weight archive and building the
//! architecture on top of it.

use candle_core::utils::{cuda_is_available, metal_is_available};
use candle_core::{DType, Device, DeviceLocation};
use candle_nn::{Func, VarBuilder};
use candle_transformers::models::resnet;
use hf_hub::{api::sync::Api, Repo, RepoType};
use phytoscan_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Location of a label file or weight archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResourceSource {
    /// Load from local file system
    Local { path: PathBuf },

    /// Download from Hugging Face Hub
    HuggingFace {
        repo: String,
        #[serde(default = "default_revision")]
        revision: String,
        filename: String,
    },
}

fn default_revision() -> String {
    "main".to_string()
}

impl ResourceSource {
    /// Local file source
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::Local { path: path.into() }
    }

    /// Hugging Face Hub source on the `main` revision
    pub fn hugging_face(repo: impl Into<String>, filename: impl Into<String>) -> Self {
        Self::HuggingFace {
            repo: repo.into(),
            revision: default_revision(),
            filename: filename.into(),
        }
    }

    /// Resolve the source to a readable local path, downloading if needed
    pub fn resolve(&self) -> Result<PathBuf> {
        match self {
            Self::Local { path } => {
                if !path.is_file() {
                    return Err(Error::resource(format!(
                        "File not found: {}",
                        path.display()
                    )));
                }
                Ok(path.clone())
            }
            Self::HuggingFace {
                repo,
                revision,
                filename,
            } => {
                tracing::info!(
                    "Fetching {} from HuggingFace: {} @ {}",
                    filename,
                    repo,
                    revision
                );

                let api = Api::new().map_err(|e| {
                    Error::resource(format!("Failed to initialize HuggingFace API: {}", e))
                })?;

                let repo_obj = api.repo(Repo::with_revision(
                    repo.clone(),
                    RepoType::Model,
                    revision.clone(),
                ));

                repo_obj.get(filename).map_err(|e| {
                    Error::resource(format!(
                        "Failed to download {} from {}: {}",
                        filename, repo, e
                    ))
                })
            }
        }
    }
}

impl fmt::Display for ResourceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { path } => write!(f, "{}", path.display()),
            Self::HuggingFace {
                repo,
                revision,
                filename,
            } => write!(f, "hf://{}@{}/{}", repo, revision, filename),
        }
    }
}

/// Weight archive format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightFormat {
    /// Pick from the file extension
    #[default]
    Auto,
    /// PyTorch state dict (`.pth`, `.pt`, `.bin`)
    PyTorch,
    /// SafeTensors
    SafeTensors,
}

impl WeightFormat {
    /// Concrete format for a path; never returns `Auto`
    pub fn resolve(self, path: &Path) -> Self {
        match self {
            Self::Auto => match path.extension().and_then(|s| s.to_str()) {
                Some(ext) if ext.eq_ignore_ascii_case("safetensors") => Self::SafeTensors,
                _ => Self::PyTorch,
            },
            other => other,
        }
    }
}

/// ResNet variants with torchvision parameter naming
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    ResNet18,
    ResNet34,
    #[default]
    ResNet50,
    ResNet101,
    ResNet152,
}

impl Architecture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResNet18 => "resnet18",
            Self::ResNet34 => "resnet34",
            Self::ResNet50 => "resnet50",
            Self::ResNet101 => "resnet101",
            Self::ResNet152 => "resnet152",
        }
    }

    /// Build the network with an `fc` head of `num_classes` outputs.
    ///
    /// Every parameter is fetched from `vb` while building, so missing
    /// tensors and shape mismatches surface here rather than at the first
    /// forward pass.
    pub fn build(self, num_classes: usize, vb: VarBuilder<'static>) -> Result<Func<'static>> {
        let model = match self {
            Self::ResNet18 => resnet::resnet18(num_classes, vb),
            Self::ResNet34 => resnet::resnet34(num_classes, vb),
            Self::ResNet50 => resnet::resnet50(num_classes, vb),
            Self::ResNet101 => resnet::resnet101(num_classes, vb),
            Self::ResNet152 => resnet::resnet152(num_classes, vb),
        };

        model.map_err(|e| {
            Error::model_load(format!(
                "Failed to build {} with {} classes: {}",
                self.as_str(),
                num_classes,
                e
            ))
        })
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Architecture {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "resnet18" => Ok(Self::ResNet18),
            "resnet34" => Ok(Self::ResNet34),
            "resnet50" => Ok(Self::ResNet50),
            "resnet101" => Ok(Self::ResNet101),
            "resnet152" => Ok(Self::ResNet152),
            other => Err(format!("unknown architecture '{}'", other)),
        }
    }
}

/// Device selection policy, resolved once when a predictor is loaded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DeviceSpec {
    /// CUDA if available, then Metal, otherwise CPU
    #[default]
    Auto,
    /// CPU inference (always available)
    Cpu,
    /// CUDA GPU inference
    Cuda(usize),
    /// Metal (Apple Silicon)
    Metal(usize),
}

impl DeviceSpec {
    /// Create the Candle device for this policy
    pub fn create(self) -> Result<Device> {
        match self {
            Self::Auto => {
                if cuda_is_available() {
                    Self::Cuda(0).create()
                } else if metal_is_available() {
                    Self::Metal(0).create()
                } else {
                    Ok(Device::Cpu)
                }
            }
            Self::Cpu => Ok(Device::Cpu),
            Self::Cuda(idx) => Device::new_cuda(idx).map_err(|e| {
                Error::config(format!("Failed to create CUDA device {}: {}", idx, e))
            }),
            Self::Metal(idx) => Device::new_metal(idx).map_err(|e| {
                Error::config(format!("Failed to create Metal device {}: {}", idx, e))
            }),
        }
    }
}

impl fmt::Display for DeviceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Cpu => f.write_str("cpu"),
            Self::Cuda(idx) => write!(f, "cuda:{}", idx),
            Self::Metal(idx) => write!(f, "metal:{}", idx),
        }
    }
}

impl FromStr for DeviceSpec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let (kind, index) = match lower.split_once(':') {
            Some((kind, idx)) => {
                let idx = idx
                    .parse::<usize>()
                    .map_err(|_| format!("invalid device index in '{}'", s))?;
                (kind.to_string(), idx)
            }
            None => (lower, 0),
        };

        match kind.as_str() {
            "auto" => Ok(Self::Auto),
            "cpu" => Ok(Self::Cpu),
            "cuda" | "gpu" => Ok(Self::Cuda(index)),
            "metal" | "mps" => Ok(Self::Metal(index)),
            _ => Err(format!("unknown device '{}'", s)),
        }
    }
}

impl TryFrom<String> for DeviceSpec {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DeviceSpec> for String {
    fn from(value: DeviceSpec) -> Self {
        value.to_string()
    }
}

/// Short human-readable name of a device, e.g. `cpu` or `cuda:0`
pub fn describe_device(device: &Device) -> String {
    match device.location() {
        DeviceLocation::Cpu => "cpu".to_string(),
        DeviceLocation::Cuda { gpu_id } => format!("cuda:{}", gpu_id),
        DeviceLocation::Metal { gpu_id } => format!("metal:{}", gpu_id),
    }
}

/// Open a weight archive as a VarBuilder on `device`.
///
/// Unreadable or unparseable archives are resource errors; whether the
/// tensors fit an architecture is only known once it is built.
pub fn load_var_builder(
    weights_path: &Path,
    format: WeightFormat,
    device: &Device,
) -> Result<VarBuilder<'static>> {
    match format.resolve(weights_path) {
        WeightFormat::SafeTensors => {
            let vb = unsafe {
                VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)
            };
            vb.map_err(|e| {
                Error::resource(format!(
                    "Failed to load SafeTensors {}: {}",
                    weights_path.display(),
                    e
                ))
            })
        }
        _ => VarBuilder::from_pth(weights_path, DType::F32, device).map_err(|e| {
            Error::resource(format!(
                "Failed to load PyTorch weights {}: {}",
                weights_path.display(),
                e
            ))
        }),
    }
}
