//! Phytoscan Classifier
//!
//! ResNet-based plant disease classification on top of Candle.
//!
//! A [`Predictor`] is loaded once from a [`PredictorConfig`] and then maps
//! leaf images to a disease label, a confidence score and a ranked top-3:
//! - Labels: one class name per line, line order = output index
//! - Weights: PyTorch state dict or SafeTensors with torchvision naming
//! - Input: any image, resized to 224x224 and ImageNet-normalized
//! - Output: [`PredictionResult`], with `"Unknown"` below the threshold
//!
//! ```no_run
//! use phytoscan_classifier::{Predictor, PredictorConfig};
//!
//! let config = PredictorConfig::from_local(
//!     "ml_model/class_labels.txt",
//!     "ml_model/plant_disease_resnet50.pth",
//! );
//! let predictor = Predictor::load(config)?;
//! let bytes = std::fs::read("leaf.jpg")?;
//! let result = predictor.predict_from_bytes(&bytes, None)?;
//! println!("{} ({:.2})", result.predicted_class, result.confidence);
//! # Ok::<(), phytoscan_core::Error>(())
//! ```

pub mod config;
pub mod labels;
pub mod model_loader;
pub mod predictor;
pub mod preprocess;
pub mod ranking;
pub mod report;
pub mod telemetry;

pub use config::{InferenceConfig, PredictorConfig};
pub use labels::ClassLabels;
pub use model_loader::{Architecture, DeviceSpec, ResourceSource, WeightFormat};
pub use phytoscan_core::{ClassScore, Error, PredictionResult, Result};
pub use predictor::{Predictor, PredictorStatus};
pub use preprocess::ImageTransform;
pub use report::Diagnosis;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::PredictorConfig;
    pub use crate::labels::ClassLabels;
    pub use crate::model_loader::{Architecture, DeviceSpec, ResourceSource};
    pub use crate::predictor::Predictor;
    pub use crate::report::Diagnosis;
    pub use phytoscan_core::{ClassScore, PredictionResult};
}
