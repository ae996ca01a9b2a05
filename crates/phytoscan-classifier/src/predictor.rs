//! Plant disease predictor
//!
//! A [`Predictor`] owns the label table, the loaded network and the device it
//! runs on. Nothing is mutated after [`Predictor::load`] returns, so one
//! instance can serve any number of threads through a shared reference.

use crate::config::{validate_threshold, PredictorConfig};
use crate::labels::ClassLabels;
use crate::model_loader::{describe_device, load_var_builder, Architecture};
use crate::preprocess::{decode_image, ImageTransform};
use crate::ranking::rank;
use crate::telemetry;
use candle_core::{Device, Tensor, D};
use candle_nn::{Func, Module, VarBuilder};
use image::DynamicImage;
use phytoscan_core::{Error, PredictionResult, Result, DEFAULT_CONFIDENCE_THRESHOLD, TOP_K};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

/// Loaded classifier ready to serve predictions
pub struct Predictor {
    name: String,
    labels: ClassLabels,
    model: Func<'static>,
    architecture: Architecture,
    device: Device,
    transform: ImageTransform,
    default_threshold: f32,
    labels_path: Option<PathBuf>,
    weights_path: Option<PathBuf>,
}

/// Snapshot of a predictor's setup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictorStatus {
    pub ready: bool,
    pub name: String,
    pub architecture: Architecture,
    pub device: String,
    pub num_classes: usize,
    pub default_threshold: f32,
    pub labels_path: Option<PathBuf>,
    pub weights_path: Option<PathBuf>,
}

impl Predictor {
    /// Load labels and weights and build the network.
    ///
    /// Fails with `Error::Resource` when a file cannot be found or read and
    /// with `Error::ModelLoad` when the weights do not fit the architecture.
    pub fn load(config: PredictorConfig) -> Result<Self> {
        config.validate()?;

        let labels_path = config.labels.resolve()?;
        let labels = ClassLabels::from_file(&labels_path)?;

        let device = config.device.create()?;
        tracing::info!(
            "Using device {} for model '{}'",
            describe_device(&device),
            config.name
        );

        let weights_path = config.weights.resolve()?;
        let vb = load_var_builder(&weights_path, config.format, &device)?;

        let mut predictor = Self::from_var_builder(labels, config.architecture, vb)?
            .with_name(config.name)
            .with_default_threshold(config.inference.threshold)?;

        tracing::info!(
            "Loaded {} with {} classes from {}",
            predictor.architecture,
            predictor.labels.len(),
            weights_path.display()
        );

        predictor.labels_path = Some(labels_path);
        predictor.weights_path = Some(weights_path);
        Ok(predictor)
    }

    /// Build a predictor over an already-open VarBuilder.
    ///
    /// The network runs on the VarBuilder's device. At least [`TOP_K`]
    /// labels are required so every prediction can report a full ranking.
    pub fn from_var_builder(
        labels: ClassLabels,
        architecture: Architecture,
        vb: VarBuilder<'static>,
    ) -> Result<Self> {
        if labels.len() < TOP_K {
            return Err(Error::model_load(format!(
                "at least {} class labels are required, got {}",
                TOP_K,
                labels.len()
            )));
        }

        let device = vb.device().clone();
        let model = architecture.build(labels.len(), vb)?;

        Ok(Self {
            name: architecture.to_string(),
            labels,
            model,
            architecture,
            device,
            transform: ImageTransform::imagenet(),
            default_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            labels_path: None,
            weights_path: None,
        })
    }

    /// Set the model name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the threshold used when a call passes `None`
    pub fn with_default_threshold(mut self, threshold: f32) -> Result<Self> {
        self.default_threshold = validate_threshold(threshold)?;
        Ok(self)
    }

    /// Classify a decoded image.
    ///
    /// `confidence_threshold` of `None` uses the configured default (0.60
    /// unless overridden). The image may have any dimensions; it is
    /// converted to RGB and resized by the fixed transform.
    pub fn predict(
        &self,
        image: &DynamicImage,
        confidence_threshold: Option<f32>,
    ) -> Result<PredictionResult> {
        let threshold = match confidence_threshold {
            Some(t) => validate_threshold(t)?,
            None => self.default_threshold,
        };

        let start = Instant::now();

        let input = self.transform.apply(image, &self.device)?;
        let probabilities = self.probabilities(&input)?;
        let ranked = rank(&probabilities, &self.labels, TOP_K);
        let result = PredictionResult::from_ranked(ranked, threshold);

        let latency = start.elapsed();
        telemetry::record_prediction(&result, latency);
        tracing::debug!(
            model = %self.name,
            predicted_class = %result.predicted_class,
            confidence = result.confidence,
            threshold_met = result.threshold_met,
            latency_us = latency.as_micros() as u64,
            "prediction complete"
        );

        Ok(result)
    }

    /// Decode encoded image bytes (PNG, JPEG, ...) and classify them.
    ///
    /// Alpha and palette data are discarded before prediction. Bytes that
    /// are not a decodable image fail with `Error::Decode`.
    pub fn predict_from_bytes(
        &self,
        image_bytes: &[u8],
        confidence_threshold: Option<f32>,
    ) -> Result<PredictionResult> {
        let image = decode_image(image_bytes).map_err(|e| {
            telemetry::record_decode_error();
            e
        })?;
        self.predict(&image, confidence_threshold)
    }

    /// Softmax over the logits for one `(3, H, W)` input
    fn probabilities(&self, input: &Tensor) -> Result<Vec<f32>> {
        let batch = input
            .unsqueeze(0)
            .map_err(|e| Error::inference(format!("Failed to unsqueeze: {}", e)))?;

        let logits = self
            .model
            .forward(&batch)
            .map_err(|e| Error::inference(format!("Model forward pass failed: {}", e)))?;

        let probabilities: Vec<f32> = candle_nn::ops::softmax(&logits, D::Minus1)
            .and_then(|p| p.squeeze(0))
            .and_then(|p| p.to_vec1())
            .map_err(|e| Error::inference(format!("Softmax failed: {}", e)))?;

        if probabilities.len() != self.labels.len() {
            return Err(Error::inference(format!(
                "model produced {} scores for {} labels",
                probabilities.len(),
                self.labels.len()
            )));
        }

        Ok(probabilities)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn labels(&self) -> &ClassLabels {
        &self.labels
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn architecture(&self) -> Architecture {
        self.architecture
    }

    pub fn default_threshold(&self) -> f32 {
        self.default_threshold
    }

    /// Report how this predictor was set up
    pub fn status(&self) -> PredictorStatus {
        PredictorStatus {
            ready: true,
            name: self.name.clone(),
            architecture: self.architecture,
            device: describe_device(&self.device),
            num_classes: self.labels.len(),
            default_threshold: self.default_threshold,
            labels_path: self.labels_path.clone(),
            weights_path: self.weights_path.clone(),
        }
    }
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("name", &self.name)
            .field("architecture", &self.architecture)
            .field("device", &describe_device(&self.device))
            .field("num_classes", &self.labels.len())
            .field("default_threshold", &self.default_threshold)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::DType;
    use candle_nn::VarMap;

    fn labels(n: usize) -> ClassLabels {
        ClassLabels::new((0..n).map(|i| format!("Plant___disease_{}", i)).collect()).unwrap()
    }

    fn random_predictor(n: usize) -> Predictor {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        Predictor::from_var_builder(labels(n), Architecture::ResNet18, vb).unwrap()
    }

    #[test]
    fn test_requires_top_k_labels() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let err = Predictor::from_var_builder(labels(2), Architecture::ResNet18, vb).unwrap_err();
        assert!(matches!(err, Error::ModelLoad(_)));
    }

    #[test]
    fn test_predictor_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Predictor>();
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let predictor = random_predictor(4);
        let image = DynamicImage::new_rgb8(16, 16);

        assert!(matches!(
            predictor.predict(&image, Some(1.2)).unwrap_err(),
            Error::Config(_)
        ));
        assert!(predictor.with_default_threshold(-0.5).is_err());
    }

    #[test]
    fn test_status_without_files() {
        let predictor = random_predictor(5).with_name("unit-test");
        let status = predictor.status();

        assert!(status.ready);
        assert_eq!(status.name, "unit-test");
        assert_eq!(status.num_classes, 5);
        assert_eq!(status.device, "cpu");
        assert_eq!(status.default_threshold, 0.60);
        assert!(status.weights_path.is_none());
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let predictor = random_predictor(6);
        let image = DynamicImage::new_rgb8(40, 30);
        let input = predictor.transform.apply(&image, predictor.device()).unwrap();
        let probs = predictor.probabilities(&input).unwrap();

        assert_eq!(probs.len(), 6);
        let total: f32 = probs.iter().sum();
        assert!((total - 1.0).abs() < 1e-4, "sum was {}", total);
    }
}
