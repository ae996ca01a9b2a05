//! Core types for Phytoscan

use serde::{Deserialize, Serialize};

/// Label reported when the top prediction falls below the confidence threshold
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Threshold used when the caller does not supply one
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.60;

/// Number of ranked classes reported with every prediction
pub const TOP_K: usize = 3;

/// A single class and its softmax probability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassScore {
    /// Class label as listed in the label file
    #[serde(rename = "class")]
    pub label: String,

    /// Probability (0.0-1.0)
    pub confidence: f32,
}

impl ClassScore {
    /// Create a new class score
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// Result of classifying one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Top-1 label, or [`UNKNOWN_LABEL`] when the threshold was not met
    pub predicted_class: String,

    /// Probability of the top-1 class, reported even when the label is replaced
    pub confidence: f32,

    /// Highest-probability classes, descending
    pub all_predictions: Vec<ClassScore>,

    /// Whether `confidence >= threshold`
    pub threshold_met: bool,
}

impl PredictionResult {
    /// Build a result from ranked scores, applying the threshold policy.
    ///
    /// `ranked` must be sorted by descending confidence; its first entry is
    /// the primary prediction. An empty ranking yields an `Unknown` result
    /// with zero confidence.
    pub fn from_ranked(ranked: Vec<ClassScore>, threshold: f32) -> Self {
        let (top_label, confidence) = ranked
            .first()
            .map(|score| (score.label.clone(), score.confidence))
            .unwrap_or_else(|| (UNKNOWN_LABEL.to_string(), 0.0));

        let threshold_met = confidence >= threshold;
        let predicted_class = if threshold_met {
            top_label
        } else {
            UNKNOWN_LABEL.to_string()
        };

        Self {
            predicted_class,
            confidence,
            all_predictions: ranked,
            threshold_met,
        }
    }

    /// True when the label was replaced by the sentinel
    pub fn is_unknown(&self) -> bool {
        !self.threshold_met
    }
}
