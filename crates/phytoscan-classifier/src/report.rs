//! Human-readable diagnosis built from a prediction
//!
//! Class labels follow the PlantVillage convention `Plant___Disease_Name`,
//! e.g. `Tomato___Late_blight` or `Pepper,_bell___healthy`.

use phytoscan_core::{ClassScore, PredictionResult, UNKNOWN_LABEL};
use serde::Serialize;

const PLANT_DISEASE_SEPARATOR: &str = "___";

/// Plant/disease breakdown of a prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    pub plant: String,
    pub disease: String,
    /// Percentage with two decimals, e.g. `"93.41%"`
    pub confidence: String,
    pub confidence_score: f32,
    pub is_healthy: bool,
    pub is_confident: bool,
    pub top_predictions: Vec<CandidateDiagnosis>,
}

/// One ranked alternative
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDiagnosis {
    pub plant: String,
    pub disease: String,
    pub confidence: String,
    pub confidence_score: f32,
}

impl Diagnosis {
    pub fn from_prediction(prediction: &PredictionResult) -> Self {
        let (plant, disease) = split_label(&prediction.predicted_class);
        let is_healthy = disease.eq_ignore_ascii_case("healthy");

        Self {
            plant,
            disease,
            confidence: format_percentage(prediction.confidence),
            confidence_score: prediction.confidence,
            is_healthy,
            is_confident: prediction.threshold_met,
            top_predictions: prediction
                .all_predictions
                .iter()
                .map(CandidateDiagnosis::from_score)
                .collect(),
        }
    }
}

impl CandidateDiagnosis {
    fn from_score(score: &ClassScore) -> Self {
        let (plant, disease) = split_label(&score.label);
        Self {
            plant,
            disease,
            confidence: format_percentage(score.confidence),
            confidence_score: score.confidence,
        }
    }
}

/// Split `Plant___Disease` into display names.
///
/// Underscores become spaces; a missing part is reported as `Unknown`.
pub fn split_label(label: &str) -> (String, String) {
    let mut parts = label.split(PLANT_DISEASE_SEPARATOR);
    let plant = display_name(parts.next());
    let disease = display_name(parts.next());
    (plant, disease)
}

fn display_name(part: Option<&str>) -> String {
    match part {
        Some(p) if !p.is_empty() => p.replace('_', " "),
        _ => UNKNOWN_LABEL.to_string(),
    }
}

/// Format a probability as a percentage with two decimals
pub fn format_percentage(score: f32) -> String {
    format!("{:.2}%", score * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(label: &str, confidence: f32, threshold_met: bool) -> PredictionResult {
        PredictionResult {
            predicted_class: label.to_string(),
            confidence,
            all_predictions: vec![
                ClassScore::new("Tomato___Late_blight", confidence),
                ClassScore::new("Tomato___Early_blight", 0.1),
                ClassScore::new("Tomato___healthy", 0.05),
            ],
            threshold_met,
        }
    }

    #[test]
    fn test_split_label() {
        assert_eq!(
            split_label("Corn_(maize)___Northern_Leaf_Blight"),
            ("Corn (maize)".to_string(), "Northern Leaf Blight".to_string())
        );
        assert_eq!(
            split_label("Pepper,_bell___healthy"),
            ("Pepper, bell".to_string(), "healthy".to_string())
        );
        assert_eq!(
            split_label("Unknown"),
            ("Unknown".to_string(), "Unknown".to_string())
        );
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(0.93412), "93.41%");
        assert_eq!(format_percentage(1.0), "100.00%");
        assert_eq!(format_percentage(0.0), "0.00%");
    }

    #[test]
    fn test_confident_diagnosis() {
        let diagnosis = Diagnosis::from_prediction(&prediction("Tomato___Late_blight", 0.85, true));

        assert_eq!(diagnosis.plant, "Tomato");
        assert_eq!(diagnosis.disease, "Late blight");
        assert_eq!(diagnosis.confidence, "85.00%");
        assert!(diagnosis.is_confident);
        assert!(!diagnosis.is_healthy);
        assert_eq!(diagnosis.top_predictions.len(), 3);
        assert_eq!(diagnosis.top_predictions[2].disease, "healthy");
    }

    #[test]
    fn test_healthy_detection() {
        let diagnosis = Diagnosis::from_prediction(&prediction("Apple___healthy", 0.99, true));
        assert!(diagnosis.is_healthy);
    }

    #[test]
    fn test_unknown_diagnosis() {
        let diagnosis = Diagnosis::from_prediction(&prediction(UNKNOWN_LABEL, 0.41, false));

        assert_eq!(diagnosis.plant, "Unknown");
        assert_eq!(diagnosis.disease, "Unknown");
        assert!(!diagnosis.is_confident);
        assert_eq!(diagnosis.confidence_score, 0.41);
    }

    #[test]
    fn test_camel_case_json() {
        let diagnosis = Diagnosis::from_prediction(&prediction("Apple___healthy", 0.9, true));
        let value = serde_json::to_value(&diagnosis).unwrap();

        assert_eq!(value["isHealthy"], serde_json::json!(true));
        assert!(value.get("confidenceScore").is_some());
        assert!(value["topPredictions"][0].get("plant").is_some());
    }
}
