//! Top-k selection over a probability distribution

use crate::labels::ClassLabels;
use phytoscan_core::ClassScore;

/// Indices and probabilities of the `k` most likely classes.
///
/// Ordered by descending probability; equal probabilities keep ascending
/// class index, so the first entry is always the argmax with the lowest
/// index.
pub fn top_k(probabilities: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut order: Vec<usize> = (0..probabilities.len()).collect();
    order.sort_by(|&a, &b| probabilities[b].total_cmp(&probabilities[a]));

    order
        .into_iter()
        .take(k)
        .map(|idx| (idx, probabilities[idx]))
        .collect()
}

/// Label the top `k` classes
pub fn rank(probabilities: &[f32], labels: &ClassLabels, k: usize) -> Vec<ClassScore> {
    top_k(probabilities, k)
        .into_iter()
        .map(|(idx, p)| {
            let label = labels
                .get(idx)
                .map(str::to_string)
                .unwrap_or_else(|| format!("class_{}", idx));
            ClassScore::new(label, p)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use phytoscan_core::{PredictionResult, UNKNOWN_LABEL};
    use proptest::prelude::*;

    #[test]
    fn test_top_k_basic() {
        let probs = [0.05, 0.6, 0.1, 0.25];
        assert_eq!(top_k(&probs, 3), vec![(1, 0.6), (3, 0.25), (2, 0.1)]);
    }

    #[test]
    fn test_ties_prefer_lower_index() {
        let probs = [0.2, 0.3, 0.2, 0.3];
        let ranked = top_k(&probs, 4);
        let indices: Vec<usize> = ranked.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_k_larger_than_classes() {
        assert_eq!(top_k(&[0.4, 0.6], 3).len(), 2);
        assert!(top_k(&[], 3).is_empty());
    }

    #[test]
    fn test_rank_uses_labels() {
        let labels =
            ClassLabels::parse("Peach___Bacterial_spot\nPeach___healthy\nSquash___Powdery_mildew")
                .unwrap();
        let ranked = rank(&[0.1, 0.2, 0.7], &labels, 3);

        assert_eq!(ranked[0].label, "Squash___Powdery_mildew");
        assert_eq!(ranked[2].label, "Peach___Bacterial_spot");
    }

    fn distribution() -> impl Strategy<Value = Vec<f32>> {
        prop::collection::vec(0.0f32..1.0, 3..64).prop_map(|raw| {
            let total: f32 = raw.iter().sum::<f32>().max(f32::MIN_POSITIVE);
            raw.into_iter().map(|v| v / total).collect()
        })
    }

    proptest! {
        #[test]
        fn prop_top_k_sorted_and_led_by_argmax(probs in distribution()) {
            let ranked = top_k(&probs, 3);
            prop_assert_eq!(ranked.len(), 3);

            for pair in ranked.windows(2) {
                prop_assert!(pair[0].1 >= pair[1].1);
            }

            let max = probs.iter().cloned().fold(f32::MIN, f32::max);
            let first_argmax = probs.iter().position(|&p| p == max).unwrap();
            prop_assert_eq!(ranked[0], (first_argmax, max));
        }

        #[test]
        fn prop_threshold_policy(probs in distribution(), threshold in 0.0f32..=1.0) {
            let labels = ClassLabels::new(
                (0..probs.len()).map(|i| format!("label_{}", i)).collect()
            ).unwrap();
            let result = PredictionResult::from_ranked(rank(&probs, &labels, 3), threshold);

            prop_assert_eq!(result.threshold_met, result.confidence >= threshold);
            prop_assert_eq!(result.confidence, result.all_predictions[0].confidence);
            if result.threshold_met {
                prop_assert_eq!(&result.predicted_class, &result.all_predictions[0].label);
            } else {
                prop_assert_eq!(result.predicted_class.as_str(), UNKNOWN_LABEL);
            }
        }

        #[test]
        fn prop_zero_threshold_always_met(probs in distribution()) {
            let labels = ClassLabels::new(
                (0..probs.len()).map(|i| format!("label_{}", i)).collect()
            ).unwrap();
            let result = PredictionResult::from_ranked(rank(&probs, &labels, 3), 0.0);
            prop_assert!(result.threshold_met);
        }
    }
}
