//! Multiclass evaluation metrics.

use anyhow::Result;

use crate::error::PipelineError;
use crate::ml::label_map::LabelMap;
use crate::types::ImagePrediction;

/// Probabilities are clamped here before taking the log.
pub const LOG_LOSS_EPSILON: f64 = 1e-15;

#[derive(Debug, Clone, PartialEq)]
pub struct MulticlassMetrics {
    /// Mean of `-ln(p_true)` over evaluated rows
    pub log_loss: f64,
    /// Improvement of `log_loss` over predicting the label prior
    pub log_loss_reduction: f64,
    /// Fraction of rows predicted correctly
    pub micro_accuracy: f64,
    /// Mean per-class recall, over classes that occur
    pub macro_accuracy: f64,
    /// Mean log-loss of rows of each class, by key
    pub per_class_log_loss: Vec<f64>,
    /// `[true key][predicted key]` counts
    pub confusion_matrix: Vec<Vec<usize>>,
    /// Rows that contributed
    pub num_rows: usize,
}

impl MulticlassMetrics {
    /// Per-class log-loss joined the way the console report prints it.
    pub fn per_class_log_loss_line(&self) -> String {
        self.per_class_log_loss
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" , ")
    }
}

/// Index of the highest score (first one on ties).
pub fn argmax(score: &[f32]) -> Option<usize> {
    score
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, &s)| match best {
            Some((_, b)) if b >= s => best,
            _ => Some((i, s)),
        })
        .map(|(i, _)| i)
}

/// Evaluate predictions against the true labels of their rows.
///
/// Rows without a label, or with a label the model never saw, are skipped.
pub fn evaluate(predictions: &[ImagePrediction], labels: &LabelMap) -> Result<MulticlassMetrics> {
    let num_classes = labels.len();
    let mut confusion_matrix = vec![vec![0usize; num_classes]; num_classes];
    let mut class_loss = vec![0.0f64; num_classes];
    let mut class_count = vec![0usize; num_classes];
    let mut total_loss = 0.0f64;
    let mut correct = 0usize;
    let mut num_rows = 0usize;

    for prediction in predictions {
        let Some(label) = prediction.image.label.as_deref() else {
            log::warn!("Skipping {}: no label", prediction.image.file_name());
            continue;
        };
        let Some(true_key) = labels.key_of(label) else {
            log::warn!(
                "Skipping {}: {}",
                prediction.image.file_name(),
                PipelineError::UnknownLabel(label.to_string())
            );
            continue;
        };

        let p_true = prediction.score.get(true_key).copied().unwrap_or(0.0) as f64;
        let loss = -p_true.max(LOG_LOSS_EPSILON).ln();

        total_loss += loss;
        class_loss[true_key] += loss;
        class_count[true_key] += 1;
        num_rows += 1;

        if let Some(predicted_key) = argmax(&prediction.score).filter(|&k| k < num_classes) {
            confusion_matrix[true_key][predicted_key] += 1;
            if predicted_key == true_key {
                correct += 1;
            }
        }
    }

    if num_rows == 0 {
        return Err(PipelineError::NothingToEvaluate.into());
    }

    let n = num_rows as f64;
    let log_loss = total_loss / n;

    let per_class_log_loss = class_loss
        .iter()
        .zip(&class_count)
        .map(|(&loss, &count)| if count == 0 { 0.0 } else { loss / count as f64 })
        .collect();

    let prior_log_loss: f64 = class_count
        .iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / n;
            -p * p.ln()
        })
        .sum();
    let log_loss_reduction = if prior_log_loss > 0.0 {
        (prior_log_loss - log_loss) / prior_log_loss
    } else {
        0.0
    };

    let recalls: Vec<f64> = (0..num_classes)
        .filter(|&k| class_count[k] > 0)
        .map(|k| confusion_matrix[k][k] as f64 / class_count[k] as f64)
        .collect();
    let macro_accuracy = recalls.iter().sum::<f64>() / recalls.len() as f64;

    Ok(MulticlassMetrics {
        log_loss,
        log_loss_reduction,
        micro_accuracy: correct as f64 / n,
        macro_accuracy,
        per_class_log_loss,
        confusion_matrix,
        num_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImageData;

    fn prediction(label: Option<&str>, score: Vec<f32>) -> ImagePrediction {
        ImagePrediction {
            image: ImageData {
                image_path: "img.jpg".into(),
                label: label.map(str::to_string),
            },
            predicted_label: String::new(),
            score,
        }
    }

    fn labels() -> LabelMap {
        LabelMap::from_labels(["food", "toaster"])
    }

    #[test]
    fn test_perfect_predictions() {
        let predictions = vec![
            prediction(Some("food"), vec![1.0, 0.0]),
            prediction(Some("toaster"), vec![0.0, 1.0]),
        ];
        let metrics = evaluate(&predictions, &labels()).unwrap();

        assert!(metrics.log_loss.abs() < 1e-12);
        assert_eq!(metrics.micro_accuracy, 1.0);
        assert_eq!(metrics.macro_accuracy, 1.0);
        assert!((metrics.log_loss_reduction - 1.0).abs() < 1e-12);
        assert_eq!(metrics.confusion_matrix, vec![vec![1, 0], vec![0, 1]]);
    }

    #[test]
    fn test_known_probabilities() {
        let predictions = vec![
            prediction(Some("food"), vec![0.5, 0.5]),
            prediction(Some("food"), vec![0.25, 0.75]),
            prediction(Some("toaster"), vec![0.2, 0.8]),
        ];
        let metrics = evaluate(&predictions, &labels()).unwrap();

        let food = -(0.5f64.ln() + 0.25f64.ln()) / 2.0;
        let toaster = -(0.8f32 as f64).ln();
        assert!((metrics.per_class_log_loss[0] - food).abs() < 1e-6);
        assert!((metrics.per_class_log_loss[1] - toaster).abs() < 1e-6);
        assert!((metrics.log_loss - (2.0 * food + toaster) / 3.0).abs() < 1e-6);

        // The first row ties, which resolves to key 0.
        assert_eq!(metrics.confusion_matrix, vec![vec![1, 1], vec![0, 1]]);
        assert!((metrics.micro_accuracy - 2.0 / 3.0).abs() < 1e-12);
        assert!((metrics.macro_accuracy - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_zero_probability_is_clamped() {
        let predictions = vec![prediction(Some("food"), vec![0.0, 1.0])];
        let metrics = evaluate(&predictions, &labels()).unwrap();
        assert!((metrics.log_loss - -LOG_LOSS_EPSILON.ln()).abs() < 1e-9);
        assert_eq!(metrics.log_loss_reduction, 0.0);
    }

    #[test]
    fn test_unknown_and_missing_labels_are_skipped() {
        let predictions = vec![
            prediction(Some("food"), vec![0.9, 0.1]),
            prediction(Some("canoe"), vec![0.5, 0.5]),
            prediction(None, vec![0.5, 0.5]),
        ];
        let metrics = evaluate(&predictions, &labels()).unwrap();
        assert_eq!(metrics.num_rows, 1);
        assert_eq!(metrics.per_class_log_loss[1], 0.0);
    }

    #[test]
    fn test_nothing_to_evaluate() {
        let predictions = vec![prediction(Some("canoe"), vec![0.5, 0.5])];
        let err = evaluate(&predictions, &labels()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::NothingToEvaluate)
        ));
    }

    #[test]
    fn test_per_class_line() {
        let metrics = MulticlassMetrics {
            log_loss: 0.0,
            log_loss_reduction: 0.0,
            micro_accuracy: 0.0,
            macro_accuracy: 0.0,
            per_class_log_loss: vec![0.5, 1.25, 0.0],
            confusion_matrix: vec![],
            num_rows: 0,
        };
        assert_eq!(metrics.per_class_log_loss_line(), "0.5 , 1.25 , 0");
    }

    #[test]
    fn test_argmax() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), Some(1));
        assert_eq!(argmax(&[0.5, 0.5]), Some(0));
        assert_eq!(argmax(&[]), None);
    }
}
