//! Binary classification metrics for a held-out test set.

use tracing::{info, instrument};

use crate::error::RfError;
use crate::forest::RandomForest;

/// Outcome counts of binary predictions against true labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfusionCounts {
    /// Predicted 1, labelled 1.
    pub true_positive: usize,
    /// Predicted 1, labelled 0.
    pub false_positive: usize,
    /// Predicted 0, labelled 0.
    pub true_negative: usize,
    /// Predicted 0, labelled 1.
    pub false_negative: usize,
}

impl ConfusionCounts {
    /// Tally predictions against labels.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::EmptyDataset`] | zero labels |
    /// | [`RfError::LabelCountMismatch`] | slices differ in length |
    /// | [`RfError::InvalidLabel`] | a label or prediction is not 0 or 1 |
    pub fn from_labels(true_labels: &[usize], predicted: &[usize]) -> Result<Self, RfError> {
        if true_labels.is_empty() {
            return Err(RfError::EmptyDataset);
        }
        if true_labels.len() != predicted.len() {
            return Err(RfError::LabelCountMismatch {
                features: predicted.len(),
                labels: true_labels.len(),
            });
        }
        let mut counts = Self::default();
        for (sample_index, (&t, &p)) in true_labels.iter().zip(predicted).enumerate() {
            match (t, p) {
                (1, 1) => counts.true_positive += 1,
                (0, 1) => counts.false_positive += 1,
                (0, 0) => counts.true_negative += 1,
                (1, 0) => counts.false_negative += 1,
                _ => {
                    return Err(RfError::InvalidLabel {
                        sample_index,
                        label: t.max(p),
                    });
                }
            }
        }
        Ok(counts)
    }

    /// Total number of tallied samples.
    #[must_use]
    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }

    /// Correct predictions over all predictions.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positive + self.true_negative, self.total())
    }

    /// TP / (TP + FP); 0.0 when nothing was predicted positive.
    #[must_use]
    pub fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    /// TP / (TP + FN); 0.0 when no label is positive.
    #[must_use]
    pub fn recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    /// Harmonic mean of precision and recall; 0.0 when both are 0.
    #[must_use]
    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

/// Rank-based ROC AUC (Mann-Whitney U) of positive-class scores.
///
/// Tied scores share the average of the ranks they span.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`RfError::EmptyDataset`] | zero labels |
/// | [`RfError::LabelCountMismatch`] | slices differ in length |
/// | [`RfError::InvalidLabel`] | a label is not 0 or 1 |
/// | [`RfError::UndefinedRocAuc`] | labels contain a single class |
pub fn roc_auc(labels: &[usize], scores: &[f64]) -> Result<f64, RfError> {
    if labels.is_empty() {
        return Err(RfError::EmptyDataset);
    }
    if labels.len() != scores.len() {
        return Err(RfError::LabelCountMismatch {
            features: scores.len(),
            labels: labels.len(),
        });
    }
    if let Some((sample_index, &label)) = labels.iter().enumerate().find(|&(_, &l)| l > 1) {
        return Err(RfError::InvalidLabel {
            sample_index,
            label,
        });
    }
    let n_pos = labels.iter().filter(|&&l| l == 1).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(RfError::UndefinedRocAuc {
            class: usize::from(n_pos > 0),
        });
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut positive_rank_sum = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // Ranks start..end (0-based) share 1-based rank (start + 1 + end) / 2.
        let rank = (start + 1 + end) as f64 / 2.0;
        let positives = order[start..end].iter().filter(|&&i| labels[i] == 1).count();
        positive_rank_sum += rank * positives as f64;
        start = end;
    }

    let n_pos_f = n_pos as f64;
    let u = positive_rank_sum - n_pos_f * (n_pos_f + 1.0) / 2.0;
    Ok(u / (n_pos_f * n_neg as f64))
}

/// The five test-set scores persisted to `metrics.json`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MetricsReport {
    /// Fraction of correct predictions.
    pub accuracy: f64,
    /// Positive predictive value.
    pub precision: f64,
    /// Sensitivity.
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
    /// Area under the ROC curve of the positive-vote fraction.
    pub roc_auc: f64,
}

impl MetricsReport {
    /// Build a report from labels, hard predictions, and positive-class scores.
    ///
    /// # Errors
    ///
    /// See [`ConfusionCounts::from_labels`] and [`roc_auc`].
    pub fn from_predictions(
        labels: &[usize],
        predicted: &[usize],
        scores: &[f64],
    ) -> Result<Self, RfError> {
        let counts = ConfusionCounts::from_labels(labels, predicted)?;
        Ok(Self {
            accuracy: counts.accuracy(),
            precision: counts.precision(),
            recall: counts.recall(),
            f1: counts.f1(),
            roc_auc: roc_auc(labels, scores)?,
        })
    }
}

impl RandomForest {
    /// Score the forest on a held-out set.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::EmptyDataset`] | `features` is empty |
    /// | [`RfError::LabelCountMismatch`] | `labels.len() != features.len()` |
    /// | [`RfError::PredictionFeatureMismatch`] | a row has the wrong width |
    /// | [`RfError::InvalidLabel`] | a label is not 0 or 1 |
    /// | [`RfError::UndefinedRocAuc`] | labels contain a single class |
    #[instrument(skip_all, fields(n_samples = features.len()))]
    pub fn evaluate(&self, features: &[Vec<f64>], labels: &[usize]) -> Result<MetricsReport, RfError> {
        if features.is_empty() {
            return Err(RfError::EmptyDataset);
        }
        if labels.len() != features.len() {
            return Err(RfError::LabelCountMismatch {
                features: features.len(),
                labels: labels.len(),
            });
        }
        let predicted = self.predict_batch(features)?;
        let scores = self.predict_proba_batch(features)?;
        let report = MetricsReport::from_predictions(labels, &predicted, &scores)?;

        info!(
            accuracy = report.accuracy,
            precision = report.precision,
            recall = report.recall,
            f1 = report.f1,
            roc_auc = report.roc_auc,
            "evaluation complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_rates() {
        let truth = [1, 1, 1, 0, 0, 0, 0, 1];
        let pred = [1, 1, 0, 0, 0, 1, 0, 1];
        let c = ConfusionCounts::from_labels(&truth, &pred).unwrap();
        assert_eq!(c.true_positive, 3);
        assert_eq!(c.false_negative, 1);
        assert_eq!(c.false_positive, 1);
        assert_eq!(c.true_negative, 3);
        assert!((c.accuracy() - 0.75).abs() < 1e-12);
        assert!((c.precision() - 0.75).abs() < 1e-12);
        assert!((c.recall() - 0.75).abs() < 1e-12);
        assert!((c.f1() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn no_positive_predictions_gives_zero_precision() {
        let c = ConfusionCounts::from_labels(&[1, 0, 1], &[0, 0, 0]).unwrap();
        assert_eq!(c.precision(), 0.0);
        assert_eq!(c.recall(), 0.0);
        assert_eq!(c.f1(), 0.0);
        assert!((c.accuracy() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn non_binary_prediction_rejected() {
        assert!(matches!(
            ConfusionCounts::from_labels(&[0, 1], &[0, 3]),
            Err(RfError::InvalidLabel {
                sample_index: 1,
                label: 3
            })
        ));
    }

    #[test]
    fn perfect_and_inverted_ranking() {
        let labels = [0, 0, 1, 1];
        assert_eq!(roc_auc(&labels, &[0.1, 0.2, 0.8, 0.9]).unwrap(), 1.0);
        assert_eq!(roc_auc(&labels, &[0.9, 0.8, 0.2, 0.1]).unwrap(), 0.0);
    }

    #[test]
    fn all_tied_scores_give_half() {
        let labels = [0, 1, 0, 1, 1];
        assert!((roc_auc(&labels, &[0.5; 5]).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn partial_ties_use_average_ranks() {
        // Pairs (pos, neg): (0.4 vs 0.1) win, (0.4 vs 0.4) half,
        // (0.9 vs 0.1) win, (0.9 vs 0.4) win → 3.5 / 4.
        let labels = [0, 1, 0, 1];
        let scores = [0.1, 0.4, 0.4, 0.9];
        assert!((roc_auc(&labels, &scores).unwrap() - 0.875).abs() < 1e-12);
    }

    #[test]
    fn single_class_auc_is_undefined() {
        assert!(matches!(
            roc_auc(&[1, 1, 1], &[0.2, 0.5, 0.9]),
            Err(RfError::UndefinedRocAuc { class: 1 })
        ));
        assert!(matches!(
            roc_auc(&[0, 0], &[0.2, 0.5]),
            Err(RfError::UndefinedRocAuc { class: 0 })
        ));
    }

    #[test]
    fn report_serializes_exactly_five_keys() {
        let report = MetricsReport::from_predictions(&[0, 1, 1, 0], &[0, 1, 0, 0], &[0.1, 0.9, 0.4, 0.3])
            .unwrap();
        let json = serde_json::to_value(report).unwrap();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 5);
        for key in ["accuracy", "precision", "recall", "f1", "roc_auc"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(report.precision, 1.0);
        assert_eq!(report.recall, 0.5);
        assert_eq!(report.roc_auc, 1.0);
    }
}
