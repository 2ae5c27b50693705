//! Held-out evaluation metrics for trained classifiers.

use serde::{Deserialize, Serialize};

/// Metrics computed on the held-out test split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub auc: f64,
}

/// Evaluate hard predictions and raw scores against 0/1 labels.
///
/// Precision, recall, and F1 degrade to 0.0 when their denominator class is
/// absent; they never error.
pub fn evaluate(labels: &[u8], predictions: &[u8], scores: &[f64]) -> EvaluationMetrics {
    let n = labels.len();
    let mut tp = 0u64;
    let mut fp = 0u64;
    let mut tn = 0u64;
    let mut fn_ = 0u64;

    for (&label, &pred) in labels.iter().zip(predictions.iter()) {
        match (label, pred) {
            (1, 1) => tp += 1,
            (0, 1) => fp += 1,
            (0, 0) => tn += 1,
            _ => fn_ += 1,
        }
    }

    let accuracy = if n == 0 {
        0.0
    } else {
        (tp + tn) as f64 / n as f64
    };
    let precision = if tp + fp == 0 {
        0.0
    } else {
        tp as f64 / (tp + fp) as f64
    };
    let recall = if tp + fn_ == 0 {
        0.0
    } else {
        tp as f64 / (tp + fn_) as f64
    };
    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };

    EvaluationMetrics {
        accuracy,
        precision,
        recall,
        f1,
        auc: roc_auc(labels, scores),
    }
}

/// Area under the ROC curve via the Mann-Whitney rank statistic: the
/// fraction of (positive, negative) pairs where the positive outranks the
/// negative, ties counting half. Returns 0.5 (chance) when either class is
/// absent.
pub fn roc_auc(labels: &[u8], scores: &[f64]) -> f64 {
    let positives: Vec<f64> = labels
        .iter()
        .zip(scores.iter())
        .filter(|(&l, _)| l == 1)
        .map(|(_, &s)| s)
        .collect();
    let negatives: Vec<f64> = labels
        .iter()
        .zip(scores.iter())
        .filter(|(&l, _)| l == 0)
        .map(|(_, &s)| s)
        .collect();

    if positives.is_empty() || negatives.is_empty() {
        return 0.5;
    }

    let mut ranked = 0.0;
    for &p in &positives {
        for &n in &negatives {
            if p > n {
                ranked += 1.0;
            } else if p == n {
                ranked += 0.5;
            }
        }
    }
    ranked / (positives.len() * negatives.len()) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_classifier() {
        let labels = [0, 0, 1, 1];
        let predictions = [0, 0, 1, 1];
        let scores = [0.1, 0.2, 0.8, 0.9];
        let m = evaluate(&labels, &predictions, &scores);
        assert_eq!(m.accuracy, 1.0);
        assert_eq!(m.precision, 1.0);
        assert_eq!(m.recall, 1.0);
        assert_eq!(m.f1, 1.0);
        assert_eq!(m.auc, 1.0);
    }

    #[test]
    fn test_no_positive_predictions_degrades_to_zero() {
        let labels = [0, 1, 1, 0];
        let predictions = [0, 0, 0, 0];
        let scores = [0.1, 0.2, 0.3, 0.4];
        let m = evaluate(&labels, &predictions, &scores);
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
        assert_eq!(m.f1, 0.0);
        assert_eq!(m.accuracy, 0.5);
    }

    #[test]
    fn test_auc_reversed_ranking() {
        let labels = [1, 1, 0, 0];
        let scores = [0.1, 0.2, 0.8, 0.9];
        assert_eq!(roc_auc(&labels, &scores), 0.0);
    }

    #[test]
    fn test_auc_single_class_is_chance() {
        assert_eq!(roc_auc(&[1, 1, 1], &[0.2, 0.5, 0.9]), 0.5);
        assert_eq!(roc_auc(&[0, 0], &[0.2, 0.5]), 0.5);
    }

    #[test]
    fn test_auc_ties_count_half() {
        let labels = [1, 0];
        let scores = [0.5, 0.5];
        assert_eq!(roc_auc(&labels, &scores), 0.5);
    }
}
