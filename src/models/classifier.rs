//! Logistic classifier trained by batch gradient descent.
//!
//! Deterministic for a given dataset: fixed iteration count, no stochastic
//! minibatching, so retraining on identical data reproduces identical
//! weights.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Gradient-descent hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainParams {
    pub learning_rate: f64,
    pub epochs: usize,
    /// L2 penalty applied to the weights (not the bias).
    pub l2: f64,
}

impl Default for TrainParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            epochs: 400,
            l2: 1e-4,
        }
    }
}

/// Binary logistic-regression classifier over scaled features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticClassifier {
    weights: Vec<f64>,
    bias: f64,
}

impl LogisticClassifier {
    /// Untrained classifier: zero weights score every input at exactly 0.5.
    pub fn untrained(n_features: usize) -> Self {
        Self {
            weights: vec![0.0; n_features],
            bias: 0.0,
        }
    }

    /// Fit on scaled training features and 0/1 labels.
    pub fn fit(x: &Array2<f64>, y: &Array1<f64>, params: &TrainParams) -> Self {
        let n = x.nrows().max(1) as f64;
        let mut model = Self::untrained(x.ncols());

        for _ in 0..params.epochs {
            let mut grad_w = vec![0.0; x.ncols()];
            let mut grad_b = 0.0;

            for (row, &label) in x.outer_iter().zip(y.iter()) {
                let z = model.bias
                    + model
                        .weights
                        .iter()
                        .zip(row.iter())
                        .map(|(w, v)| w * v)
                        .sum::<f64>();
                let error = sigmoid(z) - label;
                for (g, &v) in grad_w.iter_mut().zip(row.iter()) {
                    *g += error * v;
                }
                grad_b += error;
            }

            for (w, g) in model.weights.iter_mut().zip(grad_w.iter()) {
                *w -= params.learning_rate * (g / n + params.l2 * *w);
            }
            model.bias -= params.learning_rate * grad_b / n;
        }

        model
    }

    /// Probability of the positive (fraud) class.
    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        let z = self.bias
            + self
                .weights
                .iter()
                .zip(features.iter())
                .map(|(w, v)| w * v)
                .sum::<f64>();
        sigmoid(z)
    }

    /// Hard decision at the conventional 0.5 point, used for held-out
    /// evaluation only; the pipeline's risk tiers come from the status
    /// mapping, not from here.
    pub fn predict(&self, features: &[f64]) -> u8 {
        u8::from(self.predict_proba(features) >= 0.5)
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_untrained_scores_midpoint() {
        let model = LogisticClassifier::untrained(8);
        assert_eq!(model.predict_proba(&[0.0; 8]), 0.5);
        assert_eq!(model.predict_proba(&[5.0, -3.0, 1.0, 0.0, 2.0, 9.0, -1.0, 4.0]), 0.5);
    }

    #[test]
    fn test_fit_separable_data() {
        // One feature, negative => class 0, positive => class 1.
        let x = array![[-2.0], [-1.5], [-1.0], [-0.5], [0.5], [1.0], [1.5], [2.0]];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        let model = LogisticClassifier::fit(&x, &y, &TrainParams::default());

        assert!(model.predict_proba(&[2.0]) > 0.8);
        assert!(model.predict_proba(&[-2.0]) < 0.2);
        assert_eq!(model.predict(&[2.0]), 1);
        assert_eq!(model.predict(&[-2.0]), 0);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let x = array![[-1.0, 0.3], [0.2, -0.7], [1.0, 1.1], [-0.4, 0.9]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let a = LogisticClassifier::fit(&x, &y, &TrainParams::default());
        let b = LogisticClassifier::fit(&x, &y, &TrainParams::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_sigmoid_range() {
        assert!(sigmoid(0.0) > 0.49 && sigmoid(0.0) < 0.51);
        assert!(sigmoid(50.0) > 0.99);
        assert!(sigmoid(-50.0) < 0.01);
    }
}
