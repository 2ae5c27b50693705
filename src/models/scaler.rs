//! Per-column standardization fitted on training data only.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::feature_extractor::FEATURE_COUNT;

/// Column-wise z-score scaler.
///
/// Fitted means and standard deviations are part of the persisted model
/// artifact so inference reproduces the exact training-time transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl StandardScaler {
    /// Identity scaler used before any training has happened.
    pub fn identity() -> Self {
        Self {
            means: vec![0.0; FEATURE_COUNT],
            stds: vec![1.0; FEATURE_COUNT],
        }
    }

    /// Fit column means and standard deviations on the given rows.
    ///
    /// Zero-variance columns keep a unit divisor so transforming them is a
    /// no-op instead of a NaN.
    pub fn fit(x: &Array2<f64>) -> Self {
        let n = x.nrows().max(1) as f64;
        let mut means = Vec::with_capacity(x.ncols());
        let mut stds = Vec::with_capacity(x.ncols());

        for col in x.columns() {
            let mean = col.sum() / n;
            let variance = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = variance.sqrt();
            means.push(mean);
            stds.push(if std <= f64::EPSILON { 1.0 } else { std });
        }

        Self { means, stds }
    }

    /// Transform a single feature row.
    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(self.stds.iter()))
            .map(|(v, (mean, std))| (v - mean) / std)
            .collect()
    }

    /// Transform a whole feature matrix.
    pub fn transform(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut out = x.clone();
        for ((_, j), v) in out.indexed_iter_mut() {
            *v = (*v - self.means[j]) / self.stds[j];
        }
        out
    }
}
