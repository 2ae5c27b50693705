//! Model training: data sourcing, synthetic generation, fitting,
//! evaluation, and artifact activation.

use chrono::Utc;
use ndarray::{Array1, Array2};
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand_distr::Normal;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::feature_extractor::{amount_deviation, FEATURE_COUNT, FEATURE_NAMES};
use crate::models::classifier::{LogisticClassifier, TrainParams};
use crate::models::evaluation::{evaluate, EvaluationMetrics};
use crate::models::registry::{ModelArtifact, ModelRegistry};
use crate::models::scaler::StandardScaler;

/// Label column expected next to the feature columns in external datasets.
pub const LABEL_COLUMN: &str = "is_fraud";

/// Fewer labeled rows than this aborts training.
pub const MIN_TRAINING_ROWS: usize = 10;

/// Labeled feature rows in `FEATURE_NAMES` order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LabeledDataset {
    rows: Vec<[f64; FEATURE_COUNT]>,
    labels: Vec<u8>,
}

impl LabeledDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dataset from named columns, validating that every required
    /// feature column is present before anything else happens. Input column
    /// order does not matter; rows are emitted in `FEATURE_NAMES` order.
    pub fn from_columns(columns: &HashMap<String, Vec<f64>>, labels: Vec<u8>) -> Result<Self> {
        let missing: Vec<String> = FEATURE_NAMES
            .iter()
            .copied()
            .filter(|name| !columns.contains_key(*name))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingColumns(missing));
        }

        for name in FEATURE_NAMES {
            if columns[name].len() != labels.len() {
                return Err(Error::Dataset(format!(
                    "column {name} has {} values for {} labels",
                    columns[name].len(),
                    labels.len()
                )));
            }
        }

        let mut rows = Vec::with_capacity(labels.len());
        for i in 0..labels.len() {
            let mut row = [0.0; FEATURE_COUNT];
            for (j, name) in FEATURE_NAMES.iter().enumerate() {
                row[j] = columns[*name][i];
            }
            rows.push(row);
        }

        Ok(Self { rows, labels })
    }

    pub fn push(&mut self, row: [f64; FEATURE_COUNT], label: u8) {
        self.rows.push(row);
        self.labels.push(label);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[[f64; FEATURE_COUNT]] {
        &self.rows
    }

    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    /// Split into train/test with a seeded shuffle for reproducibility.
    pub fn split(&self, test_fraction: f64, seed: u64) -> (LabeledDataset, LabeledDataset) {
        let mut indices: Vec<usize> = (0..self.len()).collect();
        indices.shuffle(&mut StdRng::seed_from_u64(seed));

        let test_len = ((self.len() as f64) * test_fraction).round() as usize;
        let (test_idx, train_idx) = indices.split_at(test_len.min(self.len()));

        let pick = |idx: &[usize]| {
            let mut out = LabeledDataset::new();
            for &i in idx {
                out.push(self.rows[i], self.labels[i]);
            }
            out
        };
        (pick(train_idx), pick(test_idx))
    }

    pub fn feature_matrix(&self) -> Array2<f64> {
        let mut x = Array2::zeros((self.rows.len(), FEATURE_COUNT));
        for (i, row) in self.rows.iter().enumerate() {
            for (j, &value) in row.iter().enumerate() {
                x[[i, j]] = value;
            }
        }
        x
    }

    pub fn label_array(&self) -> Array1<f64> {
        Array1::from_iter(self.labels.iter().map(|&label| f64::from(label)))
    }
}

/// Ordered source of labeled training data.
///
/// Sources are tried in declared order; the first one yielding a non-empty
/// dataset wins. `Ok(None)` means "nothing available here, try the next";
/// an `Err` aborts the run.
pub trait TrainingDataSource: Send + Sync {
    fn name(&self) -> &str;
    fn fetch(&self) -> Result<Option<LabeledDataset>>;
}

/// A dataset supplied directly by the caller.
pub struct StaticSource {
    dataset: LabeledDataset,
}

impl StaticSource {
    pub fn new(dataset: LabeledDataset) -> Self {
        Self { dataset }
    }
}

impl TrainingDataSource for StaticSource {
    fn name(&self) -> &str {
        "supplied"
    }

    fn fetch(&self) -> Result<Option<LabeledDataset>> {
        Ok(Some(self.dataset.clone()))
    }
}

/// Labeled rows from a CSV file with a header; the file must carry every
/// feature column plus `is_fraud`. A missing file yields nothing (the next
/// source is tried); a malformed file is an error.
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl TrainingDataSource for CsvSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self) -> Result<Option<LabeledDataset>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let mut reader = csv::Reader::from_path(&self.path)
            .map_err(|e| Error::Dataset(format!("{}: {e}", self.path.display())))?;
        let headers = reader
            .headers()
            .map_err(|e| Error::Dataset(e.to_string()))?
            .clone();

        let mut missing: Vec<String> = Vec::new();
        for name in FEATURE_NAMES {
            if !headers.iter().any(|h| h == name) {
                missing.push(name.to_string());
            }
        }
        if !headers.iter().any(|h| h == LABEL_COLUMN) {
            missing.push(LABEL_COLUMN.to_string());
        }
        if !missing.is_empty() {
            return Err(Error::MissingColumns(missing));
        }

        let mut feature_positions = [0usize; FEATURE_COUNT];
        for (j, name) in FEATURE_NAMES.iter().enumerate() {
            feature_positions[j] = headers.iter().position(|h| h == *name).unwrap_or_default();
        }
        let label_position = headers
            .iter()
            .position(|h| h == LABEL_COLUMN)
            .unwrap_or_default();

        let mut dataset = LabeledDataset::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.map_err(|e| Error::Dataset(e.to_string()))?;
            let parse = |pos: usize| -> Result<f64> {
                record
                    .get(pos)
                    .and_then(|v| v.trim().parse::<f64>().ok())
                    .ok_or_else(|| {
                        Error::Dataset(format!("row {}: non-numeric value", line + 2))
                    })
            };

            let mut row = [0.0; FEATURE_COUNT];
            for (j, &pos) in feature_positions.iter().enumerate() {
                row[j] = parse(pos)?;
            }
            let label = u8::from(parse(label_position)? != 0.0);
            dataset.push(row, label);
        }

        Ok(Some(dataset))
    }
}

/// Seeded synthetic dataset; never empty, so it terminates any source chain.
pub struct SyntheticSource {
    samples: usize,
    seed: u64,
}

impl SyntheticSource {
    pub fn new(samples: usize, seed: u64) -> Self {
        Self { samples, seed }
    }
}

impl TrainingDataSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self) -> Result<Option<LabeledDataset>> {
        Ok(Some(generate_synthetic(self.samples, self.seed)))
    }
}

/// The eight night hours fraud activity concentrates in.
const NIGHT_HOURS: [u32; 8] = [22, 23, 0, 1, 2, 3, 4, 5];

/// Generate a labeled synthetic dataset: 70% legitimate rows drawn around an
/// established-sender profile, 30% fraud rows with extreme amounts, night
/// hours, weekend-weighted days, and new-sender history.
pub fn generate_synthetic(samples: usize, seed: u64) -> LabeledDataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut dataset = LabeledDataset::new();

    let legit_amount = Normal::<f64>::new(100.0, 50.0).expect("finite normal parameters");
    let legit_hour = Normal::<f64>::new(14.0, 4.0).expect("finite normal parameters");
    let legit_avg = Normal::<f64>::new(100.0, 20.0).expect("finite normal parameters");
    let fraud_avg = Normal::<f64>::new(50.0, 30.0).expect("finite normal parameters");

    let legit_days = WeightedIndex::new([0.17, 0.17, 0.17, 0.17, 0.17, 0.08, 0.07])
        .expect("static weights");
    let fraud_days =
        WeightedIndex::new([0.1, 0.1, 0.1, 0.1, 0.1, 0.25, 0.25]).expect("static weights");

    let legit_count = (samples as f64 * 0.7) as usize;
    let fraud_count = (samples as f64 * 0.3) as usize;

    for _ in 0..legit_count {
        let amount = legit_amount.sample(&mut rng).max(10.0);
        let hour = legit_hour.sample(&mut rng).round().clamp(0.0, 23.0);
        let day = legit_days.sample(&mut rng) as f64;
        let avg = legit_avg.sample(&mut rng).max(10.0);
        dataset.push(
            [
                amount,
                hour,
                day,
                if day >= 5.0 { 1.0 } else { 0.0 },
                avg,
                rng.gen_range(5..50) as f64,
                rng.gen_range(0.1..2.0),
                amount_deviation(amount, avg),
            ],
            0,
        );
    }

    for _ in 0..fraud_count {
        // Bimodal amounts: either dust or far above any normal transfer.
        let amount = if rng.gen_bool(0.5) {
            rng.gen_range(1.0..10.0)
        } else {
            rng.gen_range(500.0..2000.0)
        };
        let hour = NIGHT_HOURS[rng.gen_range(0..NIGHT_HOURS.len())] as f64;
        let day = fraud_days.sample(&mut rng) as f64;
        let avg = fraud_avg.sample(&mut rng).max(1.0);
        dataset.push(
            [
                amount,
                hour,
                day,
                if day >= 5.0 { 1.0 } else { 0.0 },
                avg,
                rng.gen_range(0..5) as f64,
                rng.gen_range(0.0..0.1),
                amount_deviation(amount, avg),
            ],
            1,
        );
    }

    dataset
}

/// Outcome of a successful training run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub version: String,
    pub metrics: EvaluationMetrics,
    pub samples: usize,
    pub source: String,
}

/// Fits, evaluates, persists, and activates model artifacts.
///
/// Any failure aborts before the registry is touched, leaving the currently
/// active model exactly as it was.
pub struct ModelTrainer {
    registry: Arc<dyn ModelRegistry>,
    params: TrainParams,
    seed: u64,
}

/// Held-out fraction of the labeled data.
const TEST_FRACTION: f64 = 0.2;

impl ModelTrainer {
    pub fn new(registry: Arc<dyn ModelRegistry>) -> Self {
        Self::with_seed(registry, 42)
    }

    pub fn with_seed(registry: Arc<dyn ModelRegistry>, seed: u64) -> Self {
        Self {
            registry,
            params: TrainParams::default(),
            seed,
        }
    }

    pub fn with_params(mut self, params: TrainParams) -> Self {
        self.params = params;
        self
    }

    /// Resolve training data: first source with a non-empty dataset wins.
    fn resolve_dataset(
        &self,
        sources: &[Box<dyn TrainingDataSource>],
    ) -> Result<(String, LabeledDataset)> {
        for source in sources {
            match source.fetch()? {
                Some(dataset) if !dataset.is_empty() => {
                    info!(
                        source = source.name(),
                        rows = dataset.len(),
                        "training data resolved"
                    );
                    return Ok((source.name().to_string(), dataset));
                }
                _ => {
                    debug!(source = source.name(), "source yielded no rows, trying next");
                }
            }
        }
        Err(Error::Training(
            "no training data source produced any rows".into(),
        ))
    }

    /// Train a new model and atomically make it the active one.
    pub fn train(&self, sources: &[Box<dyn TrainingDataSource>]) -> Result<TrainingReport> {
        let (source_name, dataset) = self.resolve_dataset(sources)?;

        if dataset.len() < MIN_TRAINING_ROWS {
            return Err(Error::Training(format!(
                "need at least {MIN_TRAINING_ROWS} labeled rows, got {}",
                dataset.len()
            )));
        }

        let (train, test) = dataset.split(TEST_FRACTION, self.seed);

        let x_train = train.feature_matrix();
        let scaler = StandardScaler::fit(&x_train);
        let classifier =
            LogisticClassifier::fit(&scaler.transform(&x_train), &train.label_array(), &self.params);

        let scores: Vec<f64> = test
            .rows()
            .iter()
            .map(|row| classifier.predict_proba(&scaler.transform_row(row)))
            .collect();
        let predictions: Vec<u8> = scores.iter().map(|&s| u8::from(s >= 0.5)).collect();
        let metrics = evaluate(test.labels(), &predictions, &scores);

        let version = format!("v1.{}", Utc::now().format("%Y%m%d%H%M%S"));
        let artifact = ModelArtifact {
            version: version.clone(),
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            scaler,
            classifier,
            metrics,
            trained_at: Utc::now(),
            is_active: false,
        };

        self.registry.save(artifact)?;
        self.registry.activate(&version)?;

        info!(
            version = %version,
            accuracy = metrics.accuracy,
            precision = metrics.precision,
            recall = metrics.recall,
            f1 = metrics.f1,
            auc = metrics.auc,
            "model trained and activated"
        );

        Ok(TrainingReport {
            version,
            metrics,
            samples: dataset.len(),
            source: source_name,
        })
    }
}
