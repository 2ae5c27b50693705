//! Single-snapshot fraud scorer.
//!
//! The scorer holds an immutable model snapshot behind one `RwLock`'d
//! `Arc`. Inference clones the `Arc` and never mutates shared state, so
//! concurrent scoring is safe; retraining swaps the reference in a single
//! write and readers observe either the old or the new model, never a
//! partial state.

use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::feature_extractor::{FeatureExtractor, FEATURE_COUNT, FEATURE_NAMES};
use crate::models::classifier::LogisticClassifier;
use crate::models::registry::{ModelArtifact, ModelRegistry};
use crate::models::scaler::StandardScaler;
use crate::types::transaction::{ScoreRequest, SenderSummary};

/// Internal model-side fraud flag threshold.
///
/// Numerically equal to [`crate::classify::FRAUDULENT_THRESHOLD`] today but
/// deliberately independent: this one is a diagnostic on the raw model
/// output, the other drives the externally visible status tiers.
pub const MODEL_FRAUD_THRESHOLD: f64 = 0.7;

/// Version string reported while no trained model is installed.
pub const UNTRAINED_VERSION: &str = "v0.untrained";

pub const RISK_AMOUNT_ABOVE_AVERAGE: &str = "Amount significantly above sender average";
pub const RISK_NIGHTTIME: &str = "Nighttime transaction";
pub const RISK_FEW_PRIOR_TRANSACTIONS: &str = "Few prior transactions from sender";
pub const RISK_WEEKEND: &str = "Weekend transaction";

/// Immutable model state shared read-only by concurrent scoring calls.
struct ModelSnapshot {
    version: String,
    scaler: StandardScaler,
    classifier: LogisticClassifier,
}

impl ModelSnapshot {
    /// Lazy default used when no trained model exists: zero weights score
    /// everything at exactly 0.5 with zero confidence. Availability over
    /// correctness — callers get a usable low-confidence score, never an
    /// error.
    fn untrained() -> Self {
        Self {
            version: UNTRAINED_VERSION.to_string(),
            scaler: StandardScaler::identity(),
            classifier: LogisticClassifier::untrained(FEATURE_COUNT),
        }
    }

    fn from_artifact(artifact: &ModelArtifact) -> Result<Self> {
        if artifact.feature_names != FEATURE_NAMES {
            return Err(Error::ScoringUnavailable(format!(
                "artifact {} feature columns {:?} do not match the extractor contract",
                artifact.version, artifact.feature_names
            )));
        }
        Ok(Self {
            version: artifact.version.clone(),
            scaler: artifact.scaler.clone(),
            classifier: artifact.classifier.clone(),
        })
    }
}

/// Scoring result; also the response shape of the scoring boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// Probability-like fraud estimate in [0, 1].
    pub fraud_score: f64,
    /// Internal diagnostic flag; the externally visible status comes from
    /// the classify stage.
    pub is_fraud: bool,
    /// Decisiveness of the score, not its correctness: 0 at the midpoint,
    /// 1 at either extreme.
    pub confidence: f64,
    /// Rule-based explanations, independent of the model score.
    pub risk_factors: Vec<String>,
    pub model_version: String,
}

/// Scores transactions with the currently active model snapshot.
pub struct FraudScorer {
    extractor: FeatureExtractor,
    snapshot: RwLock<Arc<ModelSnapshot>>,
}

impl FraudScorer {
    /// Scorer with the lazy untrained default.
    pub fn untrained() -> Self {
        Self {
            extractor: FeatureExtractor::new(),
            snapshot: RwLock::new(Arc::new(ModelSnapshot::untrained())),
        }
    }

    /// Load the active artifact from the registry, falling back to the
    /// untrained default when none is active.
    pub fn from_registry(registry: &dyn ModelRegistry) -> Result<Self> {
        let scorer = Self::untrained();
        match registry.active()? {
            Some(artifact) => {
                scorer.install(&artifact)?;
                info!(version = %artifact.version, "loaded active model");
            }
            None => {
                warn!("no active model in registry, scoring with untrained default");
            }
        }
        Ok(scorer)
    }

    /// Atomically swap in a newly trained model.
    pub fn install(&self, artifact: &ModelArtifact) -> Result<()> {
        let snapshot = Arc::new(ModelSnapshot::from_artifact(artifact)?);
        let mut guard = self
            .snapshot
            .write()
            .map_err(|_| Error::ScoringUnavailable("scorer lock poisoned".into()))?;
        *guard = snapshot;
        Ok(())
    }

    /// Version of the model currently answering predictions.
    pub fn model_version(&self) -> String {
        self.snapshot
            .read()
            .map(|snapshot| snapshot.version.clone())
            .unwrap_or_else(|_| UNTRAINED_VERSION.to_string())
    }

    /// Score one transaction.
    ///
    /// The rule checks read the raw feature values while the classifier
    /// consumes the scaled copy; both representations are materialized here
    /// rather than re-derived from each other.
    pub fn score(&self, request: &ScoreRequest, sender: &SenderSummary) -> Result<Prediction> {
        let snapshot = self
            .snapshot
            .read()
            .map_err(|_| Error::ScoringUnavailable("scorer lock poisoned".into()))?
            .clone();

        let raw = self
            .extractor
            .extract(request.amount, request.created_at, sender);
        let scaled = snapshot.scaler.transform_row(&raw);
        let fraud_score = snapshot.classifier.predict_proba(&scaled).clamp(0.0, 1.0);

        let prediction = Prediction {
            fraud_score,
            is_fraud: fraud_score >= MODEL_FRAUD_THRESHOLD,
            confidence: confidence(fraud_score),
            risk_factors: risk_factors(&raw),
            model_version: snapshot.version.clone(),
        };

        debug!(
            transaction_id = %request.transaction_id,
            fraud_score = prediction.fraud_score,
            confidence = prediction.confidence,
            model_version = %prediction.model_version,
            "transaction scored"
        );

        Ok(prediction)
    }
}

/// `2 * |score - 0.5|`: 0 at the midpoint, 1 at either extreme.
pub fn confidence(fraud_score: f64) -> f64 {
    2.0 * (fraud_score - 0.5).abs()
}

/// Rule-based risk factors over the raw feature vector. Rule order is fixed:
/// amount, nighttime, sender history, weekend. Zero or many may fire,
/// independently of the model score.
fn risk_factors(raw: &[f64; FEATURE_COUNT]) -> Vec<String> {
    let amount = raw[0];
    let hour = raw[1] as u32;
    let day_of_week = raw[2] as u32;
    let sender_avg = raw[4];
    let sender_count = raw[5];

    let mut factors = Vec::new();
    if sender_avg > 0.0 && amount > sender_avg * 3.0 {
        factors.push(RISK_AMOUNT_ABOVE_AVERAGE.to_string());
    }
    if hour >= 22 || hour < 6 {
        factors.push(RISK_NIGHTTIME.to_string());
    }
    if sender_count <= 1.0 {
        factors.push(RISK_FEW_PRIOR_TRANSACTIONS.to_string());
    }
    if day_of_week >= 5 {
        factors.push(RISK_WEEKEND.to_string());
    }
    factors
}
