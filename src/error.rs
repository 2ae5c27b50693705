//! Error taxonomy for the risk-scoring pipeline.
//!
//! Validation errors are rejected before any state mutation. Scoring
//! unavailability is recovered inside the pipeline (legitimate-by-default
//! fallback) and never surfaced to the submitting caller; training failures
//! abort the run and leave the active model untouched.

use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid transaction amount {0}: must be a positive number")]
    InvalidAmount(f64),

    #[error("training dataset is missing required columns: {0:?}")]
    MissingColumns(Vec<String>),

    #[error("malformed training dataset: {0}")]
    Dataset(String),

    #[error("scoring unavailable: {0}")]
    ScoringUnavailable(String),

    #[error("training failed: {0}")]
    Training(String),

    #[error("transaction {0} not found")]
    TransactionNotFound(Uuid),

    #[error("model version {0} not found")]
    ModelNotFound(String),

    #[error("storage error: {0}")]
    Store(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}
