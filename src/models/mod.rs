//! Model training, persistence, and inference components

pub mod classifier;
pub mod evaluation;
pub mod registry;
pub mod scaler;
pub mod scorer;
pub mod trainer;

pub use registry::{FileModelRegistry, InMemoryModelRegistry, ModelArtifact, ModelRegistry};
pub use scorer::{FraudScorer, Prediction};
pub use trainer::{ModelTrainer, TrainingDataSource, TrainingReport};
