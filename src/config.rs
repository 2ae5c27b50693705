//! Configuration management for the risk-scoring pipeline

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub models: ModelsConfig,
    pub training: TrainingConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming transaction requests
    pub transaction_subject: String,
    /// Subject for outgoing fraud alerts
    pub alert_subject: String,
}

/// Model artifact storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Directory holding versioned model artifacts and the active pointer
    pub models_dir: String,
}

/// Training configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TrainingConfig {
    /// Synthetic samples to generate when no other data source applies
    #[serde(default = "default_synthetic_samples")]
    pub synthetic_samples: usize,
    /// Seed for synthetic generation and the train/test split
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Train a model at startup when the registry has no active one
    #[serde(default = "default_train_on_startup")]
    pub train_on_startup: bool,
}

fn default_synthetic_samples() -> usize {
    500
}

fn default_seed() -> u64 {
    42
}

fn default_train_on_startup() -> bool {
    true
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Number of concurrent submission workers
    pub workers: usize,
    /// Bounded timeout for one scoring call, in milliseconds
    pub scoring_timeout_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                transaction_subject: "transactions.submitted".to_string(),
                alert_subject: "fraud.alerts".to_string(),
            },
            models: ModelsConfig {
                models_dir: "models".to_string(),
            },
            training: TrainingConfig {
                synthetic_samples: default_synthetic_samples(),
                seed: default_seed(),
                train_on_startup: default_train_on_startup(),
            },
            pipeline: PipelineConfig {
                workers: 4,
                scoring_timeout_ms: 1000,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.nats.url, "nats://localhost:4222");
        assert_eq!(config.training.synthetic_samples, 500);
        assert_eq!(config.training.seed, 42);
        assert!(config.training.train_on_startup);
        assert_eq!(config.pipeline.workers, 4);
    }

    #[test]
    fn test_training_defaults_apply() {
        let toml = r#"
            [nats]
            url = "nats://localhost:4222"
            transaction_subject = "tx"
            alert_subject = "alerts"

            [models]
            models_dir = "models"

            [training]

            [pipeline]
            workers = 2
            scoring_timeout_ms = 500

            [logging]
            level = "debug"
            format = "json"
        "#;
        let config: AppConfig = Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.training.synthetic_samples, 500);
        assert_eq!(config.pipeline.workers, 2);
    }
}
