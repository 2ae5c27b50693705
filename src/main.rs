//! Risk-Scoring Pipeline - Main Entry Point
//!
//! Consumes transaction requests from NATS, scores them with the active
//! model, persists statuses and daily aggregates, and publishes fraud
//! alerts. Supports parallel submission processing for high throughput.

use anyhow::Result;
use futures::StreamExt;
use risk_scoring_pipeline::{
    config::AppConfig,
    consumer::TransactionConsumer,
    metrics::{MetricsReporter, PipelineMetrics},
    models::registry::{FileModelRegistry, ModelRegistry},
    models::scorer::FraudScorer,
    models::trainer::{ModelTrainer, SyntheticSource, TrainingDataSource},
    pipeline::TransactionPipeline,
    producer::AlertProducer,
    stats::StatsAggregator,
    store::{InMemoryDailyStatStore, InMemoryTransactionStore},
    types::transaction::TransactionRequest,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("risk_scoring_pipeline=info".parse()?),
        )
        .init();

    info!("Starting Risk Scoring Pipeline");

    // Load configuration
    let config = AppConfig::load()?;
    info!("Configuration loaded successfully");

    // Model registry + startup training when no model is active yet
    let registry: Arc<FileModelRegistry> = Arc::new(FileModelRegistry::new(&config.models.models_dir)?);

    if config.training.train_on_startup && registry.active()?.is_none() {
        info!(
            samples = config.training.synthetic_samples,
            seed = config.training.seed,
            "No active model found, training from synthetic data"
        );
        let trainer = ModelTrainer::with_seed(registry.clone(), config.training.seed);
        let sources: Vec<Box<dyn TrainingDataSource>> = vec![Box::new(SyntheticSource::new(
            config.training.synthetic_samples,
            config.training.seed,
        ))];
        match trainer.train(&sources) {
            Ok(report) => info!(
                version = %report.version,
                accuracy = report.metrics.accuracy,
                auc = report.metrics.auc,
                "Startup training complete"
            ),
            Err(e) => warn!(error = %e, "Startup training failed, continuing with untrained scorer"),
        }
    }

    let scorer = Arc::new(FraudScorer::from_registry(registry.as_ref())?);
    info!(model_version = %scorer.model_version(), "Fraud scorer ready");

    // Initialize metrics and stores
    let metrics = Arc::new(PipelineMetrics::new());
    let store = Arc::new(InMemoryTransactionStore::new());
    let stat_store = Arc::new(InMemoryDailyStatStore::new());
    let stats = Arc::new(StatsAggregator::new(stat_store));

    let (alert_tx, mut alert_rx) = mpsc::unbounded_channel();

    let pipeline = Arc::new(TransactionPipeline::new(
        store,
        scorer,
        stats,
        metrics.clone(),
        alert_tx,
        Duration::from_millis(config.pipeline.scoring_timeout_ms),
    ));

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    let consumer = TransactionConsumer::new(client.clone(), &config.nats.transaction_subject);
    let producer = AlertProducer::new(client.clone(), &config.nats.alert_subject);

    // Alert forwarder: delivery failures are logged, never propagated back
    // into the pipeline.
    tokio::spawn(async move {
        while let Some(alert) = alert_rx.recv().await {
            if let Err(e) = producer.publish(&alert).await {
                error!(
                    alert_id = %alert.alert_id,
                    transaction_id = %alert.transaction_id,
                    error = %e,
                    "Failed to publish fraud alert"
                );
            }
        }
    });

    // Start metrics reporter (prints summary every 30 seconds)
    let metrics_clone = metrics.clone();
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics_clone, 30);
        reporter.start().await;
    });

    // Semaphore to limit concurrent submissions
    let semaphore = Arc::new(Semaphore::new(config.pipeline.workers));
    let mut subscription = consumer.subscribe().await?;
    info!(
        subject = %config.nats.transaction_subject,
        workers = config.pipeline.workers,
        "Processing transaction requests"
    );
    info!("Publishing alerts to: {}", config.nats.alert_subject);

    while let Some(message) = subscription.next().await {
        let permit = semaphore.clone().acquire_owned().await?;
        let pipeline = pipeline.clone();

        tokio::spawn(async move {
            match serde_json::from_slice::<TransactionRequest>(&message.payload) {
                Ok(request) => {
                    if let Err(e) = pipeline.submit(request).await {
                        warn!(error = %e, "Transaction rejected");
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to deserialize transaction request");
                }
            }
            drop(permit);
        });
    }

    // Print final summary
    info!("Pipeline shutting down...");
    metrics.print_summary();

    Ok(())
}
