//! Transaction intake orchestration: persist, score, classify, aggregate,
//! alert.
//!
//! A failed or timed-out risk assessment never blocks the transfer: the
//! transaction stays `legitimate` with no score, the failure is logged, and
//! submission still succeeds. Only operators ever see scoring-layer errors.

use chrono::NaiveDate;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::classify::status_for_score;
use crate::error::{Error, Result};
use crate::metrics::PipelineMetrics;
use crate::models::scorer::{FraudScorer, Prediction};
use crate::stats::StatsAggregator;
use crate::store::TransactionStore;
use crate::types::alert::FraudAlert;
use crate::types::stats::PeriodStats;
use crate::types::transaction::{
    ScoreRequest, SenderSummary, Transaction, TransactionRequest, TransactionStatus,
};

pub struct TransactionPipeline {
    store: Arc<dyn TransactionStore>,
    scorer: Arc<FraudScorer>,
    stats: Arc<StatsAggregator>,
    metrics: Arc<PipelineMetrics>,
    alerts: mpsc::UnboundedSender<FraudAlert>,
    scoring_timeout: Duration,
}

impl TransactionPipeline {
    pub fn new(
        store: Arc<dyn TransactionStore>,
        scorer: Arc<FraudScorer>,
        stats: Arc<StatsAggregator>,
        metrics: Arc<PipelineMetrics>,
        alerts: mpsc::UnboundedSender<FraudAlert>,
        scoring_timeout: Duration,
    ) -> Self {
        Self {
            store,
            scorer,
            stats,
            metrics,
            alerts,
            scoring_timeout,
        }
    }

    /// Submit a transaction: persist it, score it, classify it, fold it
    /// into the daily aggregates, and raise an alert when it lands in the
    /// top risk tier.
    pub async fn submit(&self, request: TransactionRequest) -> Result<Transaction> {
        let started = Instant::now();

        if !(request.amount.is_finite() && request.amount > 0.0) {
            return Err(Error::InvalidAmount(request.amount));
        }

        // Sender history is gathered before intake so the transaction being
        // scored is not part of its own history.
        let sender = self.store.sender_summary(&request.sender_id)?;
        let mut transaction = self.store.create(&request)?;

        let prediction = match self.score_with_timeout(&transaction, sender).await {
            Ok(prediction) => Some(prediction),
            Err(err) => {
                warn!(
                    transaction_id = %transaction.id,
                    error = %err,
                    "risk scoring unavailable, keeping transaction legitimate"
                );
                None
            }
        };

        if let Some(prediction) = &prediction {
            let status = status_for_score(prediction.fraud_score);
            transaction = self
                .store
                .apply_score(transaction.id, prediction.fraud_score, status)?;
        }

        self.stats.record(&transaction)?;

        if let Some(prediction) = &prediction {
            if transaction.status == TransactionStatus::Fraudulent {
                self.raise_alert(&transaction, prediction);
                self.metrics.record_alert();
            }
        }

        self.metrics
            .record_transaction(started.elapsed(), transaction.fraud_score);
        info!(
            transaction_id = %transaction.id,
            status = %transaction.status,
            fraud_score = ?transaction.fraud_score,
            "transaction submitted"
        );
        Ok(transaction)
    }

    /// Administrative status correction: no re-scoring, `fraud_score`
    /// untouched, aggregates re-bucketed through the adjustment path.
    pub fn update_status(
        &self,
        id: Uuid,
        new_status: TransactionStatus,
    ) -> Result<Transaction> {
        let existing = self.store.get(id)?.ok_or(Error::TransactionNotFound(id))?;
        let previous_status = existing.status;

        let transaction = self.store.set_status(id, new_status)?;
        self.stats.adjust(&transaction, previous_status)?;

        info!(
            transaction_id = %id,
            from = %previous_status,
            to = %new_status,
            "transaction status corrected"
        );
        Ok(transaction)
    }

    /// Aggregate stats for an inclusive date range (the reporting surface).
    pub fn period_stats(&self, start: NaiveDate, end: NaiveDate) -> Result<PeriodStats> {
        self.stats.period_stats(start, end)
    }

    /// Run the CPU-bound scorer off the async workers, bounded by the
    /// configured timeout. A timeout is treated exactly like any other
    /// scoring failure.
    async fn score_with_timeout(
        &self,
        transaction: &Transaction,
        sender: SenderSummary,
    ) -> Result<Prediction> {
        let request = ScoreRequest {
            transaction_id: transaction.id,
            sender_id: transaction.sender_id.clone(),
            amount: transaction.amount,
            created_at: Some(transaction.created_at),
        };
        let scorer = Arc::clone(&self.scorer);
        let handle = tokio::task::spawn_blocking(move || scorer.score(&request, &sender));

        match tokio::time::timeout(self.scoring_timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(Error::ScoringUnavailable(format!(
                "scoring task failed: {join_error}"
            ))),
            Err(_) => Err(Error::ScoringUnavailable(format!(
                "scoring timed out after {:?}",
                self.scoring_timeout
            ))),
        }
    }

    /// Fire-and-forget: a closed alert channel is logged, never propagated.
    fn raise_alert(&self, transaction: &Transaction, prediction: &Prediction) {
        let alert = FraudAlert::new(
            transaction.id,
            prediction.fraud_score,
            transaction.status,
            prediction.model_version.clone(),
        )
        .with_transaction_details(transaction.amount, transaction.sender_name.clone())
        .with_risk_factors(prediction.risk_factors.clone());

        if let Err(err) = self.alerts.send(alert) {
            error!(
                transaction_id = %transaction.id,
                error = %err,
                "failed to queue fraud alert"
            );
        }
    }
}
