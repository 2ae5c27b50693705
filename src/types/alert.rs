//! Fraud alert data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::transaction::TransactionStatus;

/// Alert raised when a transaction is classified into the highest risk tier.
///
/// Alerts are fire-and-forget notifications: a failure to deliver one never
/// affects the underlying transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudAlert {
    /// Unique alert identifier.
    pub alert_id: String,

    /// Associated transaction ID.
    pub transaction_id: Uuid,

    /// Model fraud score that triggered the alert.
    pub fraud_score: f64,

    /// Risk status of the transaction at alert time.
    pub status: TransactionStatus,

    /// Rule-based explanations, independent of the model score.
    pub risk_factors: Vec<String>,

    /// Version of the model that produced the score.
    pub model_version: String,

    /// Transaction amount.
    pub amount: f64,

    /// Sender display name.
    pub sender_name: String,

    /// Alert generation timestamp.
    pub timestamp: DateTime<Utc>,
}

impl FraudAlert {
    pub fn new(
        transaction_id: Uuid,
        fraud_score: f64,
        status: TransactionStatus,
        model_version: String,
    ) -> Self {
        Self {
            alert_id: Uuid::new_v4().to_string(),
            transaction_id,
            fraud_score,
            status,
            risk_factors: Vec::new(),
            model_version,
            amount: 0.0,
            sender_name: String::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_transaction_details(mut self, amount: f64, sender_name: String) -> Self {
        self.amount = amount;
        self.sender_name = sender_name;
        self
    }

    pub fn with_risk_factors(mut self, risk_factors: Vec<String>) -> Self {
        self.risk_factors = risk_factors;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraud_alert_serialization() {
        let tx_id = Uuid::new_v4();
        let alert = FraudAlert::new(
            tx_id,
            0.91,
            TransactionStatus::Fraudulent,
            "v1.202506011200".to_string(),
        )
        .with_transaction_details(1500.0, "Mallory".to_string())
        .with_risk_factors(vec!["Nighttime transaction".to_string()]);

        let json = serde_json::to_string(&alert).unwrap();
        let deserialized: FraudAlert = serde_json::from_str(&json).unwrap();

        assert_eq!(alert.transaction_id, deserialized.transaction_id);
        assert_eq!(alert.fraud_score, deserialized.fraud_score);
        assert_eq!(alert.risk_factors, deserialized.risk_factors);
        assert_eq!(deserialized.status, TransactionStatus::Fraudulent);
    }
}
