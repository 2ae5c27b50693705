//! Transaction data structures for the risk-scoring pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Risk status of a transaction.
///
/// Assigned by the scoring pass and possibly corrected later by an
/// administrative override; the default applies until a transaction has
/// been scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    #[default]
    Legitimate,
    PossiblyFraudulent,
    Fraudulent,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Legitimate => "legitimate",
            TransactionStatus::PossiblyFraudulent => "possibly_fraudulent",
            TransactionStatus::Fraudulent => "fraudulent",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted monetary transaction.
///
/// `fraud_score` and `status` are set together by exactly one scoring pass.
/// An administrative correction may change `status` afterwards but never
/// touches `fraud_score`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction identifier, assigned at creation.
    pub id: Uuid,

    /// Identifier of the sending account.
    pub sender_id: String,

    /// Display name of the sender.
    pub sender_name: String,

    /// Display name of the receiver.
    pub receiver_name: String,

    /// Transferred amount, always positive.
    pub amount: f64,

    /// Optional free-form message attached by the sender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Creation timestamp (UTC), immutable.
    pub created_at: DateTime<Utc>,

    /// Model output in [0, 1]; `None` until the transaction has been scored.
    pub fraud_score: Option<f64>,

    /// Current risk status.
    pub status: TransactionStatus,
}

/// Intake payload for a new transaction submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub sender_id: String,
    pub sender_name: String,
    pub receiver_name: String,
    pub amount: f64,
    #[serde(default)]
    pub message: Option<String>,
    /// Optional client-supplied timestamp; intake fills in `now` if absent.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl TransactionRequest {
    pub fn new(sender_id: &str, sender_name: &str, receiver_name: &str, amount: f64) -> Self {
        Self {
            sender_id: sender_id.to_string(),
            sender_name: sender_name.to_string(),
            receiver_name: receiver_name.to_string(),
            amount,
            message: None,
            created_at: None,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

/// Request shape of the scoring boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRequest {
    pub transaction_id: Uuid,
    pub sender_id: String,
    pub amount: f64,
    pub created_at: Option<DateTime<Utc>>,
}

/// Aggregate history of a sender, as consumed by the feature extractor.
///
/// A sender with no prior transactions yields the zero summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SenderSummary {
    /// Average historical transaction amount.
    pub avg_amount: f64,
    /// Number of prior transactions.
    pub transaction_count: u64,
    /// Prior transactions per day of account activity.
    pub transaction_frequency: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serde_names() {
        assert_eq!(
            serde_json::to_string(&TransactionStatus::PossiblyFraudulent).unwrap(),
            "\"possibly_fraudulent\""
        );
        let status: TransactionStatus = serde_json::from_str("\"fraudulent\"").unwrap();
        assert_eq!(status, TransactionStatus::Fraudulent);
    }

    #[test]
    fn test_default_status_is_legitimate() {
        assert_eq!(TransactionStatus::default(), TransactionStatus::Legitimate);
    }

    #[test]
    fn test_transaction_serialization() {
        let tx = Transaction {
            id: Uuid::new_v4(),
            sender_id: "acct_42".to_string(),
            sender_name: "Alice".to_string(),
            receiver_name: "Bob".to_string(),
            amount: 125.5,
            message: None,
            created_at: Utc::now(),
            fraud_score: Some(0.12),
            status: TransactionStatus::Legitimate,
        };

        let json = serde_json::to_string(&tx).unwrap();
        let deserialized: Transaction = serde_json::from_str(&json).unwrap();

        assert_eq!(tx.id, deserialized.id);
        assert_eq!(tx.amount, deserialized.amount);
        assert_eq!(tx.fraud_score, deserialized.fraud_score);
        assert_eq!(tx.status, deserialized.status);
    }

    #[test]
    fn test_request_defaults() {
        let json = r#"{"sender_id":"a","sender_name":"A","receiver_name":"B","amount":10.0}"#;
        let request: TransactionRequest = serde_json::from_str(json).unwrap();
        assert!(request.message.is_none());
        assert!(request.created_at.is_none());
    }
}
