//! Type definitions for the risk-scoring pipeline

pub mod alert;
pub mod stats;
pub mod transaction;

pub use alert::FraudAlert;
pub use stats::{DailyStat, PeriodStats};
pub use transaction::{
    ScoreRequest, SenderSummary, Transaction, TransactionRequest, TransactionStatus,
};
