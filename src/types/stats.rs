//! Daily aggregate statistics data structures

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::transaction::TransactionStatus;

/// Per-calendar-day aggregate of transaction counts and amounts.
///
/// Invariant: the three status counters sum to `total_transactions` after
/// every completed record or adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStat {
    pub date: NaiveDate,
    pub total_transactions: u64,
    pub legitimate_count: u64,
    pub possibly_fraudulent_count: u64,
    pub fraudulent_count: u64,
    pub total_amount: f64,
}

impl DailyStat {
    /// Zeroed record for a day, created lazily on first touch.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            total_transactions: 0,
            legitimate_count: 0,
            possibly_fraudulent_count: 0,
            fraudulent_count: 0,
            total_amount: 0.0,
        }
    }

    pub fn status_count(&self, status: TransactionStatus) -> u64 {
        match status {
            TransactionStatus::Legitimate => self.legitimate_count,
            TransactionStatus::PossiblyFraudulent => self.possibly_fraudulent_count,
            TransactionStatus::Fraudulent => self.fraudulent_count,
        }
    }

    pub fn status_count_mut(&mut self, status: TransactionStatus) -> &mut u64 {
        match status {
            TransactionStatus::Legitimate => &mut self.legitimate_count,
            TransactionStatus::PossiblyFraudulent => &mut self.possibly_fraudulent_count,
            TransactionStatus::Fraudulent => &mut self.fraudulent_count,
        }
    }

    /// Whether the status counters account for every recorded transaction.
    pub fn is_consistent(&self) -> bool {
        self.legitimate_count + self.possibly_fraudulent_count + self.fraudulent_count
            == self.total_transactions
    }
}

/// Aggregate totals and per-day counts for an inclusive date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodStats {
    pub total: u64,
    pub legitimate: u64,
    pub possibly_fraudulent: u64,
    pub fraudulent: u64,
    pub total_amount: f64,
    /// Transaction count per day, zero-filled across the range for charting.
    pub daily_distribution: BTreeMap<NaiveDate, u64>,
}

impl PeriodStats {
    pub fn empty() -> Self {
        Self {
            total: 0,
            legitimate: 0,
            possibly_fraudulent: 0,
            fraudulent: 0,
            total_amount: 0.0,
            daily_distribution: BTreeMap::new(),
        }
    }
}
