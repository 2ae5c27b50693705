//! Storage boundary for transactions and daily aggregates.
//!
//! The datastore is an external collaborator: the pipeline only requires
//! atomic create/read/update of one Transaction record and one DailyStat
//! record. The in-memory implementations here serialize every mutation
//! behind one write lock, which is the atomicity unit the aggregation
//! invariant relies on.

use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::stats::DailyStat;
use crate::types::transaction::{
    SenderSummary, Transaction, TransactionRequest, TransactionStatus,
};

/// Persistence operations the pipeline needs for transactions.
pub trait TransactionStore: Send + Sync {
    /// Persist a new transaction with default status and no score.
    fn create(&self, request: &TransactionRequest) -> Result<Transaction>;

    fn get(&self, id: Uuid) -> Result<Option<Transaction>>;

    /// The single scoring pass: sets score and status together.
    fn apply_score(
        &self,
        id: Uuid,
        fraud_score: f64,
        status: TransactionStatus,
    ) -> Result<Transaction>;

    /// Administrative correction: changes status only, never the score.
    fn set_status(&self, id: Uuid, status: TransactionStatus) -> Result<Transaction>;

    /// Aggregate history of a sender's persisted transactions.
    fn sender_summary(&self, sender_id: &str) -> Result<SenderSummary>;

    fn count(&self) -> Result<usize>;
}

/// Persistence operations the aggregator needs for daily stats.
pub trait DailyStatStore: Send + Sync {
    /// Atomic read-modify-write of one day's record, created zeroed on
    /// first touch. All concurrent mutation for a date serializes here.
    fn update_day(
        &self,
        date: NaiveDate,
        mutate: &mut dyn FnMut(&mut DailyStat),
    ) -> Result<DailyStat>;

    fn day(&self, date: NaiveDate) -> Result<Option<DailyStat>>;

    /// Existing records in the inclusive date range, ordered by date.
    fn range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<DailyStat>>;
}

#[derive(Default)]
pub struct InMemoryTransactionStore {
    transactions: RwLock<HashMap<Uuid, Transaction>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(what: &str) -> Error {
    Error::Store(format!("{what} lock poisoned"))
}

impl TransactionStore for InMemoryTransactionStore {
    fn create(&self, request: &TransactionRequest) -> Result<Transaction> {
        let transaction = Transaction {
            id: Uuid::new_v4(),
            sender_id: request.sender_id.clone(),
            sender_name: request.sender_name.clone(),
            receiver_name: request.receiver_name.clone(),
            amount: request.amount,
            message: request.message.clone(),
            created_at: request.created_at.unwrap_or_else(Utc::now),
            fraud_score: None,
            status: TransactionStatus::default(),
        };

        let mut transactions = self
            .transactions
            .write()
            .map_err(|_| poisoned("transaction store"))?;
        transactions.insert(transaction.id, transaction.clone());
        Ok(transaction)
    }

    fn get(&self, id: Uuid) -> Result<Option<Transaction>> {
        let transactions = self
            .transactions
            .read()
            .map_err(|_| poisoned("transaction store"))?;
        Ok(transactions.get(&id).cloned())
    }

    fn apply_score(
        &self,
        id: Uuid,
        fraud_score: f64,
        status: TransactionStatus,
    ) -> Result<Transaction> {
        let mut transactions = self
            .transactions
            .write()
            .map_err(|_| poisoned("transaction store"))?;
        let transaction = transactions
            .get_mut(&id)
            .ok_or(Error::TransactionNotFound(id))?;
        transaction.fraud_score = Some(fraud_score);
        transaction.status = status;
        Ok(transaction.clone())
    }

    fn set_status(&self, id: Uuid, status: TransactionStatus) -> Result<Transaction> {
        let mut transactions = self
            .transactions
            .write()
            .map_err(|_| poisoned("transaction store"))?;
        let transaction = transactions
            .get_mut(&id)
            .ok_or(Error::TransactionNotFound(id))?;
        transaction.status = status;
        Ok(transaction.clone())
    }

    fn sender_summary(&self, sender_id: &str) -> Result<SenderSummary> {
        let transactions = self
            .transactions
            .read()
            .map_err(|_| poisoned("transaction store"))?;

        let mut count = 0u64;
        let mut total = 0.0;
        let mut earliest = None;
        for transaction in transactions.values() {
            if transaction.sender_id == sender_id {
                count += 1;
                total += transaction.amount;
                earliest = match earliest {
                    Some(ts) if ts < transaction.created_at => Some(ts),
                    _ => Some(transaction.created_at),
                };
            }
        }

        if count == 0 {
            return Ok(SenderSummary::default());
        }

        let days_active = earliest
            .map(|ts| (Utc::now() - ts).num_days().max(1))
            .unwrap_or(1) as f64;

        Ok(SenderSummary {
            avg_amount: total / count as f64,
            transaction_count: count,
            transaction_frequency: count as f64 / days_active,
        })
    }

    fn count(&self) -> Result<usize> {
        let transactions = self
            .transactions
            .read()
            .map_err(|_| poisoned("transaction store"))?;
        Ok(transactions.len())
    }
}

#[derive(Default)]
pub struct InMemoryDailyStatStore {
    days: RwLock<HashMap<NaiveDate, DailyStat>>,
}

impl InMemoryDailyStatStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DailyStatStore for InMemoryDailyStatStore {
    fn update_day(
        &self,
        date: NaiveDate,
        mutate: &mut dyn FnMut(&mut DailyStat),
    ) -> Result<DailyStat> {
        let mut days = self.days.write().map_err(|_| poisoned("daily stat store"))?;
        let stat = days.entry(date).or_insert_with(|| DailyStat::new(date));
        mutate(stat);
        Ok(stat.clone())
    }

    fn day(&self, date: NaiveDate) -> Result<Option<DailyStat>> {
        let days = self.days.read().map_err(|_| poisoned("daily stat store"))?;
        Ok(days.get(&date).cloned())
    }

    fn range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<DailyStat>> {
        let days = self.days.read().map_err(|_| poisoned("daily stat store"))?;
        let mut stats: Vec<DailyStat> = days
            .values()
            .filter(|stat| stat.date >= start && stat.date <= end)
            .cloned()
            .collect();
        stats.sort_by_key(|stat| stat.date);
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn request(sender_id: &str, amount: f64) -> TransactionRequest {
        TransactionRequest::new(sender_id, "Alice", "Bob", amount)
    }

    #[test]
    fn test_create_and_get() {
        let store = InMemoryTransactionStore::new();
        let created = store.create(&request("acct_1", 50.0)).unwrap();

        assert_eq!(created.status, TransactionStatus::Legitimate);
        assert!(created.fraud_score.is_none());

        let fetched = store.get(created.id).unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_apply_score_sets_both_fields() {
        let store = InMemoryTransactionStore::new();
        let created = store.create(&request("acct_1", 50.0)).unwrap();
        let scored = store
            .apply_score(created.id, 0.82, TransactionStatus::Fraudulent)
            .unwrap();
        assert_eq!(scored.fraud_score, Some(0.82));
        assert_eq!(scored.status, TransactionStatus::Fraudulent);
    }

    #[test]
    fn test_set_status_preserves_score() {
        let store = InMemoryTransactionStore::new();
        let created = store.create(&request("acct_1", 50.0)).unwrap();
        store
            .apply_score(created.id, 0.2, TransactionStatus::Legitimate)
            .unwrap();

        let corrected = store
            .set_status(created.id, TransactionStatus::Fraudulent)
            .unwrap();
        assert_eq!(corrected.status, TransactionStatus::Fraudulent);
        assert_eq!(corrected.fraud_score, Some(0.2));
    }

    #[test]
    fn test_unknown_transaction() {
        let store = InMemoryTransactionStore::new();
        let err = store
            .set_status(Uuid::new_v4(), TransactionStatus::Fraudulent)
            .unwrap_err();
        assert!(matches!(err, Error::TransactionNotFound(_)));
    }

    #[test]
    fn test_sender_summary() {
        let store = InMemoryTransactionStore::new();
        let ten_days_ago = Utc::now() - Duration::days(10);
        store
            .create(&request("acct_1", 40.0).with_created_at(ten_days_ago))
            .unwrap();
        store.create(&request("acct_1", 60.0)).unwrap();
        store.create(&request("acct_2", 500.0)).unwrap();

        let summary = store.sender_summary("acct_1").unwrap();
        assert_eq!(summary.transaction_count, 2);
        assert!((summary.avg_amount - 50.0).abs() < 1e-9);
        assert!((summary.transaction_frequency - 0.2).abs() < 0.05);

        assert_eq!(store.sender_summary("acct_none").unwrap(), SenderSummary::default());
    }

    #[test]
    fn test_update_day_creates_lazily() {
        let store = InMemoryDailyStatStore::new();
        let date = Utc
            .with_ymd_and_hms(2025, 6, 1, 0, 0, 0)
            .unwrap()
            .date_naive();

        assert!(store.day(date).unwrap().is_none());
        let stat = store
            .update_day(date, &mut |stat| {
                stat.total_transactions += 1;
                stat.legitimate_count += 1;
            })
            .unwrap();
        assert_eq!(stat.total_transactions, 1);
        assert_eq!(store.day(date).unwrap().unwrap(), stat);
    }

    #[test]
    fn test_range_is_inclusive_and_ordered() {
        let store = InMemoryDailyStatStore::new();
        for day in [3, 1, 2, 7] {
            let date = NaiveDate::from_ymd_opt(2025, 6, day).unwrap();
            store
                .update_day(date, &mut |stat| stat.total_transactions += 1)
                .unwrap();
        }

        let stats = store
            .range(
                NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 6, 3).unwrap(),
            )
            .unwrap();
        let dates: Vec<u32> = stats.iter().map(|s| {
            use chrono::Datelike;
            s.date.day()
        }).collect();
        assert_eq!(dates, vec![1, 2, 3]);
    }
}
