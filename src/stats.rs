//! Rolling daily aggregates that stay consistent under concurrent updates
//! and retroactive status corrections.
//!
//! Every mutation goes through `DailyStatStore::update_day`, a closed
//! read-modify-write on one day's record; the counter-sum invariant
//! (`legitimate + possibly_fraudulent + fraudulent == total`) therefore
//! holds at every observable point between operations.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::store::DailyStatStore;
use crate::types::stats::{DailyStat, PeriodStats};
use crate::types::transaction::{Transaction, TransactionStatus};

pub struct StatsAggregator {
    store: Arc<dyn DailyStatStore>,
}

impl StatsAggregator {
    pub fn new(store: Arc<dyn DailyStatStore>) -> Self {
        Self { store }
    }

    /// Fold a newly recorded transaction into its day's aggregates,
    /// creating the day on first touch.
    pub fn record(&self, transaction: &Transaction) -> Result<DailyStat> {
        let date = transaction.created_at.date_naive();
        let amount = transaction.amount;
        let status = transaction.status;

        let stat = self.store.update_day(date, &mut |stat| {
            stat.total_transactions += 1;
            stat.total_amount += amount;
            *stat.status_count_mut(status) += 1;
        })?;

        debug!(%date, %status, total = stat.total_transactions, "daily stats recorded");
        Ok(stat)
    }

    /// Re-bucket a transaction whose status was corrected after the fact.
    ///
    /// Totals are untouched: the transaction was already counted when it was
    /// recorded. A correction to the same status is a no-op.
    pub fn adjust(
        &self,
        transaction: &Transaction,
        previous_status: TransactionStatus,
    ) -> Result<DailyStat> {
        let date = transaction.created_at.date_naive();
        let new_status = transaction.status;

        if previous_status == new_status {
            return Ok(self
                .store
                .day(date)?
                .unwrap_or_else(|| DailyStat::new(date)));
        }

        let stat = self.store.update_day(date, &mut |stat| {
            let previous = stat.status_count_mut(previous_status);
            *previous = previous.saturating_sub(1);
            *stat.status_count_mut(new_status) += 1;
        })?;

        debug!(
            %date,
            from = %previous_status,
            to = %new_status,
            "daily stats adjusted"
        );
        Ok(stat)
    }

    /// Aggregate totals plus a zero-filled per-day count distribution over
    /// an inclusive date range.
    pub fn period_stats(&self, start: NaiveDate, end: NaiveDate) -> Result<PeriodStats> {
        let mut period = PeriodStats::empty();

        let mut day = start;
        while day <= end {
            period.daily_distribution.insert(day, 0);
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }

        for stat in self.store.range(start, end)? {
            period.total += stat.total_transactions;
            period.legitimate += stat.legitimate_count;
            period.possibly_fraudulent += stat.possibly_fraudulent_count;
            period.fraudulent += stat.fraudulent_count;
            period.total_amount += stat.total_amount;
            period
                .daily_distribution
                .insert(stat.date, stat.total_transactions);
        }

        Ok(period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryDailyStatStore;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn transaction(amount: f64, status: TransactionStatus, day: u32) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            sender_id: "acct_1".to_string(),
            sender_name: "Alice".to_string(),
            receiver_name: "Bob".to_string(),
            amount,
            message: None,
            created_at: Utc.with_ymd_and_hms(2025, 6, day, 10, 0, 0).unwrap(),
            fraud_score: None,
            status,
        }
    }

    fn aggregator() -> (StatsAggregator, Arc<InMemoryDailyStatStore>) {
        let store = Arc::new(InMemoryDailyStatStore::new());
        (StatsAggregator::new(store.clone()), store)
    }

    #[test]
    fn test_record_two_statuses_same_day() {
        let (aggregator, _) = aggregator();
        aggregator
            .record(&transaction(100.0, TransactionStatus::Fraudulent, 1))
            .unwrap();
        let stat = aggregator
            .record(&transaction(50.0, TransactionStatus::Legitimate, 1))
            .unwrap();

        assert_eq!(stat.total_transactions, 2);
        assert_eq!(stat.legitimate_count, 1);
        assert_eq!(stat.fraudulent_count, 1);
        assert_eq!(stat.possibly_fraudulent_count, 0);
        assert!((stat.total_amount - 150.0).abs() < 1e-9);
        assert!(stat.is_consistent());
    }

    #[test]
    fn test_adjust_rebuckets_without_touching_totals() {
        let (aggregator, _) = aggregator();
        let mut tx = transaction(100.0, TransactionStatus::Legitimate, 1);
        aggregator.record(&tx).unwrap();

        tx.status = TransactionStatus::Fraudulent;
        let stat = aggregator
            .adjust(&tx, TransactionStatus::Legitimate)
            .unwrap();

        assert_eq!(stat.total_transactions, 1);
        assert_eq!(stat.legitimate_count, 0);
        assert_eq!(stat.fraudulent_count, 1);
        assert!((stat.total_amount - 100.0).abs() < 1e-9);
        assert!(stat.is_consistent());
    }

    #[test]
    fn test_adjust_same_status_is_noop() {
        let (aggregator, store) = aggregator();
        let tx = transaction(100.0, TransactionStatus::Legitimate, 1);
        let before = aggregator.record(&tx).unwrap();

        let after = aggregator
            .adjust(&tx, TransactionStatus::Legitimate)
            .unwrap();
        assert_eq!(before, after);

        // A no-op adjustment must not create a day record either.
        let other_day = transaction(10.0, TransactionStatus::Legitimate, 2);
        aggregator
            .adjust(&other_day, TransactionStatus::Legitimate)
            .unwrap();
        assert!(store.day(other_day.created_at.date_naive()).unwrap().is_none());
    }

    #[test]
    fn test_adjust_floors_at_zero() {
        let (aggregator, _) = aggregator();
        // Adjustment without a prior record: the decremented counter floors
        // at zero instead of underflowing.
        let tx = transaction(100.0, TransactionStatus::Fraudulent, 1);
        let stat = aggregator
            .adjust(&tx, TransactionStatus::Legitimate)
            .unwrap();
        assert_eq!(stat.legitimate_count, 0);
        assert_eq!(stat.fraudulent_count, 1);
    }

    #[test]
    fn test_invariant_across_mixed_sequence() {
        let (aggregator, store) = aggregator();
        let statuses = [
            TransactionStatus::Legitimate,
            TransactionStatus::PossiblyFraudulent,
            TransactionStatus::Fraudulent,
        ];

        let mut recorded = Vec::new();
        for i in 0..30u32 {
            let tx = transaction(
                10.0 + i as f64,
                statuses[(i % 3) as usize],
                1 + (i % 3),
            );
            aggregator.record(&tx).unwrap();
            recorded.push(tx);
        }
        for (i, tx) in recorded.iter_mut().enumerate() {
            let previous = tx.status;
            tx.status = statuses[(i + 1) % 3];
            aggregator.adjust(tx, previous).unwrap();
        }

        for day in 1..=3u32 {
            let date = NaiveDate::from_ymd_opt(2025, 6, day).unwrap();
            let stat = store.day(date).unwrap().unwrap();
            assert!(stat.is_consistent(), "day {day} inconsistent: {stat:?}");
            assert_eq!(stat.total_transactions, 10);
        }
    }

    #[test]
    fn test_concurrent_same_day_records_lose_nothing() {
        let (aggregator, store) = aggregator();
        let aggregator = Arc::new(aggregator);

        let threads: Vec<_> = (0..8)
            .map(|worker| {
                let aggregator = aggregator.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        let status = if (worker + i) % 2 == 0 {
                            TransactionStatus::Legitimate
                        } else {
                            TransactionStatus::Fraudulent
                        };
                        aggregator.record(&transaction(1.0, status, 1)).unwrap();
                    }
                })
            })
            .collect();
        for handle in threads {
            handle.join().unwrap();
        }

        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let stat = store.day(date).unwrap().unwrap();
        assert_eq!(stat.total_transactions, 400);
        assert!((stat.total_amount - 400.0).abs() < 1e-9);
        assert!(stat.is_consistent());
    }

    #[test]
    fn test_period_stats_zero_fills_gaps() {
        let (aggregator, _) = aggregator();
        aggregator
            .record(&transaction(100.0, TransactionStatus::Legitimate, 1))
            .unwrap();
        aggregator
            .record(&transaction(200.0, TransactionStatus::Fraudulent, 3))
            .unwrap();

        let start = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();
        let period = aggregator.period_stats(start, end).unwrap();

        assert_eq!(period.total, 2);
        assert_eq!(period.legitimate, 1);
        assert_eq!(period.fraudulent, 1);
        assert!((period.total_amount - 300.0).abs() < 1e-9);

        assert_eq!(period.daily_distribution.len(), 3);
        let counts: Vec<u64> = period.daily_distribution.values().copied().collect();
        assert_eq!(counts, vec![1, 0, 1]);
    }

    #[test]
    fn test_period_stats_empty_range() {
        let (aggregator, _) = aggregator();
        let start = NaiveDate::from_ymd_opt(2025, 6, 5).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let period = aggregator.period_stats(start, end).unwrap();
        assert_eq!(period.total, 0);
        assert!(period.daily_distribution.is_empty());
    }
}
