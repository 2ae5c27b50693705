//! Feature extraction for transaction risk scoring.
//!
//! The column order defined here is the binding contract between training
//! and inference: both sides build their rows from [`FEATURE_NAMES`], so a
//! mismatch cannot arise from two diverging lists.

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::types::transaction::SenderSummary;

/// Number of features produced per transaction.
pub const FEATURE_COUNT: usize = 8;

/// Ordered feature columns shared by training and inference.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "amount",
    "hour_of_day",
    "day_of_week",
    "is_weekend",
    "sender_avg_amount",
    "sender_transaction_count",
    "sender_transaction_frequency",
    "amount_deviation",
];

/// Hour assumed for transactions that carry no timestamp.
const DEFAULT_HOUR: f64 = 12.0;

/// Feature extractor that turns a transaction plus its sender history into
/// the fixed-order numeric vector the model consumes.
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the feature vector for one transaction.
    ///
    /// A missing timestamp falls back to midday on a Monday (hour 12,
    /// weekday 0) rather than a silent zero fill.
    pub fn extract(
        &self,
        amount: f64,
        created_at: Option<DateTime<Utc>>,
        sender: &SenderSummary,
    ) -> [f64; FEATURE_COUNT] {
        let (hour_of_day, day_of_week) = match created_at {
            Some(ts) => (
                ts.hour() as f64,
                ts.weekday().num_days_from_monday() as f64,
            ),
            None => (DEFAULT_HOUR, 0.0),
        };
        let is_weekend = if day_of_week >= 5.0 { 1.0 } else { 0.0 };

        [
            amount,
            hour_of_day,
            day_of_week,
            is_weekend,
            sender.avg_amount,
            sender.transaction_count as f64,
            sender.transaction_frequency,
            amount_deviation(amount, sender.avg_amount),
        ]
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        FEATURE_COUNT
    }

    /// Get the ordered feature names.
    pub fn feature_names(&self) -> Vec<&'static str> {
        FEATURE_NAMES.to_vec()
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Relative deviation of `amount` from the sender's historical average:
/// `(amount - avg) / max(avg, 1)`, or 0 for senders with no history.
pub fn amount_deviation(amount: f64, sender_avg: f64) -> f64 {
    if sender_avg > 0.0 {
        (amount - sender_avg) / sender_avg.max(1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sender(avg: f64, count: u64, freq: f64) -> SenderSummary {
        SenderSummary {
            avg_amount: avg,
            transaction_count: count,
            transaction_frequency: freq,
        }
    }

    #[test]
    fn test_feature_order_and_values() {
        let extractor = FeatureExtractor::new();
        // Tuesday 2025-03-04 at 14:00 UTC.
        let ts = Utc.with_ymd_and_hms(2025, 3, 4, 14, 0, 0).unwrap();
        let features = extractor.extract(50.0, Some(ts), &sender(45.0, 30, 1.2));

        assert_eq!(features.len(), extractor.feature_count());
        assert_eq!(features[0], 50.0); // amount
        assert_eq!(features[1], 14.0); // hour_of_day
        assert_eq!(features[2], 1.0); // day_of_week (Tue)
        assert_eq!(features[3], 0.0); // is_weekend
        assert_eq!(features[4], 45.0); // sender_avg_amount
        assert_eq!(features[5], 30.0); // sender_transaction_count
        assert_eq!(features[6], 1.2); // sender_transaction_frequency
        assert!((features[7] - (50.0 - 45.0) / 45.0).abs() < 1e-12);
    }

    #[test]
    fn test_weekend_flag() {
        let extractor = FeatureExtractor::new();
        // Saturday 2025-03-01.
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        let features = extractor.extract(20.0, Some(ts), &SenderSummary::default());
        assert_eq!(features[2], 5.0);
        assert_eq!(features[3], 1.0);
    }

    #[test]
    fn test_missing_timestamp_fallback() {
        let extractor = FeatureExtractor::new();
        let features = extractor.extract(20.0, None, &SenderSummary::default());
        assert_eq!(features[1], 12.0);
        assert_eq!(features[2], 0.0);
        assert_eq!(features[3], 0.0);
    }

    #[test]
    fn test_amount_deviation_no_history() {
        assert_eq!(amount_deviation(100.0, 0.0), 0.0);
        // Sub-unit averages are floored at 1 in the denominator.
        assert!((amount_deviation(2.0, 0.5) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_feature_names_match_count() {
        let extractor = FeatureExtractor::new();
        assert_eq!(extractor.feature_names().len(), FEATURE_COUNT);
        assert_eq!(FEATURE_NAMES[7], "amount_deviation");
    }
}
