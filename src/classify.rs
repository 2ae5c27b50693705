//! Mapping from fraud scores to risk statuses.
//!
//! The thresholds are fixed constants rather than learned or configured
//! values, so boundary behavior can be asserted exactly.

use crate::types::transaction::TransactionStatus;

/// Scores at or above this are `Fraudulent`.
///
/// Coincides numerically with the scorer's internal fraud flag
/// ([`crate::models::scorer::MODEL_FRAUD_THRESHOLD`]) but is a separate
/// constant: moving one must not silently move the other.
pub const FRAUDULENT_THRESHOLD: f64 = 0.7;

/// Scores in `[POSSIBLY_FRAUDULENT_THRESHOLD, FRAUDULENT_THRESHOLD)` are
/// `PossiblyFraudulent`.
pub const POSSIBLY_FRAUDULENT_THRESHOLD: f64 = 0.4;

/// Map a fraud score to its risk status. Both lower bounds are inclusive.
pub fn status_for_score(score: f64) -> TransactionStatus {
    if score >= FRAUDULENT_THRESHOLD {
        TransactionStatus::Fraudulent
    } else if score >= POSSIBLY_FRAUDULENT_THRESHOLD {
        TransactionStatus::PossiblyFraudulent
    } else {
        TransactionStatus::Legitimate
    }
}
