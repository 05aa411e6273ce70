//! Scores ledger entries as candidate matches for a bank transaction.
//!
//! Everything here is pure: callers load the pool of entries and decide what
//! to do with the ranking.

use std::cmp::{Ordering, Reverse};

use serde::Serialize;

use crate::{
    bank_transaction::BankTransaction,
    ledger::LedgerEntry,
    money::to_minor_units,
};

/// Tuning knobs for matching bank transactions to ledger entries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconciliationConfig {
    /// Entries dated further than this many days from the transaction are
    /// not candidates.
    pub date_window_days: i64,
    /// A top candidate must score strictly above this to be matched
    /// automatically.
    pub auto_match_threshold: f64,
    /// The largest difference, in cents, at which amounts still count as
    /// equal.
    pub amount_tolerance: i64,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            date_window_days: 7,
            auto_match_threshold: 0.5,
            amount_tolerance: 0,
        }
    }
}

/// A ledger entry that could be the other side of a bank transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCandidate {
    /// The candidate entry.
    pub ledger_entry: LedgerEntry,
    /// In `[0, 1]`, higher is better.
    pub score: f64,
    /// Absolute difference between the entry date and the transaction date.
    pub days_apart: i64,
}

/// Why the matcher could not pick a single entry for automatic matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PendingReason {
    /// No entry has the right amount within the date window.
    NoCandidate,
    /// The best score does not exceed the auto-match threshold.
    BelowThreshold,
    /// Two or more entries share the best score.
    Ambiguous,
}

/// The date-proximity score of an entry `days_apart` days from the
/// transaction: 1 on the same day, falling linearly to 0 at the edge of the
/// window.
pub fn score(days_apart: i64, date_window_days: i64) -> f64 {
    let days_apart = days_apart.abs();

    if date_window_days <= 0 {
        return if days_apart == 0 { 1.0 } else { 0.0 };
    }

    (1.0 - days_apart as f64 / date_window_days as f64).max(0.0)
}

/// Rank the entries of `pool` that could match `transaction`, best first.
///
/// An entry is a candidate when it belongs to the transaction's venue, is
/// not hidden, has the same signed amount in cents (within the configured
/// tolerance) and is dated within the window. Descriptions play no part.
///
/// Ties on score go to the entry closest in time, then the most recently
/// created one, then the highest ID.
pub fn find_candidates(
    transaction: &BankTransaction,
    pool: &[LedgerEntry],
    config: &ReconciliationConfig,
) -> Vec<ScoredCandidate> {
    let transaction_cents = to_minor_units(transaction.amount);
    let window = config.date_window_days.max(0);

    let mut candidates: Vec<ScoredCandidate> = pool
        .iter()
        .filter(|entry| entry.venue_id == transaction.venue_id && !entry.is_hidden())
        .filter(|entry| {
            to_minor_units(entry.amount.signed()).abs_diff(transaction_cents)
                <= config.amount_tolerance.max(0).unsigned_abs()
        })
        .filter_map(|entry| {
            let days_apart = (entry.date - transaction.date).whole_days().abs();

            (days_apart <= window).then(|| ScoredCandidate {
                ledger_entry: entry.clone(),
                score: score(days_apart, window),
                days_apart,
            })
        })
        .collect();

    candidates.sort_by(rank);

    candidates
}

fn rank(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.score.total_cmp(&a.score).then_with(|| {
        let key = |candidate: &ScoredCandidate| {
            (
                candidate.days_apart,
                Reverse(candidate.ledger_entry.created_at),
                Reverse(candidate.ledger_entry.id),
            )
        };
        key(a).cmp(&key(b))
    })
}

/// Pick the candidate to match automatically from a ranking produced by
/// [find_candidates].
///
/// The top candidate is picked only if it scores strictly above `threshold`
/// and no other candidate has the same score.
pub fn pick_auto_match(
    candidates: &[ScoredCandidate],
    threshold: f64,
) -> Result<&ScoredCandidate, PendingReason> {
    let Some(best) = candidates.first() else {
        return Err(PendingReason::NoCandidate);
    };

    if best.score <= threshold {
        return Err(PendingReason::BelowThreshold);
    }

    match candidates.get(1) {
        Some(runner_up) if runner_up.score == best.score => Err(PendingReason::Ambiguous),
        _ => Ok(best),
    }
}
