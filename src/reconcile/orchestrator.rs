//! The reconciliation workflow: automatic matching and the manual review
//! actions on a single bank transaction.
//!
//! Every state change is a compare-and-swap on the transaction's status and
//! link, run inside [ReconciliationStore::atomically]. Repeating an action
//! that has already taken effect succeeds without writing anything.

use serde::Serialize;

use crate::{
    Error,
    bank_transaction::{BankTransaction, BankTransactionStatus, LinkState},
    database_id::{BankTransactionId, LedgerEntryId, VenueId},
    date_range::DateRange,
    reconcile::{
        matcher::{
            PendingReason, ReconciliationConfig, ScoredCandidate, find_candidates,
            pick_auto_match,
        },
        store::ReconciliationStore,
    },
    user::Actor,
};

/// What happened to one bank transaction during [auto_reconcile].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(
    tag = "outcome",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum TransactionOutcome {
    /// The transaction was linked to its best candidate.
    Matched {
        /// The transaction that was matched.
        bank_transaction_id: BankTransactionId,
        /// The entry it is now linked to.
        ledger_entry_id: LedgerEntryId,
        /// The score of the winning candidate.
        score: f64,
    },
    /// The transaction was left for manual review.
    Pending {
        /// The transaction that was left PENDING.
        bank_transaction_id: BankTransactionId,
        /// Why no candidate was picked.
        reason: PendingReason,
        /// How many candidates were found.
        candidates: usize,
    },
    /// Writing the match failed. Other transactions are unaffected.
    Failed {
        /// The transaction that could not be processed.
        bank_transaction_id: BankTransactionId,
        /// The error message.
        error: String,
    },
}

/// The summary of an [auto_reconcile] run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationReport {
    /// Number of PENDING transactions in the date range.
    pub examined: usize,
    /// Number of transactions that were matched.
    pub matched: usize,
    /// Number of transactions left PENDING for manual review.
    pub pending: usize,
    /// Number of transactions whose match could not be written.
    pub failed: usize,
    /// One outcome per examined transaction, in the order they were examined.
    pub outcomes: Vec<TransactionOutcome>,
}

impl ReconciliationReport {
    fn new() -> Self {
        Self {
            examined: 0,
            matched: 0,
            pending: 0,
            failed: 0,
            outcomes: Vec::new(),
        }
    }

    fn record(&mut self, outcome: TransactionOutcome) {
        self.examined += 1;
        match outcome {
            TransactionOutcome::Matched { .. } => self.matched += 1,
            TransactionOutcome::Pending { .. } => self.pending += 1,
            TransactionOutcome::Failed { .. } => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }
}

/// Try to match every PENDING bank transaction of `venue_id` dated within
/// `date_range` to a ledger entry.
///
/// Transactions are processed oldest first. A transaction is matched only
/// when exactly one candidate has the best score and that score exceeds the
/// auto-match threshold. Matches are written as MATCHED, never CONFIRMED, and
/// an entry that has been matched is not offered to later transactions.
///
/// Each match is written in its own atomic unit, so a failure is recorded in
/// the report and the run carries on.
///
/// # Errors
/// Returns an [Error::Validation] if the range ends before it starts, or the
/// store's error if loading the transactions or entries fails.
pub fn auto_reconcile<S: ReconciliationStore>(
    store: &S,
    venue_id: VenueId,
    date_range: &DateRange,
    config: &ReconciliationConfig,
) -> Result<ReconciliationReport, Error> {
    if date_range.is_empty() {
        return Err(Error::Validation(
            "dateFrom must not be after dateTo".to_owned(),
        ));
    }

    let transactions = store.pending_transactions(venue_id, date_range)?;
    let mut pool = store.unmatched_entries(venue_id, &date_range.widen(config.date_window_days))?;
    let mut report = ReconciliationReport::new();

    for transaction in &transactions {
        let candidates = find_candidates(transaction, &pool, config);

        let best = match pick_auto_match(&candidates, config.auto_match_threshold) {
            Ok(best) => best,
            Err(reason) => {
                report.record(TransactionOutcome::Pending {
                    bank_transaction_id: transaction.id,
                    reason,
                    candidates: candidates.len(),
                });
                continue;
            }
        };

        let ledger_entry_id = best.ledger_entry.id;
        let result = store.atomically(|store| {
            ensure_entry_is_free(store, ledger_entry_id, transaction.id)?;
            store.compare_and_set_link_state(
                transaction.id,
                LinkState::PENDING,
                LinkState::matched(ledger_entry_id),
                None,
            )
        });

        match result {
            Ok(()) => {
                report.record(TransactionOutcome::Matched {
                    bank_transaction_id: transaction.id,
                    ledger_entry_id,
                    score: best.score,
                });
                pool.retain(|entry| entry.id != ledger_entry_id);
            }
            Err(error) => report.record(TransactionOutcome::Failed {
                bank_transaction_id: transaction.id,
                error: error.to_string(),
            }),
        }
    }

    Ok(report)
}

/// Accept the suggested match of a MATCHED transaction and mark its ledger
/// entry as verified.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the transaction is not in the actor's venue,
/// - [Error::InvalidState] if the transaction is PENDING or IGNORED,
/// - [Error::Conflict] if another MATCHED or CONFIRMED transaction links to
///   the same entry,
/// - [Error::ConcurrentModification] if the transaction changed meanwhile,
/// - or the store's error if there is some other failure.
pub fn confirm_match<S: ReconciliationStore>(
    store: &S,
    actor: &Actor,
    transaction_id: BankTransactionId,
) -> Result<BankTransaction, Error> {
    store.atomically(|store| {
        let transaction = get_transaction_in_venue(store, transaction_id, actor.venue_id)?;

        let ledger_entry_id = match (transaction.status, transaction.ledger_entry_id) {
            (BankTransactionStatus::Confirmed, _) => return Ok(transaction),
            (BankTransactionStatus::Matched, Some(ledger_entry_id)) => ledger_entry_id,
            (status, _) => {
                return Err(Error::InvalidState {
                    action: "confirm",
                    status,
                });
            }
        };

        ensure_entry_is_free(store, ledger_entry_id, transaction.id)?;
        store.compare_and_set_link_state(
            transaction.id,
            transaction.link_state(),
            LinkState::confirmed(ledger_entry_id),
            Some(actor.user_id),
        )?;
        store.mark_entry_verified(ledger_entry_id)?;

        store.get_bank_transaction(transaction.id)
    })
}

/// Link a transaction to a ledger entry chosen by the actor, replacing any
/// unconfirmed match.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the transaction or the entry is not in the actor's
///   venue,
/// - [Error::Validation] if the entry is hidden,
/// - [Error::InvalidState] if the transaction is CONFIRMED or IGNORED,
/// - [Error::Conflict] if another MATCHED or CONFIRMED transaction links to
///   the entry,
/// - [Error::ConcurrentModification] if the transaction changed meanwhile,
/// - or the store's error if there is some other failure.
pub fn manual_match<S: ReconciliationStore>(
    store: &S,
    actor: &Actor,
    transaction_id: BankTransactionId,
    ledger_entry_id: LedgerEntryId,
) -> Result<BankTransaction, Error> {
    store.atomically(|store| {
        let transaction = get_transaction_in_venue(store, transaction_id, actor.venue_id)?;

        let entry = store.get_ledger_entry(ledger_entry_id)?;
        if entry.venue_id != actor.venue_id {
            return Err(Error::NotFound);
        }
        if entry.is_hidden() {
            return Err(Error::Validation(format!(
                "ledger entry {ledger_entry_id} is hidden"
            )));
        }

        match transaction.status {
            BankTransactionStatus::Confirmed | BankTransactionStatus::Ignored => {
                return Err(Error::InvalidState {
                    action: "match",
                    status: transaction.status,
                });
            }
            BankTransactionStatus::Matched
                if transaction.ledger_entry_id == Some(ledger_entry_id) =>
            {
                return Ok(transaction);
            }
            BankTransactionStatus::Matched | BankTransactionStatus::Pending => {}
        }

        ensure_entry_is_free(store, ledger_entry_id, transaction.id)?;
        store.compare_and_set_link_state(
            transaction.id,
            transaction.link_state(),
            LinkState::matched(ledger_entry_id),
            Some(actor.user_id),
        )?;

        store.get_bank_transaction(transaction.id)
    })
}

/// Clear the link of a MATCHED or CONFIRMED transaction, returning it to
/// PENDING.
///
/// The ledger entry keeps its `verified` flag.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the transaction is not in the actor's venue,
/// - [Error::InvalidState] if the transaction is IGNORED,
/// - [Error::ConcurrentModification] if the transaction changed meanwhile,
/// - or the store's error if there is some other failure.
pub fn unmatch<S: ReconciliationStore>(
    store: &S,
    actor: &Actor,
    transaction_id: BankTransactionId,
) -> Result<BankTransaction, Error> {
    store.atomically(|store| {
        let transaction = get_transaction_in_venue(store, transaction_id, actor.venue_id)?;

        match transaction.status {
            BankTransactionStatus::Pending => return Ok(transaction),
            BankTransactionStatus::Ignored => {
                return Err(Error::InvalidState {
                    action: "unmatch",
                    status: transaction.status,
                });
            }
            BankTransactionStatus::Matched | BankTransactionStatus::Confirmed => {}
        }

        store.compare_and_set_link_state(
            transaction.id,
            transaction.link_state(),
            LinkState::PENDING,
            Some(actor.user_id),
        )?;

        store.get_bank_transaction(transaction.id)
    })
}

/// Exclude a transaction from reconciliation, clearing any unconfirmed
/// match.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the transaction is not in the actor's venue,
/// - [Error::InvalidState] if the transaction is CONFIRMED,
/// - [Error::ConcurrentModification] if the transaction changed meanwhile,
/// - or the store's error if there is some other failure.
pub fn ignore_transaction<S: ReconciliationStore>(
    store: &S,
    actor: &Actor,
    transaction_id: BankTransactionId,
) -> Result<BankTransaction, Error> {
    store.atomically(|store| {
        let transaction = get_transaction_in_venue(store, transaction_id, actor.venue_id)?;

        match transaction.status {
            BankTransactionStatus::Ignored => return Ok(transaction),
            BankTransactionStatus::Confirmed => {
                return Err(Error::InvalidState {
                    action: "ignore",
                    status: transaction.status,
                });
            }
            BankTransactionStatus::Pending | BankTransactionStatus::Matched => {}
        }

        store.compare_and_set_link_state(
            transaction.id,
            transaction.link_state(),
            LinkState::IGNORED,
            Some(actor.user_id),
        )?;

        store.get_bank_transaction(transaction.id)
    })
}

/// The unmatched ledger entries that could be linked to a transaction, best
/// first. Nothing is written.
///
/// # Errors
/// Returns an [Error::NotFound] if the transaction is not in the actor's
/// venue, or the store's error if loading fails.
pub fn candidates<S: ReconciliationStore>(
    store: &S,
    actor: &Actor,
    transaction_id: BankTransactionId,
    config: &ReconciliationConfig,
) -> Result<Vec<ScoredCandidate>, Error> {
    let transaction = get_transaction_in_venue(store, transaction_id, actor.venue_id)?;
    let window = DateRange::new(Some(transaction.date), Some(transaction.date))
        .widen(config.date_window_days);
    let pool = store.unmatched_entries(actor.venue_id, &window)?;

    Ok(find_candidates(&transaction, &pool, config))
}

fn get_transaction_in_venue<S: ReconciliationStore>(
    store: &S,
    transaction_id: BankTransactionId,
    venue_id: VenueId,
) -> Result<BankTransaction, Error> {
    let transaction = store.get_bank_transaction(transaction_id)?;

    if transaction.venue_id != venue_id {
        return Err(Error::NotFound);
    }

    Ok(transaction)
}

fn ensure_entry_is_free<S: ReconciliationStore>(
    store: &S,
    ledger_entry_id: LedgerEntryId,
    transaction_id: BankTransactionId,
) -> Result<(), Error> {
    match store.find_active_link(ledger_entry_id, transaction_id)? {
        Some(_) => Err(Error::Conflict(ledger_entry_id)),
        None => Ok(()),
    }
}
