//! Matching bank transactions to ledger entries.
//!
//! The matcher ranks candidate entries, the orchestrator runs the workflow on
//! top of a [ReconciliationStore] and the route handlers expose it over HTTP.

mod endpoints;
mod matcher;
mod orchestrator;
mod store;

pub use endpoints::{
    ManualMatchRequest, ReconciliationState, confirm_match_endpoint, get_candidates_endpoint,
    ignore_transaction_endpoint, manual_match_endpoint, reconcile_endpoint, unmatch_endpoint,
};
pub use matcher::{
    PendingReason, ReconciliationConfig, ScoredCandidate, find_candidates, pick_auto_match, score,
};
pub use orchestrator::{
    ReconciliationReport, TransactionOutcome, auto_reconcile, candidates, confirm_match,
    ignore_transaction, manual_match, unmatch,
};
pub use store::{ReconciliationStore, SqliteStore};
