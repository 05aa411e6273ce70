//! Riconcilia is the bank reconciliation service of a hospitality venue's
//! back office.
//!
//! It matches the lines of a venue's bank statement to the entries in its
//! ledger, lets staff review and confirm those matches, and files ledger
//! entries under budget categories using keyword rules.
//!
//! This library provides a JSON REST API. Callers are authenticated upstream
//! and identified by the [USER_ID_HEADER] header.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
mod bank_transaction;
mod category;
mod database_id;
mod date_range;
mod db;
mod endpoints;
mod error;
mod ledger;
mod money;
mod reconcile;
mod routing;
mod rule;
mod user;
mod venue;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use bank_transaction::{
    BankTransaction, BankTransactionBuilder, BankTransactionStatus, LinkState,
    create_bank_transaction, get_bank_transaction,
};
pub use category::{Category, create_category};
pub use database_id::{
    BankTransactionId, CategoryId, DatabaseId, LedgerEntryId, RuleId, UserId, VenueId,
};
pub use date_range::DateRange;
pub use db::initialize as initialize_db;
pub use error::Error;
pub use ledger::{
    LedgerAmount, LedgerEntry, LedgerEntryBuilder, create_ledger_entry, get_ledger_entry,
};
pub use money::Direction;
pub use reconcile::{
    PendingReason, ReconciliationConfig, ReconciliationReport, ReconciliationStore,
    ScoredCandidate, SqliteStore, TransactionOutcome, auto_reconcile, candidates, confirm_match,
    find_candidates, ignore_transaction, manual_match, pick_auto_match, unmatch,
};
pub use routing::build_router;
pub use rule::{
    CategorizationResult, CategorizationRule, RuleDefinition, RuleMatch, RuleSubject,
    apply_rules_to_ledger, create_rule, delete_rule, evaluate, get_rule, get_rules, update_rule,
};
pub use user::{Actor, USER_ID_HEADER, User, create_user};
pub use venue::{Venue, create_venue, get_venue};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
