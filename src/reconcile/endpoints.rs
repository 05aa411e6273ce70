//! JSON route handlers for reconciliation.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use axum_extra::extract::WithRejection;
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    AppState, Error,
    database_id::{BankTransactionId, LedgerEntryId},
    date_range::DateRange,
    error::log_unexpected,
    reconcile::{
        matcher::{ReconciliationConfig, ScoredCandidate},
        orchestrator::{
            ReconciliationReport, auto_reconcile, candidates, confirm_match, ignore_transaction,
            manual_match, unmatch,
        },
        store::SqliteStore,
    },
    user::Actor,
};

/// The state needed by the reconciliation route handlers.
#[derive(Debug, Clone)]
pub struct ReconciliationState {
    /// The database connection for reading and writing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The matching parameters.
    pub config: ReconciliationConfig,
}

impl FromRef<AppState> for ReconciliationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            config: state.reconciliation_config,
        }
    }
}

/// The body of a manual match request.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualMatchRequest {
    /// The ledger (journal) entry to link the transaction to.
    pub journal_entry_id: LedgerEntryId,
}

/// Route handler for running automatic reconciliation over a date range.
///
/// A request without a body covers every date.
pub async fn reconcile_endpoint(
    State(state): State<ReconciliationState>,
    actor: Actor,
    WithRejection(body, _): WithRejection<Option<Json<DateRange>>, Error>,
) -> Result<Json<ReconciliationReport>, Error> {
    let date_range = body.map(|Json(date_range)| date_range).unwrap_or_default();

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let report = auto_reconcile(
        &SqliteStore::new(&connection),
        actor.venue_id,
        &date_range,
        &state.config,
    )
    .inspect_err(|error| log_unexpected("running reconciliation", error))?;

    tracing::info!(
        "Reconciliation for venue {}: examined {}, matched {}, pending {}, failed {}",
        actor.venue_id,
        report.examined,
        report.matched,
        report.pending,
        report.failed
    );

    if report.failed > 0 {
        tracing::warn!(
            "{} bank transaction(s) could not be matched for venue {}",
            report.failed,
            actor.venue_id
        );
    }

    Ok(Json(report))
}

/// Route handler for confirming the match of a bank transaction.
pub async fn confirm_match_endpoint(
    WithRejection(Path(transaction_id), _): WithRejection<Path<BankTransactionId>, Error>,
    State(state): State<ReconciliationState>,
    actor: Actor,
) -> Result<Json<Value>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    confirm_match(&SqliteStore::new(&connection), &actor, transaction_id)
        .inspect_err(|error| log_unexpected("confirming a match", error))?;

    tracing::info!("User {} confirmed bank transaction {transaction_id}", actor.user_id);

    Ok(Json(json!({ "success": true })))
}

/// Route handler for ignoring a bank transaction.
pub async fn ignore_transaction_endpoint(
    WithRejection(Path(transaction_id), _): WithRejection<Path<BankTransactionId>, Error>,
    State(state): State<ReconciliationState>,
    actor: Actor,
) -> Result<Json<Value>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    ignore_transaction(&SqliteStore::new(&connection), &actor, transaction_id)
        .inspect_err(|error| log_unexpected("ignoring a transaction", error))?;

    tracing::info!("User {} ignored bank transaction {transaction_id}", actor.user_id);

    Ok(Json(json!({ "success": true })))
}

/// Route handler for clearing the link of a bank transaction.
pub async fn unmatch_endpoint(
    WithRejection(Path(transaction_id), _): WithRejection<Path<BankTransactionId>, Error>,
    State(state): State<ReconciliationState>,
    actor: Actor,
) -> Result<Json<Value>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    unmatch(&SqliteStore::new(&connection), &actor, transaction_id)
        .inspect_err(|error| log_unexpected("unmatching a transaction", error))?;

    tracing::info!("User {} unmatched bank transaction {transaction_id}", actor.user_id);

    Ok(Json(json!({ "success": true })))
}

/// Route handler for linking a bank transaction to a ledger entry by hand.
pub async fn manual_match_endpoint(
    WithRejection(Path(transaction_id), _): WithRejection<Path<BankTransactionId>, Error>,
    State(state): State<ReconciliationState>,
    actor: Actor,
    WithRejection(Json(request), _): WithRejection<Json<ManualMatchRequest>, Error>,
) -> Result<Json<Value>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    manual_match(
        &SqliteStore::new(&connection),
        &actor,
        transaction_id,
        request.journal_entry_id,
    )
    .inspect_err(|error| log_unexpected("matching a transaction", error))?;

    tracing::info!(
        "User {} matched bank transaction {transaction_id} to ledger entry {}",
        actor.user_id,
        request.journal_entry_id
    );

    Ok(Json(json!({ "success": true })))
}

/// Route handler listing the ledger entries that could match a bank
/// transaction, best first.
pub async fn get_candidates_endpoint(
    WithRejection(Path(transaction_id), _): WithRejection<Path<BankTransactionId>, Error>,
    State(state): State<ReconciliationState>,
    actor: Actor,
) -> Result<Json<Vec<ScoredCandidate>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let candidates = candidates(
        &SqliteStore::new(&connection),
        &actor,
        transaction_id,
        &state.config,
    )
    .inspect_err(|error| log_unexpected("listing match candidates", error))?;

    Ok(Json(candidates))
}
