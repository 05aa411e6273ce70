use axum::{Json, extract::State};
use rusqlite::Connection;
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::VenueId,
    error::log_unexpected,
    ledger::{get_uncategorized_ledger_entries, set_ledger_entry_categorization},
    rule::{
        db::get_rules,
        engine::{RuleSubject, evaluate},
        models::RuleState,
    },
    user::Actor,
};

/// Route handler for applying the venue's rules to its uncategorized ledger
/// entries.
pub async fn apply_rules_endpoint(
    State(state): State<RuleState>,
    actor: Actor,
) -> Result<Json<CategorizationResult>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let result = apply_rules_to_ledger(actor.venue_id, &connection)
        .inspect_err(|error| log_unexpected("applying categorization rules", error))?;

    tracing::info!(
        "Categorized {} of {} ledger entries for venue {}",
        result.entries_categorized,
        result.entries_examined,
        actor.venue_id
    );

    Ok(Json(result))
}

/// Result of applying categorization rules to a venue's ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorizationResult {
    /// Number of uncategorized entries the rules were evaluated against.
    pub entries_examined: usize,
    /// Number of entries a rule filed under a category.
    pub entries_categorized: usize,
    /// Number of categorized entries that were also marked verified.
    pub entries_verified: usize,
    /// Number of categorized entries that were also hidden.
    pub entries_hidden: usize,
}

impl CategorizationResult {
    /// Creates a new empty result with nothing examined or categorized.
    pub fn empty() -> Self {
        Self {
            entries_examined: 0,
            entries_categorized: 0,
            entries_verified: 0,
            entries_hidden: 0,
        }
    }
}

/// Apply the rules of `venue_id` to each of its visible, uncategorized
/// ledger entries.
///
/// All writes happen in a single database transaction: either every
/// matching entry is categorized or none is.
///
/// # Errors
/// Returns an error if there are database errors during the operation.
pub fn apply_rules_to_ledger(
    venue_id: VenueId,
    connection: &Connection,
) -> Result<CategorizationResult, Error> {
    let rules = get_rules(venue_id, connection)?;
    if rules.is_empty() {
        return Ok(CategorizationResult::empty());
    }

    let entries = get_uncategorized_ledger_entries(venue_id, connection)?;
    let mut result = CategorizationResult {
        entries_examined: entries.len(),
        ..CategorizationResult::empty()
    };

    if entries.is_empty() {
        return Ok(result);
    }

    let now = OffsetDateTime::now_utc();
    let transaction = connection.unchecked_transaction()?;

    for entry in &entries {
        let subject = RuleSubject {
            description: &entry.description,
            amount: entry.amount.signed(),
            direction: entry.amount.direction(),
        };

        let Some(rule_match) = evaluate(&subject, &rules) else {
            continue;
        };

        let hide_at = rule_match.auto_hide.then_some(now);
        set_ledger_entry_categorization(
            entry.id,
            rule_match.category_id,
            rule_match.auto_verify,
            hide_at,
            &transaction,
        )?;

        result.entries_categorized += 1;
        if rule_match.auto_verify {
            result.entries_verified += 1;
        }
        if rule_match.auto_hide {
            result.entries_hidden += 1;
        }
    }

    transaction.commit()?;

    Ok(result)
}
