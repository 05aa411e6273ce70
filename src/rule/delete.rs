use axum::{
    Json,
    extract::{Path, State},
};
use axum_extra::extract::WithRejection;
use serde_json::{Value, json};

use crate::{
    Error,
    database_id::RuleId,
    rule::{db::delete_rule, models::RuleState},
    user::Actor,
};

/// A route handler for deleting a rule.
pub async fn delete_rule_endpoint(
    WithRejection(Path(rule_id), _): WithRejection<Path<RuleId>, Error>,
    State(state): State<RuleState>,
    actor: Actor,
) -> Result<Json<Value>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_rule(rule_id, actor.venue_id, &connection).inspect_err(|error| {
        if *error != Error::NotFound {
            tracing::error!("An unexpected error occurred while deleting rule {rule_id}: {error}");
        }
    })?;

    Ok(Json(json!({ "success": true })))
}
