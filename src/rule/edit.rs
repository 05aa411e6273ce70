use axum::{
    Json,
    extract::{Path, State},
};
use axum_extra::extract::WithRejection;

use crate::{
    Error,
    database_id::RuleId,
    rule::{
        db::update_rule,
        models::{CategorizationRule, RuleDefinition, RuleState},
    },
    user::Actor,
};

/// A route handler for replacing the definition of a rule.
pub async fn update_rule_endpoint(
    WithRejection(Path(rule_id), _): WithRejection<Path<RuleId>, Error>,
    State(state): State<RuleState>,
    actor: Actor,
    WithRejection(Json(definition), _): WithRejection<Json<RuleDefinition>, Error>,
) -> Result<Json<CategorizationRule>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let rule = update_rule(rule_id, actor.venue_id, &definition, &connection).inspect_err(
        |error| match error {
            Error::NotFound | Error::Validation(_) => {}
            error => {
                tracing::error!("An unexpected error occurred when updating rule #{rule_id}: {error}");
            }
        },
    )?;

    Ok(Json(rule))
}
