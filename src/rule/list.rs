use axum::{Json, extract::State};

use crate::{
    Error,
    error::log_unexpected,
    rule::{
        db::get_rules,
        models::{CategorizationRule, RuleState},
    },
    user::Actor,
};

/// Route handler listing the acting user's venue rules in evaluation order.
pub async fn get_rules_endpoint(
    State(state): State<RuleState>,
    actor: Actor,
) -> Result<Json<Vec<CategorizationRule>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let rules = get_rules(actor.venue_id, &connection)
        .inspect_err(|error| log_unexpected("listing rules", error))?;

    Ok(Json(rules))
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, routing::get};

    use crate::{
        category::create_category,
        endpoints,
        money::Direction,
        rule::{CategorizationRule, RuleDefinition, create_rule, get_rules_endpoint},
        test_utils::{as_user, assert_error_response, new_test_venue},
    };

    #[tokio::test]
    async fn lists_only_own_venue_rules_in_evaluation_order() {
        let venue = new_test_venue();
        let (other_venue_id, _) = venue.add_other_venue();
        let (first, second) = {
            let connection = venue.connection();
            let category_id = create_category("Utenze", venue.venue_id, &connection)
                .unwrap()
                .id;
            let second = create_rule(
                venue.venue_id,
                &RuleDefinition::new(Direction::Outflow, &["A2A"], category_id).priority(2),
                &connection,
            )
            .unwrap();
            let first = create_rule(
                venue.venue_id,
                &RuleDefinition::new(Direction::Outflow, &["ENEL"], category_id).priority(1),
                &connection,
            )
            .unwrap();
            let other_category_id = create_category("Utenze", other_venue_id, &connection)
                .unwrap()
                .id;
            create_rule(
                other_venue_id,
                &RuleDefinition::new(Direction::Outflow, &["ENEL"], other_category_id),
                &connection,
            )
            .unwrap();
            (first, second)
        };
        let server = venue.server(Router::new().route(endpoints::RULES, get(get_rules_endpoint)));

        let response = as_user(server.get(endpoints::RULES), venue.user_id).await;

        response.assert_status_ok();
        assert_eq!(response.json::<Vec<CategorizationRule>>(), vec![first, second]);
    }

    #[tokio::test]
    async fn listing_rules_requires_user() {
        let venue = new_test_venue();
        let server = venue.server(Router::new().route(endpoints::RULES, get(get_rules_endpoint)));

        let response = server.get(endpoints::RULES).await;

        assert_error_response(&response, StatusCode::UNAUTHORIZED);
    }
}
