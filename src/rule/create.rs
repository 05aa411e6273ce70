use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::WithRejection;

use crate::{
    Error,
    rule::{
        db::create_rule,
        models::{RuleDefinition, RuleState},
    },
    user::Actor,
};

/// A route handler for creating a new rule in the acting user's venue.
pub async fn create_rule_endpoint(
    State(state): State<RuleState>,
    actor: Actor,
    WithRejection(Json(definition), _): WithRejection<Json<RuleDefinition>, Error>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let rule = create_rule(actor.venue_id, &definition, &connection).inspect_err(|error| {
        if !matches!(error, Error::Validation(_)) {
            tracing::error!("An unexpected error occurred while creating a rule: {error}");
        }
    })?;

    tracing::info!(
        "User {} created rule {} for venue {}",
        actor.user_id,
        rule.id,
        actor.venue_id
    );

    Ok((StatusCode::CREATED, Json(rule)).into_response())
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        http::StatusCode,
        routing::{get, post},
    };
    use serde_json::json;

    use crate::{
        category::create_category,
        endpoints,
        money::Direction,
        rule::{CategorizationRule, create_rule_endpoint, get_rules_endpoint},
        test_utils::{as_user, assert_error_response, new_test_venue},
    };

    #[tokio::test]
    async fn create_rule_returns_created_rule() {
        let venue = new_test_venue();
        let category_id = create_category("Utenze", venue.venue_id, &venue.connection())
            .unwrap()
            .id;
        let server = venue.server(
            Router::new().route(
                endpoints::RULES,
                get(get_rules_endpoint).post(create_rule_endpoint),
            ),
        );

        let response = as_user(server.post(endpoints::RULES), venue.user_id)
            .json(&json!({
                "direction": "OUTFLOW",
                "keywords": ["ENEL"],
                "priority": 1,
                "categoryId": category_id,
                "autoVerify": true
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let rule = response.json::<CategorizationRule>();
        assert_eq!(rule.venue_id, venue.venue_id);
        assert_eq!(rule.direction, Direction::Outflow);
        assert_eq!(rule.keywords, vec!["ENEL".to_owned()]);
        assert!(rule.auto_verify);

        let listed = as_user(server.get(endpoints::RULES), venue.user_id)
            .await
            .json::<Vec<CategorizationRule>>();
        assert_eq!(listed, vec![rule]);
    }

    #[tokio::test]
    async fn create_rule_with_category_of_other_venue_is_rejected() {
        let venue = new_test_venue();
        let (other_venue_id, _) = venue.add_other_venue();
        let foreign_category = create_category("Utenze", other_venue_id, &venue.connection())
            .unwrap()
            .id;
        let server =
            venue.server(Router::new().route(endpoints::RULES, post(create_rule_endpoint)));

        let response = as_user(server.post(endpoints::RULES), venue.user_id)
            .json(&json!({
                "direction": "OUTFLOW",
                "keywords": ["ENEL"],
                "categoryId": foreign_category
            }))
            .await;

        assert_error_response(&response, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_rule_requires_user() {
        let venue = new_test_venue();
        let server =
            venue.server(Router::new().route(endpoints::RULES, post(create_rule_endpoint)));

        let response = server
            .post(endpoints::RULES)
            .json(&json!({"direction": "OUTFLOW", "keywords": [], "categoryId": 1}))
            .await;

        assert_error_response(&response, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn list_only_shows_own_venue_rules() {
        let venue = new_test_venue();
        let (_, other_user_id) = venue.add_other_venue();
        let category_id = create_category("Utenze", venue.venue_id, &venue.connection())
            .unwrap()
            .id;
        let server = venue.server(
            Router::new().route(
                endpoints::RULES,
                get(get_rules_endpoint).post(create_rule_endpoint),
            ),
        );
        as_user(server.post(endpoints::RULES), venue.user_id)
            .json(&json!({"direction": "OUTFLOW", "keywords": ["ENEL"], "categoryId": category_id}))
            .await
            .assert_status(StatusCode::CREATED);

        let listed = as_user(server.get(endpoints::RULES), other_user_id)
            .await
            .json::<Vec<CategorizationRule>>();

        assert!(listed.is_empty());
    }
}
