//! Application router configuration.

use axum::{
    Router,
    http::Uri,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};

use crate::{
    AppState, Error, endpoints,
    reconcile::{
        confirm_match_endpoint, get_candidates_endpoint, ignore_transaction_endpoint,
        manual_match_endpoint, reconcile_endpoint, unmatch_endpoint,
    },
    rule::{
        apply_rules_endpoint, create_rule_endpoint, delete_rule_endpoint, get_rules_endpoint,
        update_rule_endpoint,
    },
};

/// Return a router with all the app's routes.
///
/// Every route acts on behalf of the user named in the
/// [USER_ID_HEADER](crate::USER_ID_HEADER) header.
pub fn build_router(state: AppState) -> Router {
    let reconciliation_routes = Router::new()
        .route(endpoints::RECONCILIATION, post(reconcile_endpoint))
        .route(endpoints::CONFIRM_MATCH, post(confirm_match_endpoint))
        .route(endpoints::IGNORE_TRANSACTION, post(ignore_transaction_endpoint))
        .route(endpoints::UNMATCH, post(unmatch_endpoint))
        .route(endpoints::MANUAL_MATCH, post(manual_match_endpoint))
        .route(endpoints::MATCH_CANDIDATES, get(get_candidates_endpoint));

    let rule_routes = Router::new()
        .route(
            endpoints::RULES,
            get(get_rules_endpoint).post(create_rule_endpoint),
        )
        .route(endpoints::APPLY_RULES, post(apply_rules_endpoint))
        .route(
            endpoints::RULE,
            put(update_rule_endpoint).delete(delete_rule_endpoint),
        );

    reconciliation_routes
        .merge(rule_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_404_not_found(uri: Uri) -> Response {
    tracing::debug!("No route for {uri}");

    Error::NotFound.into_response()
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{
        AppState, ReconciliationConfig, build_router, endpoints,
        test_utils::{as_user, assert_error_response, new_test_venue},
    };

    #[tokio::test]
    async fn unknown_route_returns_json_404() {
        let state =
            AppState::new(Connection::open_in_memory().unwrap(), ReconciliationConfig::default())
                .unwrap();
        let server = TestServer::try_new(build_router(state)).unwrap();

        let response = server.get("/dashboard").await;

        assert_error_response(&response, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn apply_route_is_not_shadowed_by_rule_id_route() {
        let venue = new_test_venue();
        let server = TestServer::try_new(build_router(venue.state.clone())).unwrap();

        let response = as_user(server.post(endpoints::APPLY_RULES), venue.user_id).await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "entriesExamined": 0,
            "entriesCategorized": 0,
            "entriesVerified": 0,
            "entriesHidden": 0
        }));
    }
}
