//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/bank-transactions/{transaction_id}/confirm',
//! use [format_endpoint].

/// The route for running automatic reconciliation over a date range.
pub const RECONCILIATION: &str = "/reconciliation";
/// The route for confirming the suggested match of a bank transaction.
pub const CONFIRM_MATCH: &str = "/bank-transactions/{transaction_id}/confirm";
/// The route for ignoring a bank transaction.
pub const IGNORE_TRANSACTION: &str = "/bank-transactions/{transaction_id}/ignore";
/// The route for clearing the link of a bank transaction.
pub const UNMATCH: &str = "/bank-transactions/{transaction_id}/unmatch";
/// The route for manually linking a bank transaction to a ledger entry.
pub const MANUAL_MATCH: &str = "/bank-transactions/{transaction_id}/match";
/// The route for listing the scored ledger candidates of a bank transaction.
pub const MATCH_CANDIDATES: &str = "/bank-transactions/{transaction_id}/candidates";
/// The route to list and create categorization rules.
pub const RULES: &str = "/regole-categorizzazione";
/// The route to update or delete a categorization rule.
pub const RULE: &str = "/regole-categorizzazione/{rule_id}";
/// The route to apply the categorization rules to the ledger.
pub const APPLY_RULES: &str = "/regole-categorizzazione/applica";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/regole-categorizzazione/{rule_id}', '{rule_id}'
/// is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |offset| param_start + offset + 1);

    format!(
        "{}{id}{}",
        &endpoint_path[..param_start],
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::RECONCILIATION);
        assert_endpoint_is_valid_uri(endpoints::CONFIRM_MATCH);
        assert_endpoint_is_valid_uri(endpoints::IGNORE_TRANSACTION);
        assert_endpoint_is_valid_uri(endpoints::UNMATCH);
        assert_endpoint_is_valid_uri(endpoints::MANUAL_MATCH);
        assert_endpoint_is_valid_uri(endpoints::MATCH_CANDIDATES);
        assert_endpoint_is_valid_uri(endpoints::RULES);
        assert_endpoint_is_valid_uri(endpoints::RULE);
        assert_endpoint_is_valid_uri(endpoints::APPLY_RULES);
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/bank-transactions/{transaction_id}/confirm", 1);

        assert_eq!(formatted_path, "/bank-transactions/1/confirm");
        assert!(formatted_path.parse::<Uri>().is_ok());

        // Parameter with single word should also work.
        let formatted_path = format_endpoint("/regole-categorizzazione/{id}", 12);

        assert_eq!(formatted_path, "/regole-categorizzazione/12");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint(endpoints::RECONCILIATION, 1);

        assert_eq!(formatted_path, endpoints::RECONCILIATION);
    }

    #[test]
    fn parameter_at_end() {
        let formatted_path = format_endpoint(endpoints::RULE, 3);

        assert_eq!(formatted_path, "/regole-categorizzazione/3");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }
}
