//! Defines the app level error type and its conversion to JSON error responses.
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{bank_transaction::BankTransactionStatus, database_id::LedgerEntryId};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The requested resource was not found.
    ///
    /// This is also returned for records that exist but belong to a venue
    /// other than the one the caller is acting for.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The current status of a bank transaction does not allow the requested
    /// state transition, e.g. confirming a transaction that has no match.
    #[error("cannot {action} a transaction with status {status}")]
    InvalidState {
        /// The transition that was attempted.
        action: &'static str,
        /// The status the transaction had when the transition was attempted.
        status: BankTransactionStatus,
    },

    /// The ledger entry is already linked to another matched or confirmed
    /// bank transaction.
    #[error("ledger entry {0} is already linked to another bank transaction")]
    Conflict(LedgerEntryId),

    /// The record changed between being read and being written.
    ///
    /// The caller should reload the record and decide whether to retry.
    #[error("the bank transaction was modified concurrently, reload and try again")]
    ConcurrentModification,

    /// The request referenced something that does not exist or is malformed.
    #[error("invalid input: {0}")]
    Validation(String),

    /// No acting user could be determined for the request.
    #[error("the request does not identify a valid user")]
    Unauthenticated,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// A value could not be converted to or from JSON.
    #[error("could not (de)serialize JSON: {0}")]
    JsonError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => Error::SqlError(error),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::JsonError(value.to_string())
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

/// Log an error returned while handling a request.
///
/// Server errors are logged at error level, client errors at debug level.
pub(crate) fn log_unexpected(action: &str, error: &Error) {
    if error.status_code().is_server_error() {
        tracing::error!("An unexpected error occurred while {action}: {error}");
    } else {
        tracing::debug!("Rejected request while {action}: {error}");
    }
}

impl Error {
    /// The HTTP status code that best describes this error to a client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::InvalidState { .. } | Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Conflict(_) | Error::ConcurrentModification => StatusCode::CONFLICT,
            Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            Error::SqlError(_) | Error::DatabaseLockError | Error::JsonError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        let message = if status_code == StatusCode::INTERNAL_SERVER_ERROR {
            // Internal details are for the server logs, not the client.
            tracing::error!("An unexpected error occurred: {self}");
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (status_code, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{Error, bank_transaction::BankTransactionStatus};

    #[test]
    fn query_returned_no_rows_maps_to_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::NotFound);
    }

    #[test]
    fn maps_taxonomy_to_status_codes() {
        let cases = [
            (Error::NotFound, StatusCode::NOT_FOUND),
            (
                Error::InvalidState {
                    action: "confirm",
                    status: BankTransactionStatus::Pending,
                },
                StatusCode::BAD_REQUEST,
            ),
            (Error::Conflict(1), StatusCode::CONFLICT),
            (Error::ConcurrentModification, StatusCode::CONFLICT),
            (Error::Validation("bad".to_owned()), StatusCode::BAD_REQUEST),
            (Error::DatabaseLockError, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, want) in cases {
            assert_eq!(error.into_response().status(), want);
        }
    }

    #[test]
    fn invalid_state_message_names_status() {
        let error = Error::InvalidState {
            action: "ignore",
            status: BankTransactionStatus::Confirmed,
        };

        assert_eq!(
            error.to_string(),
            "cannot ignore a transaction with status CONFIRMED"
        );
    }
}
