//! Users and the acting user extracted from requests.
//!
//! Authentication happens upstream of this app. The authenticating proxy
//! forwards the ID of the logged-in user in the [USER_ID_HEADER] header and
//! every request is scoped to that user's venue.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    database_id::{UserId, VenueId},
};

/// The header carrying the authenticated user's ID.
pub const USER_ID_HEADER: &str = "x-user-id";

/// A member of staff who works at a single venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserId,
    /// The venue whose data the user may see and change.
    pub venue_id: VenueId,
    /// The user's display name.
    pub name: String,
}

/// The user on whose behalf an operation runs, together with the venue
/// that scopes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// The acting user.
    pub user_id: UserId,
    /// The venue the acting user belongs to.
    pub venue_id: VenueId,
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            venue_id: user.venue_id,
        }
    }
}

impl<S> FromRequestParts<S> for Actor
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<UserId>().ok())
            .ok_or(Error::Unauthenticated)?;

        let state = AppState::from_ref(state);
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        match get_user(user_id, &connection) {
            Ok(user) => Ok(Actor::from(&user)),
            Err(Error::NotFound) => Err(Error::Unauthenticated),
            Err(error) => Err(error),
        }
    }
}

/// Create the user table.
///
/// # Errors
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                venue_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                FOREIGN KEY(venue_id) REFERENCES venue(id) ON UPDATE CASCADE ON DELETE CASCADE
            );",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
/// Returns a [Error::Validation] if `venue_id` does not refer to a venue, or
/// a [Error::SqlError] if some other SQL error occurred.
pub fn create_user(name: &str, venue_id: VenueId, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("INSERT INTO user (venue_id, name) VALUES (?1, ?2) RETURNING id, venue_id, name")?
        .query_row((venue_id, name), map_user_row)
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::Validation(format!("venue {venue_id} does not exist")),
            error => error.into(),
        })
}

/// Get the user from the database that has the specified `id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such user.
pub fn get_user(id: UserId, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, venue_id, name FROM user WHERE id = :id")?
        .query_row(&[(":id", &id)], map_user_row)
        .map_err(|error| error.into())
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: row.get(0)?,
        venue_id: row.get(1)?,
        name: row.get(2)?,
    })
}
