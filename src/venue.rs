//! Venues are the physical business locations that own every other record.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::VenueId};

/// A café or restaurant location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    /// The ID of the venue.
    pub id: VenueId,
    /// The display name of the venue, unique across the app.
    pub name: String,
}

/// Create the venue table.
///
/// # Errors
/// This function will return an error if the SQL query failed.
pub fn create_venue_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS venue (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );",
        (),
    )?;

    Ok(())
}

/// Create and insert a new venue into the database.
///
/// # Errors
/// This function will return a [Error::Validation] if `name` is empty or
/// already taken, or an [Error::SqlError] if there is some other SQL error.
pub fn create_venue(name: &str, connection: &Connection) -> Result<Venue, Error> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::Validation("venue name cannot be empty".to_owned()));
    }

    connection
        .prepare("INSERT INTO venue (name) VALUES (?1) RETURNING id, name")?
        .query_row((name,), map_venue_row)
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::Validation(format!("the venue \"{name}\" already exists")),
            error => error.into(),
        })
}

/// Retrieve a venue by its `id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no venue with `id`.
pub fn get_venue(id: VenueId, connection: &Connection) -> Result<Venue, Error> {
    connection
        .prepare("SELECT id, name FROM venue WHERE id = :id")?
        .query_row(&[(":id", &id)], map_venue_row)
        .map_err(|error| error.into())
}

fn map_venue_row(row: &Row) -> Result<Venue, rusqlite::Error> {
    Ok(Venue {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::Error;

    use super::{create_venue, create_venue_table, get_venue};

    fn get_test_db_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        create_venue_table(&connection).expect("Could not create venue table");
        connection
    }

    #[test]
    fn create_and_get_venue() {
        let connection = get_test_db_connection();

        let venue = create_venue("Caffè Centrale", &connection).unwrap();
        let got = get_venue(venue.id, &connection);

        assert_eq!(got, Ok(venue));
    }

    #[test]
    fn create_venue_rejects_duplicate_name() {
        let connection = get_test_db_connection();
        create_venue("Bar Sport", &connection).unwrap();

        let result = create_venue("Bar Sport", &connection);

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn create_venue_rejects_blank_name() {
        let connection = get_test_db_connection();

        let result = create_venue("   ", &connection);

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn get_missing_venue_returns_not_found() {
        let connection = get_test_db_connection();

        assert_eq!(get_venue(42, &connection), Err(Error::NotFound));
    }
}
