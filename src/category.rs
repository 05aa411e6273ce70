//! Budget categories (chart-of-accounts lines) that ledger entries are filed under.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::{CategoryId, VenueId},
};

/// A budget category such as "Utilities" or "Coffee beans", owned by a venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The venue that owns the category.
    pub venue_id: VenueId,
    /// The display name, unique within the venue.
    pub name: String,
}

/// Create the category table.
///
/// # Errors
/// This function will return an error if the SQL query failed.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                venue_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                FOREIGN KEY(venue_id) REFERENCES venue(id) ON UPDATE CASCADE ON DELETE CASCADE,
                UNIQUE(venue_id, name)
            );",
        (),
    )?;

    Ok(())
}

/// Create a category for `venue_id`.
///
/// # Errors
/// Returns a [Error::Validation] if the name is empty, already used by the
/// venue, or the venue does not exist.
pub fn create_category(
    name: &str,
    venue_id: VenueId,
    connection: &Connection,
) -> Result<Category, Error> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::Validation("category name cannot be empty".to_owned()));
    }

    connection
        .prepare(
            "INSERT INTO category (venue_id, name) VALUES (?1, ?2)
             RETURNING id, venue_id, name",
        )?
        .query_row((venue_id, name), map_category_row)
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::Validation(format!("the category \"{name}\" already exists")),
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

/// Get the category `id` if it belongs to `venue_id`.
///
/// # Errors
/// Returns [Error::NotFound] if the category does not exist or belongs to a
/// different venue.
pub fn get_category(
    id: CategoryId,
    venue_id: VenueId,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, venue_id, name FROM category WHERE id = ?1 AND venue_id = ?2")?
        .query_row((id, venue_id), map_category_row)
        .map_err(|error| error.into())
}

/// Check that `id` refers to a category of `venue_id`, for validating
/// references supplied by clients.
///
/// # Errors
/// Returns a [Error::Validation] if it does not.
pub fn ensure_category_in_venue(
    id: CategoryId,
    venue_id: VenueId,
    connection: &Connection,
) -> Result<(), Error> {
    match get_category(id, venue_id, connection) {
        Ok(_) => Ok(()),
        Err(Error::NotFound) => Err(Error::Validation(format!(
            "category {id} does not exist for this venue"
        ))),
        Err(error) => Err(error),
    }
}

fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        venue_id: row.get(1)?,
        name: row.get(2)?,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{Error, db::initialize, venue::create_venue};

    use super::{create_category, ensure_category_in_venue, get_category};

    fn get_test_db_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("Could not initialize database");
        connection
    }

    #[test]
    fn create_category_succeeds() {
        let connection = get_test_db_connection();
        let venue = create_venue("Pasticceria", &connection).unwrap();

        let category = create_category("Utenze", venue.id, &connection).unwrap();

        assert!(category.id > 0);
        assert_eq!(category.name, "Utenze");
        assert_eq!(get_category(category.id, venue.id, &connection), Ok(category));
    }

    #[test]
    fn category_of_other_venue_is_not_visible() {
        let connection = get_test_db_connection();
        let venue = create_venue("Pasticceria", &connection).unwrap();
        let other = create_venue("Gelateria", &connection).unwrap();
        let category = create_category("Utenze", other.id, &connection).unwrap();

        assert_eq!(
            get_category(category.id, venue.id, &connection),
            Err(Error::NotFound)
        );
        assert!(matches!(
            ensure_category_in_venue(category.id, venue.id, &connection),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn same_name_allowed_in_different_venues() {
        let connection = get_test_db_connection();
        let venue = create_venue("Pasticceria", &connection).unwrap();
        let other = create_venue("Gelateria", &connection).unwrap();

        create_category("Utenze", venue.id, &connection).unwrap();

        assert!(create_category("Utenze", other.id, &connection).is_ok());
        assert!(matches!(
            create_category("Utenze", venue.id, &connection),
            Err(Error::Validation(_))
        ));
    }
}
