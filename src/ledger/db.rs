use rusqlite::{Connection, Row, params_from_iter, types::Type, types::Value};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::{CategoryId, LedgerEntryId, VenueId},
    date_range::DateRange,
    ledger::models::{LedgerAmount, LedgerEntry, LedgerEntryBuilder},
};

const LEDGER_ENTRY_COLUMNS: &str = "id, venue_id, date, debit, credit, description, \
     category_id, verified, hidden_at, created_at";

/// Create the ledger entry table.
///
/// # Errors
/// This function will return an error if the SQL query failed.
pub fn create_ledger_entry_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS ledger_entry (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                venue_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                debit REAL,
                credit REAL,
                description TEXT NOT NULL,
                category_id INTEGER,
                verified INTEGER NOT NULL DEFAULT 0,
                hidden_at TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY(venue_id) REFERENCES venue(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL,
                CHECK ((debit IS NULL) <> (credit IS NULL))
            );",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_ledger_entry_venue_date ON ledger_entry(venue_id, date)",
        (),
    )?;

    Ok(())
}

/// Create a new ledger entry in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if the venue or category does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_ledger_entry(
    builder: LedgerEntryBuilder,
    connection: &Connection,
) -> Result<LedgerEntry, Error> {
    let created_at = builder.created_at.unwrap_or_else(OffsetDateTime::now_utc);

    connection
        .prepare(&format!(
            "INSERT INTO ledger_entry
                (venue_id, date, debit, credit, description, category_id, verified, hidden_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             RETURNING {LEDGER_ENTRY_COLUMNS}"
        ))?
        .query_row(
            (
                builder.venue_id,
                builder.date,
                builder.amount.debit(),
                builder.amount.credit(),
                &builder.description,
                builder.category_id,
                builder.verified,
                builder.hidden_at,
                created_at,
            ),
            map_ledger_entry_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::Validation(format!(
                "venue {} or category {:?} does not exist",
                builder.venue_id, builder.category_id
            )),
            error => error.into(),
        })
}

/// Retrieve a ledger entry by its `id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such entry.
pub fn get_ledger_entry(id: LedgerEntryId, connection: &Connection) -> Result<LedgerEntry, Error> {
    connection
        .prepare(&format!(
            "SELECT {LEDGER_ENTRY_COLUMNS} FROM ledger_entry WHERE id = :id"
        ))?
        .query_row(&[(":id", &id)], map_ledger_entry_row)
        .map_err(|error| error.into())
}

/// Get the entries of `venue_id` dated within `date_range` that can still be
/// matched: not hidden and not linked to a matched or confirmed bank
/// transaction. Entries are ordered by date then ID.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_unmatched_ledger_entries(
    venue_id: VenueId,
    date_range: &DateRange,
    connection: &Connection,
) -> Result<Vec<LedgerEntry>, Error> {
    let (range_condition, range_params) = date_range.sql_condition("date", 2);

    let mut params = vec![Value::Integer(venue_id)];
    params.extend(range_params.into_iter().map(|date| Value::Text(date.to_string())));

    connection
        .prepare(&format!(
            "SELECT {LEDGER_ENTRY_COLUMNS} FROM ledger_entry le
             WHERE venue_id = ?1
               AND hidden_at IS NULL{range_condition}
               AND NOT EXISTS (
                   SELECT 1 FROM bank_transaction bt
                   WHERE bt.ledger_entry_id = le.id AND bt.status IN ('MATCHED', 'CONFIRMED')
               )
             ORDER BY date ASC, id ASC"
        ))?
        .query_map(params_from_iter(params), map_ledger_entry_row)?
        .map(|maybe_entry| maybe_entry.map_err(Error::from))
        .collect()
}

/// Get the visible entries of `venue_id` that have no category yet.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_uncategorized_ledger_entries(
    venue_id: VenueId,
    connection: &Connection,
) -> Result<Vec<LedgerEntry>, Error> {
    connection
        .prepare(&format!(
            "SELECT {LEDGER_ENTRY_COLUMNS} FROM ledger_entry
             WHERE venue_id = ?1 AND hidden_at IS NULL AND category_id IS NULL
             ORDER BY date ASC, id ASC"
        ))?
        .query_map((venue_id,), map_ledger_entry_row)?
        .map(|maybe_entry| maybe_entry.map_err(Error::from))
        .collect()
}

/// Mark a ledger entry as verified. Verifying a verified entry is a no-op.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such entry.
pub fn set_ledger_entry_verified(id: LedgerEntryId, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("UPDATE ledger_entry SET verified = 1 WHERE id = ?1", (id,))?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// File an entry under `category_id`.
///
/// If `verify` is set the entry is marked verified, and if `hide_at` is set
/// the entry is soft-deleted at that time. Neither flag ever undoes an
/// earlier verification or hide.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such entry, or a
/// [Error::Validation] if the category does not exist.
pub fn set_ledger_entry_categorization(
    id: LedgerEntryId,
    category_id: CategoryId,
    verify: bool,
    hide_at: Option<OffsetDateTime>,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection
        .execute(
            "UPDATE ledger_entry
             SET category_id = ?2,
                 verified = verified OR ?3,
                 hidden_at = COALESCE(hidden_at, ?4)
             WHERE id = ?1",
            (id, category_id, verify, hide_at),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::Validation(format!("category {category_id} does not exist")),
            error => error.into(),
        })?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

fn map_ledger_entry_row(row: &Row) -> Result<LedgerEntry, rusqlite::Error> {
    let debit: Option<f64> = row.get(3)?;
    let credit: Option<f64> = row.get(4)?;

    let amount = match (debit, credit) {
        (Some(debit), None) => LedgerAmount::Debit(debit),
        (None, Some(credit)) => LedgerAmount::Credit(credit),
        _ => return Err(rusqlite::Error::InvalidColumnType(3, "debit".to_owned(), Type::Null)),
    };

    Ok(LedgerEntry {
        id: row.get(0)?,
        venue_id: row.get(1)?,
        date: row.get(2)?,
        amount,
        description: row.get(5)?,
        category_id: row.get(6)?,
        verified: row.get(7)?,
        hidden_at: row.get(8)?,
        created_at: row.get(9)?,
    })
}
