use rusqlite::{Connection, OptionalExtension, Row, params_from_iter, types::Value};
use time::OffsetDateTime;

use crate::{
    Error,
    bank_transaction::models::{
        BankTransaction, BankTransactionBuilder, BankTransactionStatus, LinkState,
    },
    database_id::{BankTransactionId, LedgerEntryId, UserId, VenueId},
    date_range::DateRange,
};

const BANK_TRANSACTION_COLUMNS: &str = "id, venue_id, date, amount, description, reference, \
     status, ledger_entry_id, reviewed_by, created_at";

/// Create the bank transaction table.
///
/// A link to a ledger entry is stored iff the status is MATCHED or
/// CONFIRMED.
///
/// # Errors
/// This function will return an error if the SQL query failed.
pub fn create_bank_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS bank_transaction (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                venue_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                amount REAL NOT NULL,
                description TEXT NOT NULL,
                reference TEXT,
                status TEXT NOT NULL DEFAULT 'PENDING'
                    CHECK (status IN ('PENDING', 'MATCHED', 'CONFIRMED', 'IGNORED')),
                ledger_entry_id INTEGER,
                reviewed_by INTEGER,
                created_at TEXT NOT NULL,
                FOREIGN KEY(venue_id) REFERENCES venue(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(ledger_entry_id) REFERENCES ledger_entry(id) ON UPDATE CASCADE,
                FOREIGN KEY(reviewed_by) REFERENCES user(id) ON UPDATE CASCADE ON DELETE SET NULL,
                CHECK ((status IN ('MATCHED', 'CONFIRMED')) = (ledger_entry_id IS NOT NULL))
            );",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_bank_transaction_venue_status_date
         ON bank_transaction(venue_id, status, date)",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_bank_transaction_ledger_entry_id
         ON bank_transaction(ledger_entry_id)",
        (),
    )?;

    Ok(())
}

/// Create a new bank transaction in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if the venue or linked ledger entry does not exist,
///   or the link does not agree with the status,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_bank_transaction(
    builder: BankTransactionBuilder,
    connection: &Connection,
) -> Result<BankTransaction, Error> {
    if builder.link_state.status.has_link() != builder.link_state.ledger_entry_id.is_some() {
        return Err(Error::Validation(format!(
            "a {} bank transaction {} a ledger entry link",
            builder.link_state.status,
            if builder.link_state.status.has_link() {
                "requires"
            } else {
                "cannot have"
            }
        )));
    }

    connection
        .prepare(&format!(
            "INSERT INTO bank_transaction
                (venue_id, date, amount, description, reference, status, ledger_entry_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             RETURNING {BANK_TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                builder.venue_id,
                builder.date,
                builder.amount,
                &builder.description,
                &builder.reference,
                builder.link_state.status,
                builder.link_state.ledger_entry_id,
                OffsetDateTime::now_utc(),
            ),
            map_bank_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::Validation(format!(
                "venue {} or ledger entry {:?} does not exist",
                builder.venue_id, builder.link_state.ledger_entry_id
            )),
            error => error.into(),
        })
}

/// Retrieve a bank transaction by its `id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such transaction.
pub fn get_bank_transaction(
    id: BankTransactionId,
    connection: &Connection,
) -> Result<BankTransaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {BANK_TRANSACTION_COLUMNS} FROM bank_transaction WHERE id = :id"
        ))?
        .query_row(&[(":id", &id)], map_bank_transaction_row)
        .map_err(|error| error.into())
}

/// Get the PENDING transactions of `venue_id` dated within `date_range`, in
/// ascending date order (ties broken by ID).
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_pending_bank_transactions(
    venue_id: VenueId,
    date_range: &DateRange,
    connection: &Connection,
) -> Result<Vec<BankTransaction>, Error> {
    let (range_condition, range_params) = date_range.sql_condition("date", 2);

    let mut params = vec![Value::Integer(venue_id)];
    params.extend(range_params.into_iter().map(|date| Value::Text(date.to_string())));

    connection
        .prepare(&format!(
            "SELECT {BANK_TRANSACTION_COLUMNS} FROM bank_transaction
             WHERE venue_id = ?1 AND status = 'PENDING'{range_condition}
             ORDER BY date ASC, id ASC"
        ))?
        .query_map(params_from_iter(params), map_bank_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Find a MATCHED or CONFIRMED transaction other than `excluding` that links
/// to `ledger_entry_id`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn find_active_link(
    ledger_entry_id: LedgerEntryId,
    excluding: BankTransactionId,
    connection: &Connection,
) -> Result<Option<(BankTransactionId, BankTransactionStatus)>, Error> {
    connection
        .prepare(
            "SELECT id, status FROM bank_transaction
             WHERE ledger_entry_id = ?1 AND id != ?2 AND status IN ('MATCHED', 'CONFIRMED')
             ORDER BY status = 'CONFIRMED' DESC, id ASC
             LIMIT 1",
        )?
        .query_row((ledger_entry_id, excluding), |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .optional()
        .map_err(Error::from)
}

/// Move a bank transaction from the `expected` link state to `next`.
///
/// The write only happens if the stored status and link still equal
/// `expected`, so two callers racing on the same transaction cannot both
/// succeed.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the transaction does not exist,
/// - [Error::ConcurrentModification] if its state no longer equals `expected`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn compare_and_set_link_state(
    id: BankTransactionId,
    expected: LinkState,
    next: LinkState,
    reviewed_by: Option<UserId>,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE bank_transaction
         SET status = ?4, ledger_entry_id = ?5, reviewed_by = ?6
         WHERE id = ?1 AND status = ?2 AND ledger_entry_id IS ?3",
        (
            id,
            expected.status,
            expected.ledger_entry_id,
            next.status,
            next.ledger_entry_id,
            reviewed_by,
        ),
    )?;

    if rows_affected == 1 {
        return Ok(());
    }

    let exists: bool = connection.query_row(
        "SELECT EXISTS(SELECT 1 FROM bank_transaction WHERE id = ?1)",
        (id,),
        |row| row.get(0),
    )?;

    if exists {
        Err(Error::ConcurrentModification)
    } else {
        Err(Error::NotFound)
    }
}

fn map_bank_transaction_row(row: &Row) -> Result<BankTransaction, rusqlite::Error> {
    Ok(BankTransaction {
        id: row.get(0)?,
        venue_id: row.get(1)?,
        date: row.get(2)?,
        amount: row.get(3)?,
        description: row.get(4)?,
        reference: row.get(5)?,
        status: row.get(6)?,
        ledger_entry_id: row.get(7)?,
        reviewed_by: row.get(8)?,
        created_at: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        bank_transaction::{BankTransaction, BankTransactionStatus, LinkState},
        date_range::DateRange,
        db::initialize,
        ledger::{LedgerAmount, LedgerEntry, create_ledger_entry},
        venue::create_venue,
    };

    use super::{
        compare_and_set_link_state, create_bank_transaction, find_active_link,
        get_bank_transaction, get_pending_bank_transactions,
    };

    fn get_test_db_connection() -> (Connection, i64) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("Could not initialize database");
        let venue = create_venue("Enoteca", &connection).unwrap();
        (connection, venue.id)
    }

    fn create_entry(venue_id: i64, connection: &Connection) -> i64 {
        create_ledger_entry(
            LedgerEntry::build(
                venue_id,
                LedgerAmount::Debit(45.0),
                date!(2024 - 03 - 09),
                "Enel",
            ),
            connection,
        )
        .unwrap()
        .id
    }

    #[test]
    fn create_bank_transaction_starts_pending() {
        let (connection, venue_id) = get_test_db_connection();

        let transaction = create_bank_transaction(
            BankTransaction::build(venue_id, -45.0, date!(2024 - 03 - 10), "ENEL")
                .reference("CBI-001"),
            &connection,
        )
        .unwrap();

        assert_eq!(transaction.status, BankTransactionStatus::Pending);
        assert_eq!(transaction.ledger_entry_id, None);
        assert_eq!(transaction.reference.as_deref(), Some("CBI-001"));
        assert_eq!(
            get_bank_transaction(transaction.id, &connection),
            Ok(transaction)
        );
    }

    #[test]
    fn create_bank_transaction_rejects_link_without_matched_status() {
        let (connection, venue_id) = get_test_db_connection();
        let entry_id = create_entry(venue_id, &connection);

        let result = create_bank_transaction(
            BankTransaction::build(venue_id, -45.0, date!(2024 - 03 - 10), "ENEL").link_state(
                LinkState {
                    status: BankTransactionStatus::Pending,
                    ledger_entry_id: Some(entry_id),
                },
            ),
            &connection,
        );

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn pending_transactions_are_ordered_by_date() {
        let (connection, venue_id) = get_test_db_connection();
        let entry_id = create_entry(venue_id, &connection);
        let later = create_bank_transaction(
            BankTransaction::build(venue_id, -1.0, date!(2024 - 03 - 12), "later"),
            &connection,
        )
        .unwrap();
        let earlier = create_bank_transaction(
            BankTransaction::build(venue_id, -1.0, date!(2024 - 03 - 02), "earlier"),
            &connection,
        )
        .unwrap();
        create_bank_transaction(
            BankTransaction::build(venue_id, -45.0, date!(2024 - 03 - 05), "matched")
                .link_state(LinkState::matched(entry_id)),
            &connection,
        )
        .unwrap();

        let got = get_pending_bank_transactions(venue_id, &DateRange::UNBOUNDED, &connection)
            .unwrap();

        assert_eq!(got, vec![earlier, later]);
    }

    #[test]
    fn compare_and_set_writes_when_state_unchanged() {
        let (connection, venue_id) = get_test_db_connection();
        let entry_id = create_entry(venue_id, &connection);
        let transaction = create_bank_transaction(
            BankTransaction::build(venue_id, -45.0, date!(2024 - 03 - 10), "ENEL"),
            &connection,
        )
        .unwrap();

        compare_and_set_link_state(
            transaction.id,
            LinkState::PENDING,
            LinkState::matched(entry_id),
            None,
            &connection,
        )
        .unwrap();

        let got = get_bank_transaction(transaction.id, &connection).unwrap();
        assert_eq!(got.link_state(), LinkState::matched(entry_id));
        assert_eq!(
            find_active_link(entry_id, 0, &connection),
            Ok(Some((transaction.id, BankTransactionStatus::Matched)))
        );
        assert_eq!(find_active_link(entry_id, transaction.id, &connection), Ok(None));
    }

    #[test]
    fn compare_and_set_fails_on_stale_state() {
        let (connection, venue_id) = get_test_db_connection();
        let entry_id = create_entry(venue_id, &connection);
        let transaction = create_bank_transaction(
            BankTransaction::build(venue_id, -45.0, date!(2024 - 03 - 10), "ENEL"),
            &connection,
        )
        .unwrap();
        compare_and_set_link_state(
            transaction.id,
            LinkState::PENDING,
            LinkState::IGNORED,
            None,
            &connection,
        )
        .unwrap();

        let result = compare_and_set_link_state(
            transaction.id,
            LinkState::PENDING,
            LinkState::matched(entry_id),
            None,
            &connection,
        );

        assert_eq!(result, Err(Error::ConcurrentModification));
        let got = get_bank_transaction(transaction.id, &connection).unwrap();
        assert_eq!(got.link_state(), LinkState::IGNORED);
    }

    #[test]
    fn compare_and_set_on_missing_transaction_returns_not_found() {
        let (connection, _) = get_test_db_connection();

        let result = compare_and_set_link_state(
            42,
            LinkState::PENDING,
            LinkState::IGNORED,
            None,
            &connection,
        );

        assert_eq!(result, Err(Error::NotFound));
    }
}
