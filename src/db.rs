//! Creates the application's database schema.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error, bank_transaction::create_bank_transaction_table, category::create_category_table,
    ledger::create_ledger_entry_table, rule::create_rule_table, user::create_user_table,
    venue::create_venue_table,
};

/// Create the tables for all domain models if they do not exist yet.
///
/// Foreign key enforcement is switched on for `connection` first, since
/// SQLite leaves it off by default and the scoping checks rely on it.
///
/// # Errors
/// Returns an error if a table cannot be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_venue_table(&transaction)?;
    create_user_table(&transaction)?;
    create_category_table(&transaction)?;
    create_ledger_entry_table(&transaction)?;
    create_bank_transaction_table(&transaction)?;
    create_rule_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn initialize_is_repeatable() {
        let connection = Connection::open_in_memory().unwrap();

        assert_eq!(initialize(&connection), Ok(()));
        assert_eq!(initialize(&connection), Ok(()));
    }

    #[test]
    fn initialize_enables_foreign_keys() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();

        let enabled: bool = connection
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .unwrap();
        assert!(enabled);
    }
}
