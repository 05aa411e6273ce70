//! Defines the data access the reconciliation workflow needs, and its SQLite
//! implementation.

use rusqlite::Connection;

use crate::{
    Error,
    bank_transaction::{
        self, BankTransaction, BankTransactionStatus, LinkState, get_bank_transaction,
        get_pending_bank_transactions,
    },
    database_id::{BankTransactionId, LedgerEntryId, UserId, VenueId},
    date_range::DateRange,
    ledger::{self, LedgerEntry, get_ledger_entry, get_unmatched_ledger_entries},
};

/// Reads and writes bank transactions and ledger entries for reconciliation.
pub trait ReconciliationStore {
    /// Run `operation` as a single atomic unit.
    ///
    /// Writes made by `operation` are committed only if it returns `Ok`.
    /// Implementations do not need to support nesting.
    fn atomically<T, F>(&self, operation: F) -> Result<T, Error>
    where
        F: FnOnce(&Self) -> Result<T, Error>;

    /// Retrieve a bank transaction by ID, regardless of venue.
    fn get_bank_transaction(&self, id: BankTransactionId) -> Result<BankTransaction, Error>;

    /// Retrieve a ledger entry by ID, regardless of venue.
    fn get_ledger_entry(&self, id: LedgerEntryId) -> Result<LedgerEntry, Error>;

    /// The venue's PENDING bank transactions dated within `date_range`,
    /// oldest first.
    fn pending_transactions(
        &self,
        venue_id: VenueId,
        date_range: &DateRange,
    ) -> Result<Vec<BankTransaction>, Error>;

    /// The venue's visible ledger entries dated within `date_range` that no
    /// MATCHED or CONFIRMED transaction links to.
    fn unmatched_entries(
        &self,
        venue_id: VenueId,
        date_range: &DateRange,
    ) -> Result<Vec<LedgerEntry>, Error>;

    /// Find a MATCHED or CONFIRMED transaction, other than `excluding`,
    /// linked to `ledger_entry_id`.
    fn find_active_link(
        &self,
        ledger_entry_id: LedgerEntryId,
        excluding: BankTransactionId,
    ) -> Result<Option<(BankTransactionId, BankTransactionStatus)>, Error>;

    /// Move a transaction from `expected` to `next` if its stored state still
    /// equals `expected`, otherwise fail with
    /// [Error::ConcurrentModification].
    fn compare_and_set_link_state(
        &self,
        id: BankTransactionId,
        expected: LinkState,
        next: LinkState,
        reviewed_by: Option<UserId>,
    ) -> Result<(), Error>;

    /// Set the `verified` flag of a ledger entry.
    fn mark_entry_verified(&self, ledger_entry_id: LedgerEntryId) -> Result<(), Error>;
}

/// A [ReconciliationStore] over a SQLite connection.
#[derive(Debug, Clone, Copy)]
pub struct SqliteStore<'a> {
    connection: &'a Connection,
}

impl<'a> SqliteStore<'a> {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: &'a Connection) -> Self {
        Self { connection }
    }
}

impl ReconciliationStore for SqliteStore<'_> {
    /// Wraps `operation` in a SQLite transaction on the same connection.
    /// The transaction rolls back when dropped without a commit.
    fn atomically<T, F>(&self, operation: F) -> Result<T, Error>
    where
        F: FnOnce(&Self) -> Result<T, Error>,
    {
        let transaction = self.connection.unchecked_transaction()?;
        let result = operation(self)?;
        transaction.commit()?;

        Ok(result)
    }

    fn get_bank_transaction(&self, id: BankTransactionId) -> Result<BankTransaction, Error> {
        get_bank_transaction(id, self.connection)
    }

    fn get_ledger_entry(&self, id: LedgerEntryId) -> Result<LedgerEntry, Error> {
        get_ledger_entry(id, self.connection)
    }

    fn pending_transactions(
        &self,
        venue_id: VenueId,
        date_range: &DateRange,
    ) -> Result<Vec<BankTransaction>, Error> {
        get_pending_bank_transactions(venue_id, date_range, self.connection)
    }

    fn unmatched_entries(
        &self,
        venue_id: VenueId,
        date_range: &DateRange,
    ) -> Result<Vec<LedgerEntry>, Error> {
        get_unmatched_ledger_entries(venue_id, date_range, self.connection)
    }

    fn find_active_link(
        &self,
        ledger_entry_id: LedgerEntryId,
        excluding: BankTransactionId,
    ) -> Result<Option<(BankTransactionId, BankTransactionStatus)>, Error> {
        bank_transaction::find_active_link(ledger_entry_id, excluding, self.connection)
    }

    fn compare_and_set_link_state(
        &self,
        id: BankTransactionId,
        expected: LinkState,
        next: LinkState,
        reviewed_by: Option<UserId>,
    ) -> Result<(), Error> {
        bank_transaction::compare_and_set_link_state(
            id,
            expected,
            next,
            reviewed_by,
            self.connection,
        )
    }

    fn mark_entry_verified(&self, ledger_entry_id: LedgerEntryId) -> Result<(), Error> {
        ledger::set_ledger_entry_verified(ledger_entry_id, self.connection)
    }
}
