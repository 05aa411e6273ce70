//! Ledger (journal) entries: the bookkeeping side of reconciliation.
//!
//! Entries are created by other parts of the business (payments, invoices,
//! manual bookkeeping). This module only reads them for matching and writes
//! the fields reconciliation and categorization own: `verified`, the
//! category and `hidden_at`.

mod db;
mod models;

pub use db::{
    create_ledger_entry, create_ledger_entry_table, get_ledger_entry,
    get_uncategorized_ledger_entries, get_unmatched_ledger_entries,
    set_ledger_entry_categorization, set_ledger_entry_verified,
};
pub use models::{LedgerAmount, LedgerEntry, LedgerEntryBuilder};
