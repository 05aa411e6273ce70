//! Bank transactions imported from statements, and their reconciliation
//! status and ledger entry link.

mod db;
mod models;

pub use db::{
    compare_and_set_link_state, create_bank_transaction, create_bank_transaction_table,
    find_active_link, get_bank_transaction, get_pending_bank_transactions,
};
pub use models::{BankTransaction, BankTransactionBuilder, BankTransactionStatus, LinkState};
