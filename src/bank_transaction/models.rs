use std::fmt::Display;

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    database_id::{BankTransactionId, LedgerEntryId, UserId, VenueId},
    money::Direction,
};

/// Where a bank transaction is in the reconciliation lifecycle.
///
/// ```text
/// PENDING -> MATCHED -> CONFIRMED
///    |          |           |
///    |          +-----------+--> PENDING (unmatch)
///    +----------+--> IGNORED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BankTransactionStatus {
    /// Imported and not yet linked to a ledger entry.
    Pending,
    /// Linked to a ledger entry, waiting for someone to confirm the link.
    Matched,
    /// The link has been accepted.
    Confirmed,
    /// Excluded from reconciliation for good.
    Ignored,
}

impl BankTransactionStatus {
    /// The name stored in the database and sent over the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            BankTransactionStatus::Pending => "PENDING",
            BankTransactionStatus::Matched => "MATCHED",
            BankTransactionStatus::Confirmed => "CONFIRMED",
            BankTransactionStatus::Ignored => "IGNORED",
        }
    }

    /// Whether a transaction in this status must hold a ledger entry link.
    pub fn has_link(&self) -> bool {
        matches!(
            self,
            BankTransactionStatus::Matched | BankTransactionStatus::Confirmed
        )
    }
}

impl Display for BankTransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for BankTransactionStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for BankTransactionStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "PENDING" => Ok(BankTransactionStatus::Pending),
            "MATCHED" => Ok(BankTransactionStatus::Matched),
            "CONFIRMED" => Ok(BankTransactionStatus::Confirmed),
            "IGNORED" => Ok(BankTransactionStatus::Ignored),
            other => Err(FromSqlError::Other(
                format!("invalid bank transaction status \"{other}\"").into(),
            )),
        }
    }
}

/// The status of a bank transaction together with its ledger entry link.
///
/// State transitions are written as a compare-and-swap from one
/// `LinkState` to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkState {
    /// The reconciliation status.
    pub status: BankTransactionStatus,
    /// Set iff the status is MATCHED or CONFIRMED.
    pub ledger_entry_id: Option<LedgerEntryId>,
}

impl LinkState {
    /// Not linked, waiting to be matched.
    pub const PENDING: LinkState = LinkState {
        status: BankTransactionStatus::Pending,
        ledger_entry_id: None,
    };

    /// Not linked, excluded from matching.
    pub const IGNORED: LinkState = LinkState {
        status: BankTransactionStatus::Ignored,
        ledger_entry_id: None,
    };

    /// Proposed link to `ledger_entry_id`.
    pub fn matched(ledger_entry_id: LedgerEntryId) -> Self {
        Self {
            status: BankTransactionStatus::Matched,
            ledger_entry_id: Some(ledger_entry_id),
        }
    }

    /// Accepted link to `ledger_entry_id`.
    pub fn confirmed(ledger_entry_id: LedgerEntryId) -> Self {
        Self {
            status: BankTransactionStatus::Confirmed,
            ledger_entry_id: Some(ledger_entry_id),
        }
    }
}

/// A line imported from a venue's bank statement.
///
/// To create a new `BankTransaction`, use [BankTransaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankTransaction {
    /// The ID of the transaction.
    pub id: BankTransactionId,
    /// The venue whose account the transaction was booked on.
    pub venue_id: VenueId,
    /// The booking date on the statement.
    pub date: Date,
    /// Positive for money received, negative for money paid out.
    pub amount: f64,
    /// The text of the statement line.
    pub description: String,
    /// The bank's own identifier for the transaction, if it has one.
    pub reference: Option<String>,
    /// Where the transaction is in the reconciliation lifecycle.
    pub status: BankTransactionStatus,
    /// The ledger entry this transaction is matched or confirmed against.
    pub ledger_entry_id: Option<LedgerEntryId>,
    /// The user who last changed the status by hand.
    pub reviewed_by: Option<UserId>,
    /// When the transaction was imported.
    pub created_at: OffsetDateTime,
}

impl BankTransaction {
    /// Create a new bank transaction.
    ///
    /// Shortcut for [BankTransactionBuilder] for discoverability.
    pub fn build(
        venue_id: VenueId,
        amount: f64,
        date: Date,
        description: &str,
    ) -> BankTransactionBuilder {
        BankTransactionBuilder {
            venue_id,
            amount,
            date,
            description: description.to_owned(),
            reference: None,
            link_state: LinkState::PENDING,
        }
    }

    /// The current status and link, as read.
    pub fn link_state(&self) -> LinkState {
        LinkState {
            status: self.status,
            ledger_entry_id: self.ledger_entry_id,
        }
    }

    /// Whether the transaction is money coming in or going out.
    pub fn direction(&self) -> Direction {
        Direction::of_amount(self.amount)
    }
}

/// A builder for creating [BankTransaction] instances.
#[derive(Debug, PartialEq, Clone)]
pub struct BankTransactionBuilder {
    /// The venue the transaction belongs to.
    pub venue_id: VenueId,
    /// Positive for money received, negative for money paid out.
    pub amount: f64,
    /// The booking date on the statement.
    pub date: Date,
    /// The text of the statement line.
    pub description: String,
    /// The bank's own identifier for the transaction.
    pub reference: Option<String>,
    /// Imports normally start out [LinkState::PENDING].
    pub link_state: LinkState,
}

impl BankTransactionBuilder {
    /// Set the bank's reference for the transaction.
    pub fn reference(mut self, reference: &str) -> Self {
        self.reference = Some(reference.to_owned());
        self
    }

    /// Set the initial status and link, e.g. when importing history that
    /// was reconciled elsewhere.
    pub fn link_state(mut self, link_state: LinkState) -> Self {
        self.link_state = link_state;
        self
    }
}
