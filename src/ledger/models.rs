use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    database_id::{CategoryId, LedgerEntryId, VenueId},
    money::Direction,
};

/// The amount of a journal entry. Exactly one side of the entry is set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LedgerAmount {
    /// Money leaving the venue, e.g. a supplier invoice being paid.
    Debit(f64),
    /// Money coming into the venue, e.g. the day's card takings.
    Credit(f64),
}

impl LedgerAmount {
    /// The amount with the sign a bank statement would show it with: debits
    /// are outflows (negative), credits are inflows (positive).
    pub fn signed(&self) -> f64 {
        match self {
            LedgerAmount::Debit(amount) => -amount.abs(),
            LedgerAmount::Credit(amount) => amount.abs(),
        }
    }

    /// Debits are outflows and credits are inflows.
    pub fn direction(&self) -> Direction {
        match self {
            LedgerAmount::Debit(_) => Direction::Outflow,
            LedgerAmount::Credit(_) => Direction::Inflow,
        }
    }

    pub(crate) fn debit(&self) -> Option<f64> {
        match self {
            LedgerAmount::Debit(amount) => Some(amount.abs()),
            LedgerAmount::Credit(_) => None,
        }
    }

    pub(crate) fn credit(&self) -> Option<f64> {
        match self {
            LedgerAmount::Debit(_) => None,
            LedgerAmount::Credit(amount) => Some(amount.abs()),
        }
    }
}

/// A bookkeeping record in a venue's journal.
///
/// To create a new `LedgerEntry`, use [LedgerEntry::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// The ID of the entry.
    pub id: LedgerEntryId,
    /// The venue whose books the entry is in.
    pub venue_id: VenueId,
    /// The accounting date.
    pub date: Date,
    /// The debit or credit amount.
    pub amount: LedgerAmount,
    /// What the entry is for, e.g. the supplier or the invoice number.
    pub description: String,
    /// The budget category the entry is filed under, if categorized.
    pub category_id: Option<CategoryId>,
    /// Whether someone (or an auto-verifying rule) has reviewed the entry.
    pub verified: bool,
    /// When the entry was soft-deleted. Hidden entries are never matched.
    pub hidden_at: Option<OffsetDateTime>,
    /// When the entry was recorded. Newer entries win ties when matching.
    pub created_at: OffsetDateTime,
}

impl LedgerEntry {
    /// Create a new ledger entry.
    ///
    /// Shortcut for [LedgerEntryBuilder] for discoverability.
    pub fn build(
        venue_id: VenueId,
        amount: LedgerAmount,
        date: Date,
        description: &str,
    ) -> LedgerEntryBuilder {
        LedgerEntryBuilder {
            venue_id,
            amount,
            date,
            description: description.to_owned(),
            category_id: None,
            verified: false,
            hidden_at: None,
            created_at: None,
        }
    }

    /// Whether the entry has been soft-deleted.
    pub fn is_hidden(&self) -> bool {
        self.hidden_at.is_some()
    }
}

/// A builder for creating [LedgerEntry] instances.
#[derive(Debug, PartialEq, Clone)]
pub struct LedgerEntryBuilder {
    /// The venue the entry belongs to.
    pub venue_id: VenueId,
    /// The debit or credit amount.
    pub amount: LedgerAmount,
    /// The accounting date.
    pub date: Date,
    /// What the entry is for.
    pub description: String,
    /// The budget category, if already known.
    pub category_id: Option<CategoryId>,
    /// Whether the entry starts out verified.
    pub verified: bool,
    /// Set to create the entry already hidden.
    pub hidden_at: Option<OffsetDateTime>,
    /// Defaults to the current time when the entry is inserted.
    pub created_at: Option<OffsetDateTime>,
}

impl LedgerEntryBuilder {
    /// Set the category of the entry.
    pub fn category_id(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }

    /// Set whether the entry has been verified.
    pub fn verified(mut self, verified: bool) -> Self {
        self.verified = verified;
        self
    }

    /// Soft-delete the entry at `hidden_at`.
    pub fn hidden_at(mut self, hidden_at: Option<OffsetDateTime>) -> Self {
        self.hidden_at = hidden_at;
        self
    }

    /// Override the creation time, e.g. when importing historical records.
    pub fn created_at(mut self, created_at: OffsetDateTime) -> Self {
        self.created_at = Some(created_at);
        self
    }
}
