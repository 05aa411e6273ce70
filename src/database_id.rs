//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;
/// The ID of a venue, the unit that scopes nearly all data.
pub type VenueId = DatabaseId;
/// The ID of an imported bank transaction.
pub type BankTransactionId = DatabaseId;
/// The ID of a ledger (journal) entry.
pub type LedgerEntryId = DatabaseId;
/// The ID of a budget category.
pub type CategoryId = DatabaseId;
/// The ID of a categorization rule.
pub type RuleId = DatabaseId;
/// The ID of a user acting on behalf of a venue.
pub type UserId = DatabaseId;
