use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    AppState,
    database_id::{CategoryId, RuleId, VenueId},
    money::Direction,
};

/// A keyword rule that files matching ledger entries under a category.
///
/// A rule matches an entry of the same direction whose description contains
/// any of `keywords` (case-insensitive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorizationRule {
    /// The ID of the rule.
    pub id: RuleId,
    /// The venue that owns the rule.
    pub venue_id: VenueId,
    /// Rules only apply to entries flowing in this direction.
    pub direction: Direction,
    /// Substrings to look for in entry descriptions. Order is preserved for
    /// display but does not affect matching.
    pub keywords: Vec<String>,
    /// Lower priorities are evaluated first.
    pub priority: i64,
    /// The category to file matching entries under.
    pub category_id: CategoryId,
    /// Mark matching entries as verified.
    pub auto_verify: bool,
    /// Hide matching entries, e.g. internal transfers.
    pub auto_hide: bool,
    /// Inactive rules are kept but never evaluated.
    pub is_active: bool,
    /// Breaks ties between rules of equal priority: newer rules win.
    pub created_at: OffsetDateTime,
}

/// The fields a client supplies to create or replace a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDefinition {
    /// See [CategorizationRule::direction].
    pub direction: Direction,
    /// Blank keywords are dropped when the rule is stored.
    pub keywords: Vec<String>,
    /// Defaults to zero.
    #[serde(default)]
    pub priority: i64,
    /// Must belong to the venue the rule is created in.
    pub category_id: CategoryId,
    /// Mark matching entries as verified. Defaults to false.
    #[serde(default)]
    pub auto_verify: bool,
    /// Hide matching entries. Defaults to false.
    #[serde(default)]
    pub auto_hide: bool,
    /// Defaults to true.
    #[serde(default = "default_is_active")]
    pub is_active: bool,
}

fn default_is_active() -> bool {
    true
}

impl RuleDefinition {
    /// A new active rule with priority 0 and no automatic flags.
    pub fn new(direction: Direction, keywords: &[&str], category_id: CategoryId) -> Self {
        Self {
            direction,
            keywords: keywords.iter().map(|keyword| keyword.to_string()).collect(),
            priority: 0,
            category_id,
            auto_verify: false,
            auto_hide: false,
            is_active: true,
        }
    }

    /// Set the priority of the rule.
    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Set whether matching entries are marked as verified.
    pub fn auto_verify(mut self, auto_verify: bool) -> Self {
        self.auto_verify = auto_verify;
        self
    }

    /// Set whether matching entries are hidden.
    pub fn auto_hide(mut self, auto_hide: bool) -> Self {
        self.auto_hide = auto_hide;
        self
    }

    /// Set whether the rule is evaluated at all.
    pub fn is_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Trim keywords and drop the blank ones. A blank keyword would be a
    /// substring of every description.
    pub(super) fn normalized_keywords(&self) -> Vec<String> {
        self.keywords
            .iter()
            .map(|keyword| keyword.trim())
            .filter(|keyword| !keyword.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

/// Unified state for all rule-related operations.
#[derive(Debug, Clone)]
pub struct RuleState {
    /// The database connection for managing rules.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RuleState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::money::Direction;

    use super::RuleDefinition;

    #[test]
    fn normalized_keywords_drops_blanks() {
        let definition = RuleDefinition::new(Direction::Outflow, &[" ENEL ", "", "   "], 1);

        assert_eq!(definition.normalized_keywords(), vec!["ENEL".to_owned()]);
    }

    #[test]
    fn definition_defaults_when_deserializing() {
        let definition: RuleDefinition = serde_json::from_str(
            r#"{"direction": "INFLOW", "keywords": ["SATISPAY"], "categoryId": 3}"#,
        )
        .unwrap();

        assert_eq!(definition.priority, 0);
        assert!(definition.is_active);
        assert!(!definition.auto_verify);
        assert!(!definition.auto_hide);
    }
}
