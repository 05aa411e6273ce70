//! Keyword rules that file ledger entries under budget categories.
//!
//! Rules are evaluated by [evaluate] in a single, fixed order (ascending
//! priority, then newest first) and the first rule with a keyword hit wins.

mod apply;
mod create;
mod db;
mod delete;
mod edit;
mod engine;
mod list;
mod models;

pub use apply::{CategorizationResult, apply_rules_endpoint, apply_rules_to_ledger};
pub use create::create_rule_endpoint;
pub use db::{create_rule, create_rule_table, delete_rule, get_rule, get_rules, update_rule};
pub use delete::delete_rule_endpoint;
pub use edit::update_rule_endpoint;
pub use engine::{RuleMatch, RuleSubject, evaluate, sort_for_evaluation};
pub use list::get_rules_endpoint;
pub use models::{CategorizationRule, RuleDefinition, RuleState};
