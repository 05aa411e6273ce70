//! Evaluates categorization rules against a ledger entry. Pure, no I/O.

use std::cmp::Reverse;

use serde::Serialize;

use crate::{
    database_id::{CategoryId, RuleId},
    money::Direction,
    rule::models::CategorizationRule,
};

/// The parts of an entry that rules are evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct RuleSubject<'a> {
    /// Matched against the rule keywords.
    pub description: &'a str,
    /// Signed amount, negative for money paid out.
    pub amount: f64,
    /// Only rules with this direction are considered.
    pub direction: Direction,
}

/// What the winning rule says should happen to the entry.
///
/// The caller applies it: set the category, set `verified` if `auto_verify`
/// and set `hidden_at` if `auto_hide`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleMatch {
    /// The rule that won.
    pub rule_id: RuleId,
    /// The category to file the entry under.
    pub category_id: CategoryId,
    /// Whether the entry should also be marked verified.
    pub auto_verify: bool,
    /// Whether the entry should also be hidden.
    pub auto_hide: bool,
}

impl From<&CategorizationRule> for RuleMatch {
    fn from(rule: &CategorizationRule) -> Self {
        Self {
            rule_id: rule.id,
            category_id: rule.category_id,
            auto_verify: rule.auto_verify,
            auto_hide: rule.auto_hide,
        }
    }
}

/// Order `rules` for evaluation: ascending priority, then newest first.
///
/// Ties on both are broken by descending ID so the order is total.
pub fn sort_for_evaluation(rules: &mut [CategorizationRule]) {
    rules.sort_by_key(|rule| (rule.priority, Reverse(rule.created_at), Reverse(rule.id)));
}

/// Find the first rule, in evaluation order, that applies to `subject`.
///
/// Only active rules with the subject's direction are considered. A rule
/// applies if any of its keywords occurs in the description, ignoring case.
/// The first applicable rule wins even if a later rule has more keyword
/// hits.
pub fn evaluate(subject: &RuleSubject, rules: &[CategorizationRule]) -> Option<RuleMatch> {
    let mut candidates: Vec<CategorizationRule> = rules
        .iter()
        .filter(|rule| rule.is_active && rule.direction == subject.direction)
        .cloned()
        .collect();

    sort_for_evaluation(&mut candidates);

    let description = subject.description.to_lowercase();

    candidates
        .iter()
        .find(|rule| matches_any_keyword(&description, &rule.keywords))
        .map(RuleMatch::from)
}

/// `lowercase_description` must already be lowercase. An empty keyword list
/// never matches, and neither does a blank keyword.
#[inline]
fn matches_any_keyword(lowercase_description: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|keyword| {
        let keyword = keyword.trim();
        !keyword.is_empty() && lowercase_description.contains(&keyword.to_lowercase())
    })
}

#[cfg(test)]
mod tests {
    use time::{Duration, OffsetDateTime, macros::datetime};

    use crate::{
        money::Direction,
        rule::models::CategorizationRule,
    };

    use super::{RuleMatch, RuleSubject, evaluate, matches_any_keyword, sort_for_evaluation};

    const CREATED_AT: OffsetDateTime = datetime!(2024-01-01 09:00 UTC);

    fn rule(id: i64, priority: i64, keywords: &[&str], direction: Direction) -> CategorizationRule {
        CategorizationRule {
            id,
            venue_id: 1,
            direction,
            keywords: keywords.iter().map(|keyword| keyword.to_string()).collect(),
            priority,
            category_id: id * 10,
            auto_verify: false,
            auto_hide: false,
            is_active: true,
            created_at: CREATED_AT,
        }
    }

    fn outflow(description: &str) -> RuleSubject<'_> {
        RuleSubject {
            description,
            amount: -45.0,
            direction: Direction::Outflow,
        }
    }

    #[test]
    fn matches_any_keyword_is_case_insensitive_substring() {
        let keywords = vec!["enel".to_owned()];

        assert!(matches_any_keyword("pagamento enel energia", &keywords));
        assert!(!matches_any_keyword("pagamento a2a", &keywords));
        assert!(!matches_any_keyword("anything", &[]));
        assert!(!matches_any_keyword("anything", &["  ".to_owned()]));
    }

    #[test]
    fn enel_rule_categorizes_and_verifies() {
        let mut enel = rule(1, 1, &["ENEL"], Direction::Outflow);
        enel.auto_verify = true;

        let got = evaluate(&outflow("PAGAMENTO ENEL ENERGIA"), &[enel.clone()]);

        assert_eq!(
            got,
            Some(RuleMatch {
                rule_id: enel.id,
                category_id: enel.category_id,
                auto_verify: true,
                auto_hide: false,
            })
        );
    }

    #[test]
    fn never_returns_rule_of_other_direction() {
        let rules = [
            rule(1, 1, &["POS"], Direction::Inflow),
            rule(2, 2, &["POS"], Direction::Outflow),
        ];

        for direction in [Direction::Inflow, Direction::Outflow] {
            let subject = RuleSubject {
                description: "ACCREDITO POS",
                amount: 1.0,
                direction,
            };

            let got = evaluate(&subject, &rules).expect("a rule should match");
            let winner = rules.iter().find(|rule| rule.id == got.rule_id).unwrap();

            assert_eq!(winner.direction, direction);
        }
    }

    #[test]
    fn lower_priority_wins_over_more_keyword_hits() {
        let rules = [
            rule(2, 2, &["ENEL", "ENERGIA", "PAGAMENTO"], Direction::Outflow),
            rule(1, 1, &["ENEL"], Direction::Outflow),
        ];

        let got = evaluate(&outflow("PAGAMENTO ENEL ENERGIA"), &rules).unwrap();

        assert_eq!(got.rule_id, 1);
    }

    #[test]
    fn newer_rule_wins_on_equal_priority() {
        let older = rule(1, 5, &["ENEL"], Direction::Outflow);
        let mut newer = rule(2, 5, &["ENEL"], Direction::Outflow);
        newer.created_at = CREATED_AT + Duration::days(1);

        let got = evaluate(&outflow("ENEL"), &[older, newer]).unwrap();

        assert_eq!(got.rule_id, 2);
    }

    #[test]
    fn inactive_rules_are_skipped() {
        let mut inactive = rule(1, 1, &["ENEL"], Direction::Outflow);
        inactive.is_active = false;
        let fallback = rule(2, 9, &["ENEL"], Direction::Outflow);

        let got = evaluate(&outflow("ENEL"), &[inactive, fallback]).unwrap();

        assert_eq!(got.rule_id, 2);
    }

    #[test]
    fn empty_keyword_list_never_matches() {
        let rules = [rule(1, 1, &[], Direction::Outflow)];

        assert_eq!(evaluate(&outflow("anything at all"), &rules), None);
    }

    #[test]
    fn no_rules_returns_none() {
        assert_eq!(evaluate(&outflow("ENEL"), &[]), None);
    }

    #[test]
    fn sort_orders_by_priority_then_newest() {
        let mut newest_low = rule(3, 1, &[], Direction::Outflow);
        newest_low.created_at = CREATED_AT + Duration::hours(2);
        let oldest_low = rule(1, 1, &[], Direction::Outflow);
        let high = rule(2, 0, &[], Direction::Outflow);
        let mut rules = vec![oldest_low, newest_low, high];

        sort_for_evaluation(&mut rules);

        let ids: Vec<_> = rules.iter().map(|rule| rule.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }
}
