//! An optionally bounded, inclusive range of dates used to scope queries.

use serde::{Deserialize, Serialize};
use time::{Date, Duration};

/// An inclusive range of dates where either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    /// The first date in the range, if any.
    #[serde(rename = "dateFrom")]
    pub start: Option<Date>,
    /// The last date in the range, if any.
    #[serde(rename = "dateTo")]
    pub end: Option<Date>,
}

impl DateRange {
    /// A range covering every date.
    pub const UNBOUNDED: DateRange = DateRange {
        start: None,
        end: None,
    };

    /// Create a range from `start` to `end` inclusive.
    pub fn new(start: Option<Date>, end: Option<Date>) -> Self {
        Self { start, end }
    }

    /// Whether `date` falls within the range.
    pub fn contains(&self, date: Date) -> bool {
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }

    /// Whether the start comes after the end, i.e. no date can match.
    pub fn is_empty(&self) -> bool {
        matches!((self.start, self.end), (Some(start), Some(end)) if start > end)
    }

    /// Extend both bounded ends outwards by `days`, saturating at the
    /// representable date limits.
    pub fn widen(&self, days: i64) -> Self {
        let days = Duration::days(days.max(0));

        Self {
            start: self
                .start
                .map(|start| start.checked_sub(days).unwrap_or(Date::MIN)),
            end: self.end.map(|end| end.checked_add(days).unwrap_or(Date::MAX)),
        }
    }

    /// Build the SQL condition restricting `column` to this range.
    ///
    /// Returns the clause (empty if unbounded, otherwise starting with
    /// " AND ") and the values to bind, numbered from `first_param`.
    pub(crate) fn sql_condition(&self, column: &str, first_param: usize) -> (String, Vec<Date>) {
        let mut clause = String::new();
        let mut params = Vec::new();

        if let Some(start) = self.start {
            clause.push_str(&format!(
                " AND {column} >= ?{}",
                first_param + params.len()
            ));
            params.push(start);
        }

        if let Some(end) = self.end {
            clause.push_str(&format!(
                " AND {column} <= ?{}",
                first_param + params.len()
            ));
            params.push(end);
        }

        (clause, params)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::DateRange;

    #[test]
    fn unbounded_contains_everything() {
        assert!(DateRange::UNBOUNDED.contains(date!(1999 - 01 - 01)));
        assert!(!DateRange::UNBOUNDED.is_empty());
    }

    #[test]
    fn bounds_are_inclusive() {
        let range = DateRange::new(Some(date!(2024 - 03 - 01)), Some(date!(2024 - 03 - 31)));

        assert!(range.contains(date!(2024 - 03 - 01)));
        assert!(range.contains(date!(2024 - 03 - 31)));
        assert!(!range.contains(date!(2024 - 02 - 29)));
        assert!(!range.contains(date!(2024 - 04 - 01)));
    }

    #[test]
    fn widen_moves_bounded_ends_only() {
        let range = DateRange::new(Some(date!(2024 - 03 - 10)), None).widen(7);

        assert_eq!(range.start, Some(date!(2024 - 03 - 03)));
        assert_eq!(range.end, None);
    }

    #[test]
    fn reversed_range_is_empty() {
        let range = DateRange::new(Some(date!(2024 - 03 - 10)), Some(date!(2024 - 03 - 01)));

        assert!(range.is_empty());
    }

    #[test]
    fn sql_condition_numbers_params() {
        let range = DateRange::new(Some(date!(2024 - 03 - 01)), Some(date!(2024 - 03 - 31)));

        let (clause, params) = range.sql_condition("date", 2);

        assert_eq!(clause, " AND date >= ?2 AND date <= ?3");
        assert_eq!(params, vec![date!(2024 - 03 - 01), date!(2024 - 03 - 31)]);
    }

    #[test]
    fn deserializes_camel_case_body() {
        let range: DateRange =
            serde_json::from_str(r#"{"dateFrom": "2024-03-01", "dateTo": null}"#).unwrap();

        assert_eq!(range.start, Some(date!(2024 - 03 - 01)));
        assert_eq!(range.end, None);
    }
}
