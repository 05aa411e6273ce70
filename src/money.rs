//! Money helpers: cash flow direction and normalization to minor currency units.
//!
//! Amounts are stored as `f64` like the rest of the app, but must never be
//! compared as floats. Convert them with [to_minor_units] first.

use std::fmt::Display;

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

/// The number of minor units (cents) in one major unit of currency.
pub const MINOR_UNITS_PER_MAJOR: f64 = 100.0;

/// Whether money comes into or goes out of a venue's account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Money received, e.g. a card settlement. Positive amounts, ledger credits.
    Inflow,
    /// Money spent, e.g. a supplier payment. Negative amounts, ledger debits.
    Outflow,
}

impl Direction {
    /// The direction of a signed amount. Zero is treated as an inflow.
    pub fn of_amount(amount: f64) -> Self {
        if amount < 0.0 {
            Direction::Outflow
        } else {
            Direction::Inflow
        }
    }

    /// The name stored in the database and sent over the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Inflow => "INFLOW",
            Direction::Outflow => "OUTFLOW",
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for Direction {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Direction {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "INFLOW" => Ok(Direction::Inflow),
            "OUTFLOW" => Ok(Direction::Outflow),
            other => Err(FromSqlError::Other(
                format!("invalid direction \"{other}\"").into(),
            )),
        }
    }
}

/// Convert a decimal amount to an integer number of minor units (cents),
/// rounding half away from zero.
///
/// `45.00`, `44.999999999` and `45.000000001` all become `4500`.
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * MINOR_UNITS_PER_MAJOR).round() as i64
}

#[cfg(test)]
mod tests {
    use super::{Direction, to_minor_units};

    #[test]
    fn to_minor_units_absorbs_float_error() {
        assert_eq!(to_minor_units(0.1 + 0.2), 30);
        assert_eq!(to_minor_units(45.0), 4500);
        assert_eq!(to_minor_units(-45.0), -4500);
        assert_eq!(to_minor_units(19.999_999_9), 2000);
        assert_eq!(to_minor_units(-0.005), -1);
    }

    #[test]
    fn direction_follows_sign() {
        assert_eq!(Direction::of_amount(-12.5), Direction::Outflow);
        assert_eq!(Direction::of_amount(12.5), Direction::Inflow);
        assert_eq!(Direction::of_amount(0.0), Direction::Inflow);
    }

    #[test]
    fn direction_serializes_uppercase() {
        let json = serde_json::to_string(&Direction::Outflow).unwrap();

        assert_eq!(json, "\"OUTFLOW\"");
    }
}
