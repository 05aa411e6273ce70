use rusqlite::{Connection, Row, types::Type};
use time::OffsetDateTime;

use crate::{
    Error,
    category::ensure_category_in_venue,
    database_id::{RuleId, VenueId},
    rule::{
        engine::sort_for_evaluation,
        models::{CategorizationRule, RuleDefinition},
    },
};

const RULE_COLUMNS: &str = "id, venue_id, direction, keywords, priority, category_id, \
     auto_verify, auto_hide, is_active, created_at";

/// Create a rule for `venue_id` in the database.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if the category does not belong to the venue,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_rule(
    venue_id: VenueId,
    definition: &RuleDefinition,
    connection: &Connection,
) -> Result<CategorizationRule, Error> {
    ensure_category_in_venue(definition.category_id, venue_id, connection)?;
    let keywords = serde_json::to_string(&definition.normalized_keywords())?;

    connection
        .prepare(&format!(
            "INSERT INTO categorization_rule
                (venue_id, direction, keywords, priority, category_id, auto_verify, auto_hide, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             RETURNING {RULE_COLUMNS}"
        ))?
        .query_row(
            (
                venue_id,
                definition.direction,
                keywords,
                definition.priority,
                definition.category_id,
                definition.auto_verify,
                definition.auto_hide,
                definition.is_active,
                OffsetDateTime::now_utc(),
            ),
            map_rule_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve the rule `rule_id` of `venue_id`.
///
/// # Errors
/// Returns [Error::NotFound] if the rule does not exist or belongs to a
/// different venue.
pub fn get_rule(
    rule_id: RuleId,
    venue_id: VenueId,
    connection: &Connection,
) -> Result<CategorizationRule, Error> {
    connection
        .prepare(&format!(
            "SELECT {RULE_COLUMNS} FROM categorization_rule WHERE id = ?1 AND venue_id = ?2"
        ))?
        .query_row((rule_id, venue_id), map_rule_row)
        .map_err(|error| error.into())
}

/// Retrieve all rules of `venue_id`, active or not, in evaluation order.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn get_rules(
    venue_id: VenueId,
    connection: &Connection,
) -> Result<Vec<CategorizationRule>, Error> {
    let mut rules = connection
        .prepare(&format!(
            "SELECT {RULE_COLUMNS} FROM categorization_rule WHERE venue_id = ?1"
        ))?
        .query_map((venue_id,), map_rule_row)?
        .collect::<Result<Vec<_>, _>>()?;

    sort_for_evaluation(&mut rules);

    Ok(rules)
}

/// Replace the definition of a rule. The creation time is kept.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the rule does not exist in the venue,
/// - [Error::Validation] if the category does not belong to the venue,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_rule(
    rule_id: RuleId,
    venue_id: VenueId,
    definition: &RuleDefinition,
    connection: &Connection,
) -> Result<CategorizationRule, Error> {
    ensure_category_in_venue(definition.category_id, venue_id, connection)?;
    let keywords = serde_json::to_string(&definition.normalized_keywords())?;

    connection
        .prepare(&format!(
            "UPDATE categorization_rule
             SET direction = ?3, keywords = ?4, priority = ?5, category_id = ?6,
                 auto_verify = ?7, auto_hide = ?8, is_active = ?9
             WHERE id = ?1 AND venue_id = ?2
             RETURNING {RULE_COLUMNS}"
        ))?
        .query_row(
            (
                rule_id,
                venue_id,
                definition.direction,
                keywords,
                definition.priority,
                definition.category_id,
                definition.auto_verify,
                definition.auto_hide,
                definition.is_active,
            ),
            map_rule_row,
        )
        .map_err(|error| error.into())
}

/// Delete a rule from the database.
///
/// # Errors
/// Returns [Error::NotFound] if the rule does not exist in the venue.
pub fn delete_rule(
    rule_id: RuleId,
    venue_id: VenueId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM categorization_rule WHERE id = ?1 AND venue_id = ?2",
        (rule_id, venue_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Create the categorization rule table and its venue index.
///
/// # Errors
/// This function will return an error if the SQL query failed.
pub fn create_rule_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS categorization_rule (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                venue_id INTEGER NOT NULL,
                direction TEXT NOT NULL CHECK (direction IN ('INFLOW', 'OUTFLOW')),
                keywords TEXT NOT NULL DEFAULT '[]',
                priority INTEGER NOT NULL DEFAULT 0,
                category_id INTEGER NOT NULL,
                auto_verify INTEGER NOT NULL DEFAULT 0,
                auto_hide INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                FOREIGN KEY(venue_id) REFERENCES venue(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE CASCADE
            );",
        (),
    )?;

    // Rules are always loaded per venue.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_categorization_rule_venue_id
         ON categorization_rule(venue_id)",
        (),
    )?;

    Ok(())
}

fn map_rule_row(row: &Row) -> Result<CategorizationRule, rusqlite::Error> {
    let keywords: String = row.get(3)?;
    let keywords = serde_json::from_str(&keywords).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(error))
    })?;

    Ok(CategorizationRule {
        id: row.get(0)?,
        venue_id: row.get(1)?,
        direction: row.get(2)?,
        keywords,
        priority: row.get(4)?,
        category_id: row.get(5)?,
        auto_verify: row.get(6)?,
        auto_hide: row.get(7)?,
        is_active: row.get(8)?,
        created_at: row.get(9)?,
    })
}
