//! Date column lookup and date value helpers.

use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::models::ColumnValue;

/// "Creative Deadline" column on parent items.
pub const PARENT_DATE_COLUMN_ID: &str = "date7";

/// "Date" column on subitems.
pub const SUBITEM_DATE_COLUMN_ID: &str = "date_mkn2am1b";

/// Column type tag used for the fallback lookup.
pub const DATE_COLUMN_TYPE: &str = "date";

/// How a date column was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchedBy {
    /// Exact column identifier.
    Id,
    /// First column whose type tag is `date`.
    Type,
}

/// A located date column.
#[derive(Debug, Clone, Copy)]
pub struct ColumnMatch<'a> {
    pub column: &'a ColumnValue,
    pub matched_by: MatchedBy,
}

/// Find a date column: exact id first, then the first column typed `date`.
#[must_use]
pub fn locate_date_column<'a>(
    columns: &'a [ColumnValue],
    preferred_id: &str,
) -> Option<ColumnMatch<'a>> {
    if let Some(column) = columns.iter().find(|c| c.id == preferred_id) {
        return Some(ColumnMatch {
            column,
            matched_by: MatchedBy::Id,
        });
    }

    columns
        .iter()
        .find(|c| c.column_type.as_deref() == Some(DATE_COLUMN_TYPE))
        .map(|column| ColumnMatch {
            column,
            matched_by: MatchedBy::Type,
        })
}

/// The raw date value, or `None` when it is absent, empty or the literal `"null"`.
#[must_use]
pub fn present_value(raw: Option<&str>) -> Option<&str> {
    raw.filter(|v| !v.is_empty() && *v != "null")
}

/// Extract the `date` field of a raw date column value, for logging.
#[must_use]
pub fn date_text(raw: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(raw).ok()?;
    parsed.get("date")?.as_str().map(str::to_string)
}

/// Raw column value for a date, in the shape monday.com stores it.
#[must_use]
pub fn date_value(date: NaiveDate) -> String {
    json!({ "date": date.format("%Y-%m-%d").to_string() }).to_string()
}
