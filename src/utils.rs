//! Utility functions shared by the feed, table and profile modules

use crate::error::{RatingError, Result};
use chrono::NaiveDate;

/// Date format used by the match feed (`tourney_date` column)
pub const FEED_DATE_FORMAT: &str = "%Y%m%d";

/// Date format used by exported tables
pub const TABLE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a feed date such as `20230115`
///
/// Exported `YYYY-MM-DD` dates are accepted as well so a feed can be
/// rebuilt from derived tables.
pub fn parse_feed_date(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, FEED_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(trimmed, TABLE_DATE_FORMAT))
        .map_err(|_| {
            RatingError::InvalidDate {
                value: value.to_string(),
            }
            .into()
        })
}

/// Percentage of `wins` over `total`, or 0 when there is nothing to count
pub fn win_percentage(wins: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    wins as f64 * 100.0 / total as f64
}
