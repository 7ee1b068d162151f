//! Date presets for the "changed since" filter.
//!
//! Fiscal years start on April 1: a date in January through March belongs to
//! the fiscal year that started the previous April.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Month a fiscal year starts in.
pub const FISCAL_YEAR_START_MONTH: u32 = 4;

/// Number of fiscal years offered as "changed after" presets.
const FISCAL_YEAR_PRESETS: i32 = 5;

/// First day of the month containing `date`.
pub fn beginning_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// January 1 of the year containing `date`.
pub fn beginning_of_year(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date)
}

/// First day of the calendar quarter containing `date`.
pub fn beginning_of_quarter(date: NaiveDate) -> NaiveDate {
    let month = (date.month0() / 3) * 3 + 1;
    NaiveDate::from_ymd_opt(date.year(), month, 1).unwrap_or(date)
}

/// First day of the fiscal year containing `date`.
pub fn fiscal_year_start(date: NaiveDate) -> NaiveDate {
    let year = if date.month() < FISCAL_YEAR_START_MONTH {
        date.year() - 1
    } else {
        date.year()
    };
    NaiveDate::from_ymd_opt(year, FISCAL_YEAR_START_MONTH, 1).unwrap_or(date)
}

/// First day of the fiscal year before the one containing `date`.
pub fn previous_fiscal_year_start(date: NaiveDate) -> NaiveDate {
    let current = fiscal_year_start(date);
    NaiveDate::from_ymd_opt(current.year() - 1, FISCAL_YEAR_START_MONTH, 1).unwrap_or(current)
}

/// A selectable "changed after" option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedAfterPreset {
    /// Date in `YYYY-MM-DD` form
    pub id: String,
    /// Display label
    pub text: String,
}

/// Fiscal year starts offered as "changed after" options, newest first.
pub fn changed_after_presets(today: NaiveDate) -> Vec<ChangedAfterPreset> {
    let start = fiscal_year_start(today);
    (0..FISCAL_YEAR_PRESETS)
        .filter_map(|back| NaiveDate::from_ymd_opt(start.year() - back, FISCAL_YEAR_START_MONTH, 1))
        .map(|date| {
            let id = date.format("%Y-%m-%d").to_string();
            ChangedAfterPreset {
                text: format!("Changed After: {}", id),
                id,
            }
        })
        .collect()
}

/// Resolve a `--changed-since` value relative to `today`.
///
/// Accepts `YYYY-MM-DD`, `month`, `quarter`, `year`, `fiscal-year` and
/// `previous-fiscal-year`.
pub fn parse_changed_since(value: &str, today: NaiveDate) -> Result<NaiveDate> {
    match value.trim().to_lowercase().as_str() {
        "month" => Ok(beginning_of_month(today)),
        "quarter" => Ok(beginning_of_quarter(today)),
        "year" => Ok(beginning_of_year(today)),
        "fiscal-year" => Ok(fiscal_year_start(today)),
        "previous-fiscal-year" => Ok(previous_fiscal_year_start(today)),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d").map_err(|_| {
            Error::InvalidInput(format!(
                "Invalid changed-since value '{}': expected YYYY-MM-DD, month, quarter, year, fiscal-year or previous-fiscal-year",
                value
            ))
        }),
    }
}
