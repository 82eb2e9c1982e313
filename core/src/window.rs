//! Observation window arithmetic: month labels and day ranges.
//!
//! The warehouse reports zero-based month offsets. Every report shows
//! them as "Month 1..N" with the matching 30-day range.

use crate::{
    error::{ReportError, ReportResult},
    types::{MonthOffset, DAYS_PER_MONTH, TIMESTAMP_FORMAT},
};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthWindow {
    pub month_offset: MonthOffset,
}

impl MonthWindow {
    pub fn new(month_offset: MonthOffset) -> Self {
        Self { month_offset }
    }

    /// One-based label shown in tables (offset 0 -> 1).
    pub fn label(&self) -> i64 {
        self.month_offset + 1
    }

    pub fn days_start(&self) -> i64 {
        self.month_offset * DAYS_PER_MONTH
    }

    pub fn days_end(&self) -> i64 {
        (self.month_offset + 1) * DAYS_PER_MONTH
    }

    /// "0-30", "30-60", ...
    pub fn days_range(&self) -> String {
        format!("{}-{}", self.days_start(), self.days_end())
    }
}

/// A calendar month identifying a cohort, e.g. `2025-04`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CohortMonth {
    first_day: NaiveDate,
}

impl CohortMonth {
    pub fn parse(value: &str) -> ReportResult<Self> {
        let invalid = || ReportError::InvalidCohort { value: value.to_string() };
        let (year, month) = value.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        let first_day = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        Ok(Self { first_day })
    }

    /// Build from a year/month known to be valid at compile time.
    pub(crate) fn literal(year: i32, month: u32) -> Self {
        Self {
            first_day: NaiveDate::from_ymd_opt(year, month, 1).expect("literal month is valid"),
        }
    }

    /// Inclusive lower bound, `YYYY-MM-01`.
    pub fn start(&self) -> String {
        self.first_day.format("%Y-%m-%d").to_string()
    }

    /// Exclusive upper bound: first day of the following month.
    pub fn end(&self) -> String {
        self.next().start()
    }

    pub fn next(&self) -> Self {
        let (year, month) = if self.first_day.month() == 12 {
            (self.first_day.year() + 1, 1)
        } else {
            (self.first_day.year(), self.first_day.month() + 1)
        };
        Self {
            // Day 1 of a valid month always exists.
            first_day: NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(self.first_day),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    /// Short display name, e.g. "Apr 2025".
    pub fn display_name(&self) -> String {
        self.first_day.format("%b %Y").to_string()
    }
}

impl std::fmt::Display for CohortMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.first_day.format("%Y-%m"))
    }
}

impl TryFrom<String> for CohortMonth {
    type Error = ReportError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CohortMonth> for String {
    fn from(value: CohortMonth) -> Self {
        value.to_string()
    }
}

const DATETIME_INPUTS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a warehouse timestamp and rewrite it as `YYYY-MM-DD HH:MM:SS`.
///
/// Accepts a space or `T` separator, optional fractional seconds, an
/// RFC 3339 offset (converted to UTC) and bare dates (midnight).
/// Fractional seconds are truncated.
pub fn normalize_timestamp(column: &'static str, value: &str) -> ReportResult<String> {
    let raw = value.trim();
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_utc())
        .ok()
        .or_else(|| {
            DATETIME_INPUTS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
        .ok_or_else(|| ReportError::InvalidTimestamp {
            column,
            value: value.to_string(),
        })?;
    Ok(parsed.format(TIMESTAMP_FORMAT).to_string())
}
