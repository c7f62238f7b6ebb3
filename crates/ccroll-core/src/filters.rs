//! Date range filtering for aggregated reports
//!
//! Filters are applied after aggregation, against each row's representative
//! date: the calendar date for daily rows, the last activity date for
//! sessions, the first day of the month for monthly rows, and the UTC date
//! for usage windows. Both bounds are inclusive.
//!
//! # Examples
//!
//! ```
//! use ccroll_core::filters::{DateFilter, parse_compact_date};
//! use chrono::NaiveDate;
//!
//! let filter = DateFilter::new()
//!     .with_since(parse_compact_date("20240101").unwrap())
//!     .with_until(parse_compact_date("20240131").unwrap());
//!
//! assert!(filter.matches(&NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()));
//! assert!(!filter.matches(&NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()));
//! ```

use crate::error::{CcrollError, Result};
use chrono::NaiveDate;

/// Parse a compact `YYYYMMDD` date
pub fn parse_compact_date(s: &str) -> Result<NaiveDate> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CcrollError::InvalidDate(format!(
            "'{s}'. Use YYYYMMDD format (e.g. 20240115)"
        )));
    }
    NaiveDate::parse_from_str(s, "%Y%m%d")
        .map_err(|_| CcrollError::InvalidDate(format!("'{s}' is not a calendar date")))
}

/// Inclusive date range; either bound may be open
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DateFilter {
    /// Start date filter (inclusive)
    pub since: Option<NaiveDate>,
    /// End date filter (inclusive)
    pub until: Option<NaiveDate>,
}

impl DateFilter {
    /// Create a new filter with no restrictions
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the start date filter
    pub fn with_since(mut self, date: NaiveDate) -> Self {
        self.since = Some(date);
        self
    }

    /// Set the end date filter
    pub fn with_until(mut self, date: NaiveDate) -> Self {
        self.until = Some(date);
        self
    }

    /// Whether a date falls within the range
    pub fn matches(&self, date: &NaiveDate) -> bool {
        if let Some(since) = &self.since
            && date < since
        {
            return false;
        }

        if let Some(until) = &self.until
            && date > until
        {
            return false;
        }

        true
    }

    /// Whether neither bound is set
    pub fn is_empty(&self) -> bool {
        self.since.is_none() && self.until.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_compact_date() {
        assert_eq!(parse_compact_date("20240115").unwrap(), date(2024, 1, 15));
        assert!(parse_compact_date("2024-01-15").is_err());
        assert!(parse_compact_date("2024011").is_err());
        assert!(parse_compact_date("20240230").is_err());
        assert!(parse_compact_date("abcdefgh").is_err());
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let filter = DateFilter::new()
            .with_since(date(2024, 1, 10))
            .with_until(date(2024, 1, 20));

        assert!(!filter.matches(&date(2024, 1, 9)));
        assert!(filter.matches(&date(2024, 1, 10)));
        assert!(filter.matches(&date(2024, 1, 15)));
        assert!(filter.matches(&date(2024, 1, 20)));
        assert!(!filter.matches(&date(2024, 1, 21)));
    }

    #[test]
    fn test_open_bounds() {
        let empty = DateFilter::new();
        assert!(empty.is_empty());
        assert!(empty.matches(&date(1999, 12, 31)));

        let since_only = DateFilter::new().with_since(date(2024, 1, 1));
        assert!(!since_only.is_empty());
        assert!(since_only.matches(&date(2099, 1, 1)));
        assert!(!since_only.matches(&date(2023, 12, 31)));
    }
}
