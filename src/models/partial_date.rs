//! Partial calendar dates and the shared date normalization rule.
//!
//! Clinical notes frequently state dates to year or year-month precision
//! ("diagnosed in 2019", "colonoscopy 05/2021"). `PartialDate` keeps the
//! precision that was actually written and orders values as a total order
//! on `(year, month, day)` where an unspecified component sorts before any
//! specified one: `2020 < 2020-01 < 2020-01-01 < 2020-02`.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A date known to year, year-month, or full year-month-day precision.
///
/// Field order matters: the derived `Ord` compares year, then month, then
/// day, and `None < Some(_)` for each optional component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartialDate {
    pub year: i32,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl PartialDate {
    pub fn year(year: i32) -> Self {
        Self { year, month: None, day: None }
    }

    pub fn year_month(year: i32, month: u32) -> Self {
        Self { year, month: Some(month), day: None }
    }

    pub fn full(year: i32, month: u32, day: u32) -> Self {
        Self { year, month: Some(month), day: Some(day) }
    }

    /// Parse one of the accepted forms: `YYYY-MM-DD`, `MM/DD/YYYY`,
    /// `YYYY-MM` or `YYYY`.
    ///
    /// Month and day accept one or two digits, the year exactly four.
    /// Out-of-range months and days that do not exist in the given
    /// month/year (leap years included) are rejected.
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        if s.is_empty() {
            return None;
        }

        let date = if s.contains('/') {
            parse_us(s)?
        } else {
            parse_iso(s)?
        };

        date.is_valid().then_some(date)
    }

    /// True when every specified component exists on the calendar.
    pub fn is_valid(&self) -> bool {
        match (self.month, self.day) {
            (None, None) => true,
            (Some(m), None) => (1..=12).contains(&m),
            (Some(m), Some(d)) => NaiveDate::from_ymd_opt(self.year, m, d).is_some(),
            (None, Some(_)) => false,
        }
    }

    /// Full calendar date, defaulting a missing month or day to 1.
    pub fn to_calendar_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month.unwrap_or(1), self.day.unwrap_or(1))
    }

    pub fn is_full(&self) -> bool {
        self.month.is_some() && self.day.is_some()
    }
}

impl fmt::Display for PartialDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.month, self.day) {
            (Some(m), Some(d)) => write!(f, "{:04}-{:02}-{:02}", self.year, m, d),
            (Some(m), None) => write!(f, "{:04}-{:02}", self.year, m),
            _ => write!(f, "{:04}", self.year),
        }
    }
}

impl From<NaiveDate> for PartialDate {
    fn from(date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self::full(date.year(), date.month(), date.day())
    }
}

fn is_digits(s: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_iso(s: &str) -> Option<PartialDate> {
    let parts: Vec<&str> = s.split('-').collect();
    let year_str = parts.first()?;
    if !is_digits(year_str, 4, 4) {
        return None;
    }
    let year: i32 = year_str.parse().ok()?;

    match parts.as_slice() {
        [_] => Some(PartialDate::year(year)),
        [_, m] if is_digits(m, 1, 2) => Some(PartialDate::year_month(year, m.parse().ok()?)),
        [_, m, d] if is_digits(m, 1, 2) && is_digits(d, 1, 2) => {
            Some(PartialDate::full(year, m.parse().ok()?, d.parse().ok()?))
        }
        _ => None,
    }
}

fn parse_us(s: &str) -> Option<PartialDate> {
    let parts: Vec<&str> = s.split('/').collect();
    match parts.as_slice() {
        [m, d, y] if is_digits(m, 1, 2) && is_digits(d, 1, 2) && is_digits(y, 4, 4) => Some(
            PartialDate::full(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?),
        ),
        _ => None,
    }
}

/// Normalize any accepted date form to a canonical `YYYY-MM-DD` string.
///
/// Year-only and year-month inputs default to the first month/day.
/// Returns `None` for empty, unsupported or calendar-invalid input.
pub fn normalize_date(input: &str) -> Option<String> {
    PartialDate::parse(input)
        .and_then(|d| d.to_calendar_date())
        .map(|d| d.format("%Y-%m-%d").to_string())
}

/// Parse a normalized or raw date string straight to a calendar date.
pub fn calendar_date(input: &str) -> Option<NaiveDate> {
    PartialDate::parse(input).and_then(|d| d.to_calendar_date())
}

/// Absolute distance in days between two calendar dates.
pub fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    (a - b).num_days().abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_all_accepted_forms() {
        assert_eq!(normalize_date("2023-10-26").as_deref(), Some("2023-10-26"));
        assert_eq!(normalize_date("1999-01-01").as_deref(), Some("1999-01-01"));
        assert_eq!(normalize_date("2020").as_deref(), Some("2020-01-01"));
        assert_eq!(normalize_date("2021-05").as_deref(), Some("2021-05-01"));
        assert_eq!(normalize_date("05/01/2022").as_deref(), Some("2022-05-01"));
        assert_eq!(normalize_date("10/26/2023").as_deref(), Some("2023-10-26"));
        assert_eq!(normalize_date("5/1/2022").as_deref(), Some("2022-05-01"));
    }

    #[test]
    fn rejects_unsupported_formats() {
        for input in ["gibberish", "26-10-2023", "October 26, 2023", "2023/10/26", "", "  "] {
            assert_eq!(normalize_date(input), None, "expected None for {input:?}");
        }
    }

    #[test]
    fn rejects_calendar_invalid_dates() {
        for input in ["2023-13-01", "2023-02-30", "04/31/2023", "02/29/2023", "2023-00", "2023-01-00"] {
            assert_eq!(normalize_date(input), None, "expected None for {input:?}");
        }
    }

    #[test]
    fn accepts_leap_days() {
        assert_eq!(normalize_date("2024-02-29").as_deref(), Some("2024-02-29"));
        assert_eq!(normalize_date("02/29/2020").as_deref(), Some("2020-02-29"));
    }

    #[test]
    fn unspecified_components_sort_first() {
        let y = PartialDate::year(2020);
        let ym = PartialDate::year_month(2020, 1);
        let ymd = PartialDate::full(2020, 1, 1);
        let later = PartialDate::year_month(2020, 2);

        assert!(y < ym);
        assert!(ym < ymd);
        assert!(ymd < later);
        assert!(PartialDate::full(2019, 12, 31) < y);
    }

    #[test]
    fn same_precision_same_value_is_equal() {
        let a = PartialDate::year(2020);
        let b = PartialDate::year(2020);
        assert!(!(a < b) && !(b < a));
        assert_eq!(a.cmp(&b), std::cmp::Ordering::Equal);
    }

    #[test]
    fn display_keeps_precision() {
        assert_eq!(PartialDate::year(2020).to_string(), "2020");
        assert_eq!(PartialDate::year_month(2020, 5).to_string(), "2020-05");
        assert_eq!(PartialDate::full(2020, 5, 3).to_string(), "2020-05-03");
    }

    #[test]
    fn us_form_parses_to_full_precision() {
        let parsed = PartialDate::parse("12/03/2021").unwrap();
        assert!(parsed.is_full());
        assert_eq!(parsed, PartialDate::full(2021, 12, 3));
    }

    #[test]
    fn day_distance_is_symmetric() {
        let a = calendar_date("2020-01-01").unwrap();
        let b = calendar_date("2020-01-20").unwrap();
        assert_eq!(days_between(a, b), 19);
        assert_eq!(days_between(b, a), 19);
    }
}
