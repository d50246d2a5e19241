use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;
use std::ops::RangeInclusive;

use crate::error::AutomationError;

const MONTH_ABBRS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Years the gallery picker can show; also keeps month arithmetic in range.
pub const YEARS: RangeInclusive<i32> = 1..=9999;

/// A calendar month. Field order makes the derived `Ord` chronological.
///
/// Only constructed through [`YearMonth::new`], so `month` is always 1-12 and
/// `year` always within [`YEARS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, AutomationError> {
        if !(1..=12).contains(&month) {
            return Err(AutomationError::InvalidInput(format!(
                "month must be 1-12, got {month}"
            )));
        }
        if !YEARS.contains(&year) {
            return Err(AutomationError::InvalidInput(format!(
                "year must be {}-{}, got {year}",
                YEARS.start(),
                YEARS.end()
            )));
        }
        Ok(Self { year, month })
    }

    /// The month containing `date`, with the year clamped into [`YEARS`].
    pub(crate) fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year().clamp(*YEARS.start(), *YEARS.end()),
            month: date.month(),
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Three-letter English abbreviation as printed on the picker cells.
    pub fn abbr(self) -> &'static str {
        MONTH_ABBRS[(self.month - 1) as usize]
    }

    /// `<base>_<YYYY>_<MM>`, the label used for this month's files.
    pub fn album_label(self, base: &str) -> String {
        format!("{}_{}_{:02}", base, self.year, self.month)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.month, self.year)
    }
}

impl std::str::FromStr for YearMonth {
    type Err = AutomationError;

    /// Parses `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| AutomationError::InvalidInput(format!("expected YYYY-MM, got \"{s}\"")))?;
        let year = parse_number(year, "year")?;
        let month = parse_number(month, "month")?;
        Self::new(year, month)
    }
}

pub(crate) fn parse_number<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T, AutomationError> {
    raw.trim()
        .parse()
        .map_err(|_| AutomationError::InvalidInput(format!("{what} \"{}\" is not a number", raw.trim())))
}

/// Inclusive month range, iterated oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthRange {
    pub start: YearMonth,
    pub end: YearMonth,
}

impl MonthRange {
    pub fn new(start: YearMonth, end: YearMonth) -> Result<Self, AutomationError> {
        if start > end {
            return Err(AutomationError::InvalidInput(format!(
                "start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn iter(&self) -> MonthIter {
        MonthIter {
            current: self.start,
            end: self.end,
        }
    }

    /// Number of months in the range, never zero.
    pub fn month_count(&self) -> usize {
        let span = (self.end.year - self.start.year) * 12 + self.end.month as i32
            - self.start.month as i32;
        span as usize + 1
    }
}

impl IntoIterator for &MonthRange {
    type Item = YearMonth;
    type IntoIter = MonthIter;

    fn into_iter(self) -> MonthIter {
        self.iter()
    }
}

/// Navigation state over a [`MonthRange`].
#[derive(Debug, Clone)]
pub struct MonthIter {
    current: YearMonth,
    end: YearMonth,
}

impl Iterator for MonthIter {
    type Item = YearMonth;

    fn next(&mut self) -> Option<YearMonth> {
        if self.current > self.end {
            return None;
        }
        let out = self.current;
        self.current = self.current.next();
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    #[test]
    fn iterates_across_year_boundary() {
        let range = MonthRange::new(ym(2024, 11), ym(2025, 2)).unwrap();
        let months: Vec<_> = range.iter().collect();
        assert_eq!(
            months,
            vec![ym(2024, 11), ym(2024, 12), ym(2025, 1), ym(2025, 2)]
        );
        assert_eq!(range.month_count(), 4);
    }

    #[test]
    fn single_month_range() {
        let range = MonthRange::new(ym(2025, 6), ym(2025, 6)).unwrap();
        assert_eq!(range.iter().count(), 1);
        assert_eq!(range.month_count(), 1);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = MonthRange::new(ym(2025, 3), ym(2025, 1)).unwrap_err();
        assert!(matches!(err, AutomationError::InvalidInput(_)));
    }

    #[test]
    fn month_out_of_bounds_is_rejected() {
        assert!(YearMonth::new(2025, 0).is_err());
        assert!(YearMonth::new(2025, 13).is_err());
    }

    #[test]
    fn year_out_of_bounds_is_rejected() {
        assert!(YearMonth::new(0, 1).is_err());
        assert!(YearMonth::new(10_000, 1).is_err());
        assert!(YearMonth::new(i32::MAX, 12).is_err());
        assert!("2147483647-12".parse::<YearMonth>().is_err());
    }

    #[test]
    fn iteration_ends_at_the_last_representable_month() {
        let range = MonthRange::new(ym(9999, 11), ym(9999, 12)).unwrap();
        let months: Vec<_> = range.iter().take(5).collect();
        assert_eq!(months, vec![ym(9999, 11), ym(9999, 12)]);
        assert_eq!(range.month_count(), 2);
    }

    #[test]
    fn widest_range_counts_every_month() {
        let range = MonthRange::new(ym(1, 1), ym(9999, 12)).unwrap();
        assert_eq!(range.month_count(), 9999 * 12);
    }

    #[test]
    fn containing_clamps_the_year() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        assert_eq!(YearMonth::containing(date), ym(2025, 3));
        let far = NaiveDate::from_ymd_opt(12_000, 7, 1).unwrap();
        assert_eq!(YearMonth::containing(far), ym(9999, 7));
    }

    #[test]
    fn parses_year_dash_month() {
        assert_eq!("2024-07".parse::<YearMonth>().unwrap(), ym(2024, 7));
        assert!("2024/07".parse::<YearMonth>().is_err());
        assert!("2024-xx".parse::<YearMonth>().is_err());
    }

    #[test]
    fn labels_and_abbreviations() {
        assert_eq!(ym(2025, 3).album_label("Kid_Photos"), "Kid_Photos_2025_03");
        assert_eq!(ym(2025, 12).abbr(), "Dec");
        assert_eq!(ym(2025, 1).to_string(), "1/2025");
    }
}
