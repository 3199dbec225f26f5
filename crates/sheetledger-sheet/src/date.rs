//! Date token normalization
//!
//! Sheet dates arrive as spreadsheet serial numbers, `D/M/Y`, `Y-M-D`
//! or whatever else a user typed. [`DateNormalizer`] runs an ordered list
//! of [`DateStrategy`] parsers and keeps the first hit.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

/// Days between the spreadsheet epoch (1899-12-30) and 1970-01-01
pub const SERIAL_EPOCH_OFFSET: i64 = 25569;

/// A calendar triple as written in the sheet
///
/// Slash and dash tokens are only range-checked, so a triple such as
/// 31/02 survives; period filtering only looks at month and year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CalendarDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl CalendarDate {
    pub fn new(day: u32, month: u32, year: i32) -> Self {
        Self { year, month, day }
    }

    /// Get the date as NaiveDate, if it names a real day
    pub fn to_naive(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }

    /// `(year, month)` key used for period comparisons
    pub fn month_key(&self) -> (i32, u32) {
        (self.year, self.month)
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(date: NaiveDate) -> Self {
        CalendarDate::new(date.day(), date.month(), date.year())
    }
}

impl std::fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}/{:02}/{}", self.day, self.month, self.year)
    }
}

/// One way of reading a date token
pub trait DateStrategy: Send + Sync {
    /// Short name used in debug logs
    fn name(&self) -> &'static str;

    /// Parse a trimmed, non-empty token
    fn parse(&self, token: &str) -> Option<CalendarDate>;
}

/// Spreadsheet serial day number, e.g. `45762`
#[derive(Debug, Default)]
pub struct SerialNumberDate;

impl DateStrategy for SerialNumberDate {
    fn name(&self) -> &'static str {
        "serial"
    }

    fn parse(&self, token: &str) -> Option<CalendarDate> {
        let serial: f64 = token.parse().ok()?;
        if !serial.is_finite() {
            return None;
        }
        serial_to_date(serial).map(CalendarDate::from)
    }
}

/// Convert a serial day number to a date; the fraction is the time of day
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    let days = serial.floor();
    if days.abs() > i32::MAX as f64 {
        return None;
    }
    let delta = TimeDelta::try_days(days as i64 - SERIAL_EPOCH_OFFSET)?;
    NaiveDate::from_ymd_opt(1970, 1, 1)?.checked_add_signed(delta)
}

/// `D/M/Y`
#[derive(Debug, Default)]
pub struct SlashDate;

impl DateStrategy for SlashDate {
    fn name(&self) -> &'static str {
        "slash"
    }

    fn parse(&self, token: &str) -> Option<CalendarDate> {
        let parts: Vec<&str> = token.split('/').collect();
        if parts.len() != 3 {
            return None;
        }
        checked_triple(parts[0], parts[1], parts[2])
    }
}

/// `Y-M-D`
#[derive(Debug, Default)]
pub struct DashDate;

impl DateStrategy for DashDate {
    fn name(&self) -> &'static str {
        "dash"
    }

    fn parse(&self, token: &str) -> Option<CalendarDate> {
        let parts: Vec<&str> = token.split('-').collect();
        if parts.len() != 3 {
            return None;
        }
        checked_triple(parts[2], parts[1], parts[0])
    }
}

fn checked_triple(day: &str, month: &str, year: &str) -> Option<CalendarDate> {
    let day: u32 = day.trim().parse().ok()?;
    let month: u32 = month.trim().parse().ok()?;
    let year: i32 = year.trim().parse().ok()?;
    if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
        return None;
    }
    Some(CalendarDate::new(day, month, year))
}

/// Catch-all for ISO date-times and spelled-out dates
#[derive(Debug, Default)]
pub struct GenericDate;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%Y.%m.%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%a, %d %b %Y",
];

impl DateStrategy for GenericDate {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn parse(&self, token: &str) -> Option<CalendarDate> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(token) {
            return Some(dt.date_naive().into());
        }
        if let Ok(dt) = DateTime::parse_from_rfc2822(token) {
            return Some(dt.date_naive().into());
        }
        for format in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(token, format) {
                return Some(dt.date().into());
            }
        }
        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(token, format) {
                return Some(date.into());
            }
        }
        None
    }
}

/// Ordered chain of date strategies
pub struct DateNormalizer {
    strategies: Vec<Box<dyn DateStrategy>>,
}

impl Default for DateNormalizer {
    fn default() -> Self {
        Self {
            strategies: vec![
                Box::new(SerialNumberDate),
                Box::new(SlashDate),
                Box::new(DashDate),
                Box::new(GenericDate),
            ],
        }
    }
}

impl std::fmt::Debug for DateNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.strategies.iter().map(|s| s.name()).collect();
        f.debug_struct("DateNormalizer").field("strategies", &names).finish()
    }
}

impl DateNormalizer {
    /// An empty chain; add strategies with [`DateNormalizer::with_strategy`]
    pub fn empty() -> Self {
        Self { strategies: Vec::new() }
    }

    /// Append a strategy after the existing ones
    pub fn with_strategy(mut self, strategy: Box<dyn DateStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Resolve a token, or `None` when no strategy accepts it
    pub fn normalize(&self, token: &str) -> Option<CalendarDate> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        for strategy in &self.strategies {
            if let Some(date) = strategy.parse(token) {
                log::trace!("date token {:?} resolved by {} strategy", token, strategy.name());
                return Some(date);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn april_15() -> CalendarDate {
        CalendarDate::new(15, 4, 2025)
    }

    #[test]
    fn test_three_encodings_agree() {
        let normalizer = DateNormalizer::default();
        assert_eq!(normalizer.normalize("15/04/2025"), Some(april_15()));
        assert_eq!(normalizer.normalize("2025-04-15"), Some(april_15()));
        assert_eq!(normalizer.normalize("45762"), Some(april_15()));
    }

    #[test]
    fn test_serial_fraction_is_time_of_day() {
        let normalizer = DateNormalizer::default();
        assert_eq!(normalizer.normalize("45762.75"), Some(april_15()));
        assert_eq!(normalizer.normalize("25569"), Some(CalendarDate::new(1, 1, 1970)));
    }

    #[test]
    fn test_serial_rejects_non_finite() {
        assert_eq!(SerialNumberDate.parse("inf"), None);
        assert_eq!(SerialNumberDate.parse("NaN"), None);
        assert_eq!(SerialNumberDate.parse("1e300"), None);
    }

    #[test]
    fn test_unparsable_token() {
        let normalizer = DateNormalizer::default();
        assert_eq!(normalizer.normalize("not-a-date"), None);
        assert_eq!(normalizer.normalize(""), None);
        assert_eq!(normalizer.normalize("   "), None);
    }

    #[test]
    fn test_slash_bounds() {
        assert_eq!(SlashDate.parse("32/01/2025"), None);
        assert_eq!(SlashDate.parse("10/13/2025"), None);
        assert_eq!(SlashDate.parse("0/5/2025"), None);
        assert_eq!(SlashDate.parse("1/2"), None);
        assert_eq!(SlashDate.parse("1/2/3/4"), None);
        // only range-checked, not calendar-checked
        assert_eq!(SlashDate.parse("31/02/2025"), Some(CalendarDate::new(31, 2, 2025)));
    }

    #[test]
    fn test_dash_order() {
        assert_eq!(DashDate.parse("2026-01-09"), Some(CalendarDate::new(9, 1, 2026)));
        assert_eq!(DashDate.parse("09-01-2026"), None);
    }

    #[test]
    fn test_generic_fallback() {
        let normalizer = DateNormalizer::default();
        assert_eq!(normalizer.normalize("2025-04-15T08:30:00Z"), Some(april_15()));
        assert_eq!(normalizer.normalize("2025-04-15T08:30:00.000"), Some(april_15()));
        assert_eq!(normalizer.normalize("15/04/2025 21:10:05"), Some(april_15()));
        assert_eq!(normalizer.normalize("April 15, 2025"), Some(april_15()));
        assert_eq!(normalizer.normalize("15.04.2025"), Some(april_15()));
        assert_eq!(normalizer.normalize("2025/04/15"), Some(april_15()));
    }

    #[test]
    fn test_chain_is_extensible() {
        struct Today;
        impl DateStrategy for Today {
            fn name(&self) -> &'static str {
                "today"
            }
            fn parse(&self, token: &str) -> Option<CalendarDate> {
                (token == "today").then(|| CalendarDate::new(1, 1, 2000))
            }
        }

        let normalizer = DateNormalizer::default().with_strategy(Box::new(Today));
        assert_eq!(normalizer.normalize("today"), Some(CalendarDate::new(1, 1, 2000)));
        assert_eq!(DateNormalizer::empty().normalize("2025-04-15"), None);
    }

    #[test]
    fn test_calendar_ordering_by_month() {
        let dec = CalendarDate::new(31, 12, 2025);
        let jan = CalendarDate::new(1, 1, 2026);
        assert!(dec < jan);
        assert!(dec.month_key() < jan.month_key());
        assert_eq!(jan.to_string(), "01/01/2026");
        assert_eq!(CalendarDate::new(31, 2, 2025).to_naive(), None);
    }
}
