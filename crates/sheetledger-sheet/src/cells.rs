//! Parsing helpers for individual sheet cells

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::date::SERIAL_EPOCH_OFFSET;

/// How amounts are written in the sheet
#[derive(Debug, Clone, PartialEq)]
pub struct AmountFormat {
    /// Grouping characters removed before parsing
    pub thousands_separators: Vec<char>,
    /// Fraction separator, if the sheet uses fractions at all
    pub decimal_separator: Option<char>,
}

impl Default for AmountFormat {
    fn default() -> Self {
        Self {
            thousands_separators: vec![',', '.'],
            decimal_separator: None,
        }
    }
}

impl AmountFormat {
    pub fn new(thousands_separators: Vec<char>, decimal_separator: Option<char>) -> Self {
        Self { thousands_separators, decimal_separator }
    }

    /// Parse the leading number of an amount cell
    ///
    /// Handles "9,000,000", "9.000.000", "850000đ" and " 1 200 ". Returns
    /// `None` when the cell does not start with a number.
    pub fn parse(&self, cell: &str) -> Option<Decimal> {
        let mut cleaned = String::with_capacity(cell.len());
        for c in cell.trim().chars() {
            if c.is_whitespace() || self.thousands_separators.contains(&c) {
                continue;
            }
            if Some(c) == self.decimal_separator {
                cleaned.push('.');
            } else {
                cleaned.push(c);
            }
        }

        let mut number = String::new();
        let mut has_digit = false;
        let mut has_point = false;
        for (i, c) in cleaned.chars().enumerate() {
            match c {
                '-' | '+' if i == 0 => number.push(c),
                '0'..='9' => {
                    has_digit = true;
                    number.push(c);
                }
                '.' if !has_point => {
                    has_point = true;
                    number.push(c);
                }
                _ => break,
            }
        }

        if !has_digit {
            return None;
        }
        let number = number.trim_end_matches('.');
        Decimal::from_str(number).ok()
    }

    /// Write an amount so that [`AmountFormat::parse`] reads it back unchanged
    ///
    /// `None` for a fractional amount when no decimal separator is configured.
    pub fn format(&self, amount: Decimal) -> Option<String> {
        let amount = amount.normalize();
        if amount.fract().is_zero() {
            return Some(amount.trunc().to_string());
        }
        let separator = self.decimal_separator?;
        Some(amount.to_string().replace('.', &separator.to_string()))
    }
}

/// Parse a quantity cell such as "35.5" or "35,5"; anything else is 0
pub fn parse_quantity(cell: &str) -> f64 {
    let normalized = cell.trim().replace(',', ".");
    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => value,
        _ => 0.0,
    }
}

/// Link shapes a receipt cell may hold; capture group 1 is the file id
const RECEIPT_PATTERNS: &[&str] = &[
    r"(?:drive|docs)\.google\.com/(?:file/)?d/([A-Za-z0-9_-]+)",
    r"(?:drive|docs)\.google\.com/(?:open|uc|thumbnail)\?(?:[^#\s]*&)?id=([A-Za-z0-9_-]+)",
    r"googleusercontent\.com/d/([A-Za-z0-9_-]+)",
];

/// Pull the file id out of a storage link, if the cell holds one
///
/// Recognized shapes:
/// - `https://drive.google.com/file/d/<id>/view`
/// - `https://drive.google.com/open?id=<id>` (also `uc?` and `thumbnail?`)
/// - `https://lh3.googleusercontent.com/d/<id>`
pub fn extract_receipt_id(cell: &str) -> Option<String> {
    static PATTERNS: once_cell::sync::OnceCell<Vec<Regex>> = once_cell::sync::OnceCell::new();
    // constant patterns, covered by test_receipt_patterns_compile
    let patterns = PATTERNS.get_or_init(|| {
        RECEIPT_PATTERNS
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect()
    });

    patterns
        .iter()
        .find_map(|re| re.captures(cell))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Best-effort creation instant of a row
pub fn parse_timestamp(cell: &str) -> Option<DateTime<Utc>> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(cell) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%d/%m/%Y %H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(cell, format) {
            return Some(dt.and_utc());
        }
    }
    // serial date-time, e.g. 45762.5 for noon
    let serial: f64 = cell.parse().ok()?;
    if !serial.is_finite() || serial.abs() > i32::MAX as f64 {
        return None;
    }
    let seconds = ((serial - SERIAL_EPOCH_OFFSET as f64) * 86_400.0).round() as i64;
    DateTime::<Utc>::UNIX_EPOCH.checked_add_signed(TimeDelta::try_seconds(seconds)?)
}
