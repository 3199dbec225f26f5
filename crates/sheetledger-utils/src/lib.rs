//! Formatting helpers for ledger output

use rust_decimal::Decimal;

/// Format a number with thousands separators
///
/// Works on the textual form, so a leading sign and a fractional part are
/// kept as they are: `-1234567.5` becomes `-1,234,567.5`.
pub fn format_number<T: ToString>(n: T) -> String {
    let s = n.to_string();
    let (sign, unsigned) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.as_str()),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };

    let mut grouped = String::new();
    let mut count = 0;
    for c in integer.chars().rev() {
        if count == 3 {
            grouped.push(',');
            count = 0;
        }
        grouped.push(c);
        count += 1;
    }
    let grouped: String = grouped.chars().rev().collect();

    match fraction {
        Some(fraction) => format!("{}{}.{}", sign, grouped, fraction),
        None => format!("{}{}", sign, grouped),
    }
}

/// Amount with separators and a currency label, e.g. `8,150,000 VND`
pub fn format_amount(amount: Decimal, currency: &str) -> String {
    format!("{} {}", format_number(amount.normalize()), currency)
}

/// Liters with two decimals
pub fn format_liters(liters: f64) -> String {
    format!("{:.2} L", liters)
}
