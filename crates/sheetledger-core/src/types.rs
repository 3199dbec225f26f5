//! Basic types for the core ledger module

use serde::{Deserialize, Serialize};
use sheetledger_sheet::CalendarDate;

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Money coming in (salary, advances, refunds)
    Income,
    /// Money going out
    Expense,
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Expense
    }
}

impl std::str::FromStr for Direction {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(Direction::Income),
            "expense" => Ok(Direction::Expense),
            _ => Err(format!("Invalid direction: {}", s)),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Income => write!(f, "income"),
            Direction::Expense => write!(f, "expense"),
        }
    }
}

/// Which of the two parallel balance tracks a transaction belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerKind {
    /// Bank account
    Account,
    /// Cash on hand
    Cash,
}

impl Default for LedgerKind {
    fn default() -> Self {
        LedgerKind::Account
    }
}

impl std::fmt::Display for LedgerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerKind::Account => write!(f, "account"),
            LedgerKind::Cash => write!(f, "cash"),
        }
    }
}

/// A calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    /// `None` unless `month` is in 1..=12
    pub fn new(month: u32, year: i32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// The month before; January wraps to December of the previous year
    pub fn predecessor(&self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { year: self.year, month: self.month - 1 }
        }
    }

    /// Check if a date falls inside this month
    pub fn contains(&self, date: &CalendarDate) -> bool {
        date.month_key() == (self.year, self.month)
    }

    /// Check if a date falls strictly before the first day of this month
    pub fn is_after(&self, date: &CalendarDate) -> bool {
        date.month_key() < (self.year, self.month)
    }

    /// Cache scope key for this month's rows
    pub fn cache_key(&self) -> String {
        format!("transactions-{}-{}", self.month, self.year)
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

/// Outcome of classifying one transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub ledger: LedgerKind,
    pub direction: Direction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_bounds() {
        assert!(Period::new(0, 2025).is_none());
        assert!(Period::new(13, 2025).is_none());
        assert_eq!(Period::new(12, 2025).unwrap().to_string(), "12/2025");
    }

    #[test]
    fn test_january_predecessor_wraps() {
        let jan = Period::new(1, 2026).unwrap();
        assert_eq!(jan.predecessor(), Period::new(12, 2025).unwrap());
        assert_eq!(Period::new(7, 2025).unwrap().predecessor(), Period::new(6, 2025).unwrap());
    }

    #[test]
    fn test_period_membership() {
        let jan = Period::new(1, 2026).unwrap();
        let dec_31 = CalendarDate::new(31, 12, 2025);
        let jan_1 = CalendarDate::new(1, 1, 2026);

        assert!(jan.is_after(&dec_31));
        assert!(!jan.contains(&dec_31));
        assert!(jan.contains(&jan_1));
        assert!(!jan.is_after(&jan_1));
        assert!(!jan.is_after(&CalendarDate::new(1, 2, 2026)));
    }

    #[test]
    fn test_cache_key_format() {
        assert_eq!(Period::new(3, 2025).unwrap().cache_key(), "transactions-3-2025");
    }

    #[test]
    fn test_direction_from_str() {
        assert_eq!("Income".parse::<Direction>().unwrap(), Direction::Income);
        assert_eq!(" expense ".parse::<Direction>().unwrap(), Direction::Expense);
        assert!("sideways".parse::<Direction>().is_err());
        assert_eq!(Direction::default(), Direction::Expense);
        assert_eq!(LedgerKind::default(), LedgerKind::Account);
    }
}
