//! Core data models for the ledger

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sheetledger_sheet::{CalendarDate, DateNormalizer};

use super::types::{Direction, LedgerKind, Period};

/// One ledger entry mapped from a sheet row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// 1-based row in the backing sheet, for update/delete addressing only
    pub row_position: usize,
    /// Date token exactly as stored; see [`Transaction::resolve_date`]
    pub date: String,
    /// Category label (e.g. "Car expenses", "Restaurant")
    pub category: String,
    /// Optional refinement (e.g. "Fuel")
    pub sub_category: Option<String>,
    pub description: String,
    /// Non-negative amount; unparsable cells become zero
    pub amount: Decimal,
    pub direction: Direction,
    pub ledger: LedgerKind,
    /// Receipt file id, or the raw cell when no id could be extracted
    pub receipt_ref: Option<String>,
    /// Liters, for fuel purchases
    pub quantity: Option<String>,
    pub payment_method: Option<String>,
    pub note: Option<String>,
    /// Creation instant; mapping time if the sheet has none
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Resolve the stored date token
    pub fn resolve_date(&self, normalizer: &DateNormalizer) -> Option<CalendarDate> {
        normalizer.normalize(&self.date)
    }

    /// Get a summary string
    pub fn summary(&self) -> String {
        let label = if self.description.is_empty() {
            &self.category
        } else {
            &self.description
        };
        format!("{} - {} ({} {})", self.date, label, self.direction, self.amount)
    }
}

/// Input for creating or re-saving a transaction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub date: String,
    pub category: String,
    pub sub_category: Option<String>,
    pub description: String,
    pub amount: Decimal,
    pub direction: Direction,
    pub receipt_ref: Option<String>,
    pub quantity: Option<String>,
    pub payment_method: Option<String>,
    pub note: Option<String>,
}

/// Balances for one month, rebuilt from the full history on every request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub month: u32,
    pub year: i32,
    /// Account-ledger balance carried in from all earlier months
    pub beginning_balance: Decimal,
    /// Income this month on the account ledger
    pub total_advanced_account: Decimal,
    /// Income this month on the cash ledger
    pub total_advanced_cash: Decimal,
    pub account_expenses: Decimal,
    pub cash_expenses: Decimal,
    pub current_balance: Decimal,
    pub account_remaining: Decimal,
    pub cash_remaining: Decimal,
    pub total_expense: Decimal,
    pub total_fuel_liters: f64,
    /// Transactions dated in this month, zero-amount rows included
    pub transaction_count: usize,
    pub computed_at: DateTime<Utc>,
}

impl AccountSnapshot {
    /// All-zero snapshot returned when the sheet cannot be read
    pub fn zeroed(month: u32, year: i32, computed_at: DateTime<Utc>) -> Self {
        Self {
            month,
            year,
            beginning_balance: Decimal::ZERO,
            total_advanced_account: Decimal::ZERO,
            total_advanced_cash: Decimal::ZERO,
            account_expenses: Decimal::ZERO,
            cash_expenses: Decimal::ZERO,
            current_balance: Decimal::ZERO,
            account_remaining: Decimal::ZERO,
            cash_remaining: Decimal::ZERO,
            total_expense: Decimal::ZERO,
            total_fuel_liters: 0.0,
            transaction_count: 0,
            computed_at,
        }
    }

    pub fn period(&self) -> Option<Period> {
        Period::new(self.month, self.year)
    }
}
