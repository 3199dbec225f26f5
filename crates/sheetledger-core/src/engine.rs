//! Balance reconstruction by full-history replay
//!
//! Every snapshot is computed from scratch over all transactions. The sheet
//! can be edited by hand at any time, so no running balance is kept.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sheetledger_sheet::{parse_quantity, DateNormalizer};
use std::sync::Arc;

use crate::classifier::LedgerClassifier;
use crate::models::{AccountSnapshot, Transaction};
use crate::types::{Direction, LedgerKind, Period};

/// Sums for the requested month
#[derive(Debug, Default)]
struct CurrentTotals {
    advanced_account: Decimal,
    advanced_cash: Decimal,
    account_expenses: Decimal,
    cash_expenses: Decimal,
    fuel_liters: f64,
    count: usize,
}

/// Account-ledger sums for every earlier month
#[derive(Debug, Default)]
struct PriorTotals {
    account_income: Decimal,
    account_expense: Decimal,
}

/// Add `tx.amount` to `sum`, leaving `sum` untouched when it would overflow
fn add_or_skip(sum: &mut Decimal, tx: &Transaction) -> bool {
    match sum.checked_add(tx.amount) {
        Some(total) => {
            *sum = total;
            true
        }
        None => {
            log::warn!("Row {}: amount {} overflows the running total, skipped", tx.row_position, tx.amount);
            false
        }
    }
}

/// Rebuilds month snapshots from a transaction list
#[derive(Debug, Clone)]
pub struct BalanceEngine {
    classifier: Arc<LedgerClassifier>,
    normalizer: Arc<DateNormalizer>,
}

impl BalanceEngine {
    pub fn new(classifier: Arc<LedgerClassifier>, normalizer: Arc<DateNormalizer>) -> Self {
        Self { classifier, normalizer }
    }

    pub fn normalizer(&self) -> &DateNormalizer {
        &self.normalizer
    }

    pub fn classifier(&self) -> &LedgerClassifier {
        &self.classifier
    }

    /// Compute the snapshot for `period`
    pub fn reconstruct(&self, transactions: &[Transaction], period: Period) -> AccountSnapshot {
        self.reconstruct_at(transactions, period, Utc::now())
    }

    /// Compute the snapshot for `period`, stamping it with `computed_at`
    pub fn reconstruct_at(
        &self,
        transactions: &[Transaction],
        period: Period,
        computed_at: DateTime<Utc>,
    ) -> AccountSnapshot {
        let mut current = CurrentTotals::default();
        let mut prior = PriorTotals::default();
        let mut skipped = 0usize;

        for tx in transactions {
            let Some(date) = tx.resolve_date(&self.normalizer) else {
                log::debug!("Row {}: unresolvable date {:?}, skipped", tx.row_position, tx.date);
                skipped += 1;
                continue;
            };

            let class = self.classifier.classify(tx);
            if period.contains(&date) {
                let sum = match (class.direction, class.ledger) {
                    (Direction::Income, LedgerKind::Account) => &mut current.advanced_account,
                    (Direction::Income, LedgerKind::Cash) => &mut current.advanced_cash,
                    (Direction::Expense, LedgerKind::Account) => &mut current.account_expenses,
                    (Direction::Expense, LedgerKind::Cash) => &mut current.cash_expenses,
                };
                if !add_or_skip(sum, tx) {
                    skipped += 1;
                    continue;
                }
                current.count += 1;
                if class.direction == Direction::Expense && self.classifier.is_fuel(tx) {
                    current.fuel_liters += tx.quantity.as_deref().map(parse_quantity).unwrap_or(0.0);
                }
            } else if period.is_after(&date) && class.ledger == LedgerKind::Account {
                // cash does not carry over between months
                let sum = match class.direction {
                    Direction::Income => &mut prior.account_income,
                    Direction::Expense => &mut prior.account_expense,
                };
                if !add_or_skip(sum, tx) {
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            log::debug!("Snapshot {}: {} transaction(s) skipped", period, skipped);
        }

        let beginning_balance = prior.account_income - prior.account_expense;
        // differences of non-negative sums cannot overflow; their sums can
        let current_balance =
            beginning_balance.saturating_add(current.advanced_account - current.account_expenses);

        AccountSnapshot {
            month: period.month,
            year: period.year,
            beginning_balance,
            total_advanced_account: current.advanced_account,
            total_advanced_cash: current.advanced_cash,
            account_expenses: current.account_expenses,
            cash_expenses: current.cash_expenses,
            current_balance,
            account_remaining: current_balance,
            cash_remaining: current.advanced_cash - current.cash_expenses,
            total_expense: current.account_expenses.saturating_add(current.cash_expenses),
            total_fuel_liters: current.fuel_liters,
            transaction_count: current.count,
            computed_at,
        }
    }

    /// Transactions dated inside `period`, in input order
    pub fn in_period<'a>(
        &'a self,
        transactions: &'a [Transaction],
        period: Period,
    ) -> impl Iterator<Item = &'a Transaction> + 'a {
        transactions.iter().filter(move |tx| {
            tx.resolve_date(&self.normalizer)
                .map(|date| period.contains(&date))
                .unwrap_or(false)
        })
    }
}

impl Default for BalanceEngine {
    fn default() -> Self {
        Self::new(Arc::new(LedgerClassifier::default()), Arc::new(DateNormalizer::default()))
    }
}
