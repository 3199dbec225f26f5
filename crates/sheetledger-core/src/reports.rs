//! Report structures built on top of the balance engine

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::engine::BalanceEngine;
use crate::models::Transaction;
use crate::types::{Direction, Period};

/// One category's share of a month's expenses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub category: String,
    pub amount: Decimal,
    pub percentage: f64,
    pub count: usize,
}

/// Expense breakdown for a month, largest category first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryReport {
    pub month: u32,
    pub year: i32,
    pub entries: Vec<CategoryBreakdown>,
    pub total: Decimal,
    pub currency: String,
}

/// Income and expenses of one month, both ledgers together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub month: u32,
    pub income: Decimal,
    pub expenses: Decimal,
    pub net_income: Decimal,
    pub transaction_count: usize,
}

/// Twelve monthly summaries for a year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearOverview {
    pub year: i32,
    pub summaries: Vec<MonthlySummary>,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub net_income: Decimal,
}

/// Group a month's expenses by category
pub fn category_report(
    engine: &BalanceEngine,
    transactions: &[Transaction],
    period: Period,
    currency: &str,
) -> CategoryReport {
    let mut groups: HashMap<String, (Decimal, usize)> = HashMap::new();
    let mut total = Decimal::ZERO;

    for tx in engine.in_period(transactions, period) {
        if engine.classifier().classify(tx).direction != Direction::Expense {
            continue;
        }
        let label = if tx.category.is_empty() {
            "Uncategorized".to_string()
        } else {
            tx.category.clone()
        };
        let Some(new_total) = total.checked_add(tx.amount) else {
            log::warn!("Row {}: amount {} overflows the month total, skipped", tx.row_position, tx.amount);
            continue;
        };
        total = new_total;
        // a group never exceeds the total
        let entry = groups.entry(label).or_insert((Decimal::ZERO, 0));
        entry.0 += tx.amount;
        entry.1 += 1;
    }

    let mut entries: Vec<CategoryBreakdown> = groups
        .into_iter()
        .map(|(category, (amount, count))| {
            let percentage = if total.is_zero() {
                0.0
            } else {
                (amount / total * Decimal::ONE_HUNDRED).to_f64().unwrap_or(0.0)
            };
            CategoryBreakdown { category, amount, percentage, count }
        })
        .collect();
    entries.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.category.cmp(&b.category)));

    CategoryReport {
        month: period.month,
        year: period.year,
        entries,
        total,
        currency: currency.to_string(),
    }
}

/// Replay every month of `year`
pub fn year_overview(
    engine: &BalanceEngine,
    transactions: &[Transaction],
    year: i32,
    computed_at: DateTime<Utc>,
) -> YearOverview {
    let summaries: Vec<MonthlySummary> = (1..=12)
        .filter_map(|month| Period::new(month, year))
        .map(|period| {
            let snapshot = engine.reconstruct_at(transactions, period, computed_at);
            let income = snapshot.total_advanced_account.saturating_add(snapshot.total_advanced_cash);
            MonthlySummary {
                month: period.month,
                income,
                expenses: snapshot.total_expense,
                net_income: income - snapshot.total_expense,
                transaction_count: snapshot.transaction_count,
            }
        })
        .collect();

    let total_income = summaries.iter().fold(Decimal::ZERO, |acc, s| acc.saturating_add(s.income));
    let total_expenses = summaries.iter().fold(Decimal::ZERO, |acc, s| acc.saturating_add(s.expenses));

    YearOverview {
        year,
        summaries,
        total_income,
        total_expenses,
        net_income: total_income - total_expenses,
    }
}
