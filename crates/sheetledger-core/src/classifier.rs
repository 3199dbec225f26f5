//! Ledger and direction rules shared by mapping, re-saving and aggregation

use sheetledger_config::LedgerConfig;
use std::collections::HashSet;

use crate::models::Transaction;
use crate::types::{Classification, Direction, LedgerKind};

/// Trim, lowercase and collapse inner whitespace
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn normalized_set(items: &[String]) -> HashSet<String> {
    items.iter().map(|s| normalize(s)).filter(|s| !s.is_empty()).collect()
}

/// Decides direction and ledger for rows and transactions
#[derive(Debug, Clone)]
pub struct LedgerClassifier {
    income_flags: HashSet<String>,
    income_categories: HashSet<String>,
    cash_payment_methods: HashSet<String>,
    cash_category_keywords: Vec<String>,
    mirror_categories: HashSet<String>,
    fuel_category: String,
    fuel_subcategory: String,
}

impl Default for LedgerClassifier {
    fn default() -> Self {
        Self::new(&LedgerConfig::default())
    }
}

impl LedgerClassifier {
    pub fn new(config: &LedgerConfig) -> Self {
        Self {
            income_flags: normalized_set(&config.income_flags),
            income_categories: normalized_set(&config.income_categories),
            cash_payment_methods: normalized_set(&config.cash_payment_methods),
            cash_category_keywords: config
                .cash_category_keywords
                .iter()
                .map(|k| normalize(k))
                .filter(|k| !k.is_empty())
                .collect(),
            mirror_categories: normalized_set(&config.mirror_categories),
            fuel_category: normalize(&config.fuel_category),
            fuel_subcategory: config.fuel_subcategory.trim().to_string(),
        }
    }

    /// Direction from a raw flag cell, with the category override applied
    pub fn direction(&self, flag: &str, category: &str) -> Direction {
        let stored = if self.income_flags.contains(&normalize(flag)) {
            Direction::Income
        } else {
            Direction::Expense
        };
        self.apply_override(stored, category)
    }

    /// Force income for advance and refund categories
    ///
    /// Every path that derives a direction goes through here.
    pub fn apply_override(&self, direction: Direction, category: &str) -> Direction {
        if self.income_categories.contains(&normalize(category)) {
            Direction::Income
        } else {
            direction
        }
    }

    /// Cash when the payment method is a cash token or the category mentions cash
    pub fn ledger(&self, payment_method: Option<&str>, category: &str) -> LedgerKind {
        let by_method = payment_method
            .map(|m| self.cash_payment_methods.contains(&normalize(m)))
            .unwrap_or(false);
        let category = normalize(category);
        let by_category = self
            .cash_category_keywords
            .iter()
            .any(|keyword| category.contains(keyword.as_str()));

        if by_method || by_category {
            LedgerKind::Cash
        } else {
            LedgerKind::Account
        }
    }

    pub fn classify(&self, tx: &Transaction) -> Classification {
        Classification {
            ledger: self.ledger(tx.payment_method.as_deref(), &tx.category),
            direction: self.apply_override(tx.direction, &tx.category),
        }
    }

    /// Fuel purchase: vehicle category and the exact fuel sub-category
    pub fn is_fuel(&self, tx: &Transaction) -> bool {
        normalize(&tx.category).contains(self.fuel_category.as_str())
            && tx.sub_category.as_deref().map(str::trim) == Some(self.fuel_subcategory.as_str())
    }

    /// Rows of these categories are also written to the advance sheet
    pub fn is_mirrored(&self, category: &str) -> bool {
        self.mirror_categories.contains(&normalize(category))
    }
}
