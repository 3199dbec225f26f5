//! Sheet row ⇄ transaction mapping

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sheetledger_sheet::{extract_receipt_id, parse_timestamp, AmountFormat, PositionedRow, RawRow};
use std::sync::Arc;

use crate::classifier::LedgerClassifier;
use crate::error::{CoreError, CoreResult};
use crate::models::{Transaction, TransactionDraft};

fn optional(cell: &str) -> Option<String> {
    let cell = cell.trim();
    if cell.is_empty() {
        None
    } else {
        Some(cell.to_string())
    }
}

/// Turns raw rows into transactions and drafts back into rows
#[derive(Debug, Clone)]
pub struct RowMapper {
    classifier: Arc<LedgerClassifier>,
    amount_format: AmountFormat,
}

impl RowMapper {
    pub fn new(classifier: Arc<LedgerClassifier>, amount_format: AmountFormat) -> Self {
        Self { classifier, amount_format }
    }

    /// Map one row; `None` for blank rows only
    pub fn map_row(&self, row: &RawRow, row_position: usize) -> Option<Transaction> {
        self.map_row_at(row, row_position, Utc::now())
    }

    /// Map one row, using `now` when the row carries no timestamp
    pub fn map_row_at(&self, row: &RawRow, row_position: usize, now: DateTime<Utc>) -> Option<Transaction> {
        if row.is_blank() {
            return None;
        }

        let category = row.category.trim().to_string();
        let payment_method = optional(&row.payment_method);
        let direction = self.classifier.direction(&row.direction, &category);
        let ledger = self.classifier.ledger(payment_method.as_deref(), &category);

        Some(Transaction {
            row_position,
            date: row.date.trim().to_string(),
            sub_category: optional(&row.sub_category),
            description: row.description.trim().to_string(),
            amount: self.parse_amount(&row.amount, row_position),
            direction,
            ledger,
            receipt_ref: optional(&row.receipt).map(|cell| extract_receipt_id(&cell).unwrap_or(cell)),
            quantity: optional(&row.quantity),
            payment_method,
            note: optional(&row.note),
            timestamp: parse_timestamp(&row.timestamp).unwrap_or(now),
            category,
        })
    }

    /// Map every non-blank row
    pub fn map_rows(&self, rows: &[PositionedRow]) -> Vec<Transaction> {
        let now = Utc::now();
        rows.iter()
            .filter_map(|r| self.map_row_at(&r.row, r.position, now))
            .collect()
    }

    /// Zero for anything that is not a non-negative number
    fn parse_amount(&self, cell: &str, row_position: usize) -> Decimal {
        match self.amount_format.parse(cell) {
            Some(amount) if amount.is_sign_negative() && !amount.is_zero() => {
                log::warn!("Row {}: negative amount {:?} treated as 0", row_position, cell);
                Decimal::ZERO
            }
            Some(amount) => amount,
            None => {
                if !cell.trim().is_empty() {
                    log::warn!("Row {}: unparsable amount {:?} treated as 0", row_position, cell);
                }
                Decimal::ZERO
            }
        }
    }

    /// Build the row written back to the sheet
    ///
    /// The stored flag already carries the category override, so a later
    /// read maps to the same direction. The amount is written in the
    /// configured format; a fraction the format cannot express is rejected.
    pub fn to_row(&self, draft: &TransactionDraft, now: DateTime<Utc>) -> CoreResult<RawRow> {
        let direction = self.classifier.apply_override(draft.direction, &draft.category);
        let cell = |value: &Option<String>| value.as_deref().map(str::trim).unwrap_or_default().to_string();
        let amount = self.amount_format.format(draft.amount).ok_or_else(|| CoreError::ValidationError {
            message: format!(
                "Amount {} has a fraction but no decimal separator is configured",
                draft.amount.normalize()
            ),
        })?;

        Ok(RawRow {
            date: draft.date.trim().to_string(),
            category: draft.category.trim().to_string(),
            description: draft.description.trim().to_string(),
            amount,
            direction: direction.to_string(),
            receipt: cell(&draft.receipt_ref),
            timestamp: now.to_rfc3339(),
            sub_category: cell(&draft.sub_category),
            quantity: cell(&draft.quantity),
            payment_method: cell(&draft.payment_method),
            note: cell(&draft.note),
        })
    }
}

impl Default for RowMapper {
    fn default() -> Self {
        Self::new(Arc::new(LedgerClassifier::default()), AmountFormat::default())
    }
}
