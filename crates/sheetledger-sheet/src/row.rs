//! Positional row schema of the ledger sheet

use serde::{Deserialize, Serialize};

/// Number of columns in the ledger sheet
pub const COLUMN_COUNT: usize = 11;

/// Column titles written to a fresh sheet
pub const COLUMN_TITLES: [&str; COLUMN_COUNT] = [
    "Date",
    "Category",
    "Description",
    "Amount",
    "Type",
    "Receipt",
    "Timestamp",
    "Sub-category",
    "Quantity",
    "Payment method",
    "Note",
];

/// One sheet row with named cells
///
/// Cells keep their raw text; missing trailing cells are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    pub date: String,
    pub category: String,
    pub description: String,
    pub amount: String,
    pub direction: String,
    pub receipt: String,
    pub timestamp: String,
    pub sub_category: String,
    pub quantity: String,
    pub payment_method: String,
    pub note: String,
}

impl RawRow {
    /// Build a row from positional cells, padding or truncating to the schema width
    pub fn from_cells<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut cells = cells.into_iter().map(Into::into);
        let mut next = || cells.next().unwrap_or_default();
        RawRow {
            date: next(),
            category: next(),
            description: next(),
            amount: next(),
            direction: next(),
            receipt: next(),
            timestamp: next(),
            sub_category: next(),
            quantity: next(),
            payment_method: next(),
            note: next(),
        }
    }

    /// Cells in sheet order
    pub fn to_cells(&self) -> Vec<String> {
        vec![
            self.date.clone(),
            self.category.clone(),
            self.description.clone(),
            self.amount.clone(),
            self.direction.clone(),
            self.receipt.clone(),
            self.timestamp.clone(),
            self.sub_category.clone(),
            self.quantity.clone(),
            self.payment_method.clone(),
            self.note.clone(),
        ]
    }

    /// A row whose first cell is empty carries no transaction
    pub fn is_blank(&self) -> bool {
        self.date.trim().is_empty()
    }
}

/// A row together with its 1-based position in the backing sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionedRow {
    pub position: usize,
    pub row: RawRow,
}

impl PositionedRow {
    pub fn new(position: usize, row: RawRow) -> Self {
        Self { position, row }
    }
}
