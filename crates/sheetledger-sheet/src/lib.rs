//! Spreadsheet row boundary
//!
//! Raw rows as they come out of the ledger sheet, the parsers for their
//! loosely-typed cells, and the [`SheetStore`] collaborator through which
//! rows are read and written.

use async_trait::async_trait;
use std::sync::Arc;

pub mod cells;
pub mod csv_store;
pub mod date;
pub mod error;
pub mod memory;
pub mod row;

pub use cells::{extract_receipt_id, parse_quantity, parse_timestamp, AmountFormat};
pub use csv_store::CsvSheetStore;
pub use date::{CalendarDate, DateNormalizer, DateStrategy};
pub use error::SheetError;
pub use memory::MemorySheetStore;
pub use row::{PositionedRow, RawRow, COLUMN_COUNT, COLUMN_TITLES};

// ==================== Store Trait ====================

/// Store reference type
pub type StoreRef = Arc<dyn SheetStore>;

/// Row-addressed access to one ledger sheet
///
/// Positions are 1-based and include header rows, matching what a
/// spreadsheet shows in its row gutter.
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Read every data row with its position
    async fn read_all_rows(&self) -> Result<Vec<PositionedRow>, SheetError>;

    /// Append a row and return its position
    async fn append_row(&self, row: &RawRow) -> Result<usize, SheetError>;

    /// Overwrite the row at `position`
    async fn update_row(&self, position: usize, row: &RawRow) -> Result<(), SheetError>;

    /// Blank out the row at `position`, leaving later positions untouched
    async fn clear_row(&self, position: usize) -> Result<(), SheetError>;
}
