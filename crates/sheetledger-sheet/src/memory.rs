//! In-memory sheet, for embedding and tests

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::SheetError;
use crate::row::{PositionedRow, RawRow};
use crate::SheetStore;

/// A headerless sheet held in memory; row N lives at index N - 1
#[derive(Debug, Default)]
pub struct MemorySheetStore {
    rows: RwLock<Vec<RawRow>>,
}

impl MemorySheetStore {
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self { rows: RwLock::new(rows) }
    }

    /// Build from positional cell lists
    pub fn from_cells<R, S>(rows: Vec<R>) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(rows.into_iter().map(RawRow::from_cells).collect())
    }

    /// Copy of the current rows
    pub async fn rows(&self) -> Vec<RawRow> {
        self.rows.read().await.clone()
    }
}

#[async_trait]
impl SheetStore for MemorySheetStore {
    async fn read_all_rows(&self) -> Result<Vec<PositionedRow>, SheetError> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .enumerate()
            .map(|(index, row)| PositionedRow::new(index + 1, row.clone()))
            .collect())
    }

    async fn append_row(&self, row: &RawRow) -> Result<usize, SheetError> {
        let mut rows = self.rows.write().await;
        rows.push(row.clone());
        Ok(rows.len())
    }

    async fn update_row(&self, position: usize, row: &RawRow) -> Result<(), SheetError> {
        let mut rows = self.rows.write().await;
        let index = position.checked_sub(1).ok_or(SheetError::RowNotFound { position })?;
        let slot = rows.get_mut(index).ok_or(SheetError::RowNotFound { position })?;
        *slot = row.clone();
        Ok(())
    }

    async fn clear_row(&self, position: usize) -> Result<(), SheetError> {
        self.update_row(position, &RawRow::default()).await
    }
}
