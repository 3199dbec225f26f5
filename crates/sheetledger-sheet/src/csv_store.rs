//! Ledger sheet backed by a CSV export

use async_trait::async_trait;
use csv::{ReaderBuilder, WriterBuilder};
use std::path::PathBuf;
use tokio::sync::Mutex;

use crate::error::SheetError;
use crate::row::{PositionedRow, RawRow, COLUMN_COUNT, COLUMN_TITLES};
use crate::SheetStore;

/// A sheet stored as a CSV file
///
/// Positions count CSV records, header rows included. Writes rewrite the
/// whole file and are serialized through an internal lock.
#[derive(Debug)]
pub struct CsvSheetStore {
    path: PathBuf,
    header_rows: usize,
    write_lock: Mutex<()>,
}

impl CsvSheetStore {
    pub fn new(path: PathBuf, header_rows: usize) -> Self {
        Self {
            path,
            header_rows,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    async fn load_records(&self) -> Result<Vec<Vec<String>>, SheetError> {
        let content = tokio::fs::read(&self.path).await?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_slice());

        let mut records = Vec::new();
        for record in reader.records() {
            let record = record?;
            records.push(record.iter().map(|cell| cell.to_string()).collect());
        }
        Ok(records)
    }

    /// Like `load_records`, but a missing file becomes a fresh sheet with headers
    async fn load_or_create(&self) -> Result<Vec<Vec<String>>, SheetError> {
        match self.load_records().await {
            Ok(records) => Ok(records),
            Err(SheetError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("Creating new sheet at {}", self.path.display());
                let mut records = Vec::with_capacity(self.header_rows);
                for i in 0..self.header_rows {
                    if i == 0 {
                        records.push(COLUMN_TITLES.iter().map(|t| t.to_string()).collect());
                    } else {
                        records.push(vec![String::new(); COLUMN_COUNT]);
                    }
                }
                Ok(records)
            }
            Err(e) => Err(e),
        }
    }

    async fn store_records(&self, records: &[Vec<String>]) -> Result<(), SheetError> {
        let mut writer = WriterBuilder::new().flexible(true).from_writer(Vec::new());
        for record in records {
            writer.write_record(record)?;
        }
        let bytes = writer.into_inner().map_err(|e| SheetError::IoError(e.into_error()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }

    fn check_position(&self, position: usize, len: usize) -> Result<usize, SheetError> {
        if position <= self.header_rows || position > len {
            return Err(SheetError::RowNotFound { position });
        }
        Ok(position - 1)
    }
}

#[async_trait]
impl SheetStore for CsvSheetStore {
    async fn read_all_rows(&self) -> Result<Vec<PositionedRow>, SheetError> {
        let records = self.load_records().await?;
        let rows = records
            .into_iter()
            .enumerate()
            .skip(self.header_rows)
            .map(|(index, cells)| PositionedRow::new(index + 1, RawRow::from_cells(cells)))
            .collect();
        Ok(rows)
    }

    async fn append_row(&self, row: &RawRow) -> Result<usize, SheetError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load_or_create().await?;
        records.push(row.to_cells());
        self.store_records(&records).await?;
        Ok(records.len())
    }

    async fn update_row(&self, position: usize, row: &RawRow) -> Result<(), SheetError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load_records().await?;
        let index = self.check_position(position, records.len())?;
        records[index] = row.to_cells();
        self.store_records(&records).await
    }

    async fn clear_row(&self, position: usize) -> Result<(), SheetError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load_records().await?;
        let index = self.check_position(position, records.len())?;
        records[index] = vec![String::new(); COLUMN_COUNT];
        self.store_records(&records).await
    }
}
