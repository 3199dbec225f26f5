//! Error types for sheetledger-sheet

use thiserror::Error;
use std::io;

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Row not found at position {position}")]
    RowNotFound { position: usize },

    #[error("Sheet unavailable: {message}")]
    Unavailable { message: String },
}
