//! Records - tabular dataset loading
//!
//! This crate provides:
//! - Spreadsheet reading (xlsx, xlsm, xls, ods) via the first worksheet
//! - CSV reading
//! - Typed cell values with "absent" semantics for blank cells
//! - Required-column validation
//!
//! # Example
//!
//! ```ignore
//! use records::Dataset;
//!
//! let dataset = Dataset::open("employees.xlsx")?;
//! dataset.require_columns(&["full_name", "dinar"])?;
//! for record in dataset.records() {
//!     println!("{:?}", record.text("full_name"));
//! }
//! ```

mod dataset;
mod reader;
mod value;

pub use dataset::{Dataset, Record};
pub use value::CellValue;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading records
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Data file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Unsupported data file format: {0}")]
    UnsupportedFormat(String),

    #[error("Error reading spreadsheet: {0}")]
    Spreadsheet(String),

    #[error("Error reading CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook has no worksheets")]
    EmptyWorkbook,

    #[error("Missing required columns: {missing:?} (available columns: {available:?})")]
    MissingColumns {
        missing: Vec<String>,
        available: Vec<String>,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for record operations
pub type Result<T> = std::result::Result<T, RecordError>;
