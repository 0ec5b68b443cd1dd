//! Dataset and record types

use crate::reader;
use crate::value::CellValue;
use crate::{RecordError, Result};
use std::collections::HashMap;
use std::path::Path;

static EMPTY: CellValue = CellValue::Empty;

/// One row of the dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// 1-based data row number (header row excluded)
    pub row: usize,
    fields: HashMap<String, CellValue>,
}

impl Record {
    /// Create a record from column/value pairs
    pub fn new<I, K>(row: usize, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, CellValue)>,
        K: Into<String>,
    {
        Self {
            row,
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Value of a column; `Empty` when the column does not exist
    pub fn value(&self, column: &str) -> &CellValue {
        self.fields.get(column).unwrap_or(&EMPTY)
    }

    /// Whether the column holds a non-absent value
    pub fn is_present(&self, column: &str) -> bool {
        !self.value(column).is_empty()
    }

    /// Plain-text rendering of a column, `None` when absent
    pub fn text(&self, column: &str) -> Option<String> {
        self.value(column).as_text()
    }

    /// Integer rendering of a column, `None` when absent
    pub fn integer_text(&self, column: &str) -> Option<String> {
        self.value(column).as_integer_text()
    }
}

/// A loaded table: header names plus one record per data row
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Dataset {
    /// Load a dataset from a spreadsheet or CSV file
    ///
    /// The reader is chosen by file extension. The first row holds the
    /// column names.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RecordError::NotFound(path.to_path_buf()));
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let rows = match extension.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => reader::read_spreadsheet(path)?,
            "csv" => reader::read_csv(path)?,
            other => return Err(RecordError::UnsupportedFormat(other.to_string())),
        };

        let dataset = Self::from_rows(rows);
        log::debug!(
            "Loaded {} records with columns {:?} from {}",
            dataset.len(),
            dataset.columns,
            path.display()
        );
        Ok(dataset)
    }

    /// Build a dataset from raw rows; the first row is the header row
    ///
    /// Blank header cells are named `Unnamed: <index>` and repeated names get
    /// a `.<n>` suffix, so every column stays addressable.
    pub fn from_rows(rows: Vec<Vec<CellValue>>) -> Self {
        let mut rows = rows.into_iter();
        let Some(header) = rows.next() else {
            return Self::default();
        };

        let mut columns: Vec<String> = Vec::with_capacity(header.len());
        for (index, cell) in header.iter().enumerate() {
            let base = cell
                .as_text()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| format!("Unnamed: {index}"));
            let mut name = base.clone();
            let mut suffix = 1;
            while columns.contains(&name) {
                name = format!("{base}.{suffix}");
                suffix += 1;
            }
            columns.push(name);
        }

        let records = rows
            .enumerate()
            .map(|(index, cells)| {
                let mut cells = cells.into_iter();
                let fields = columns
                    .iter()
                    .map(|column| (column.clone(), cells.next().unwrap_or_default()));
                Record::new(index + 1, fields)
            })
            .collect();

        Self { columns, records }
    }

    /// Column names in file order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Records in file order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no data rows
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Required columns not present in the header, in the order given
    pub fn missing_columns(&self, required: &[impl AsRef<str>]) -> Vec<String> {
        let mut missing = Vec::new();
        for name in required {
            let name: &str = name.as_ref();
            if !self.columns.iter().any(|c| c == name) {
                missing.push(name.to_string());
            }
        }
        missing
    }

    /// Fail with the missing and available column names unless every
    /// required column is present
    pub fn require_columns(&self, required: &[impl AsRef<str>]) -> Result<()> {
        let missing = self.missing_columns(required);
        if missing.is_empty() {
            return Ok(());
        }
        Err(RecordError::MissingColumns {
            missing,
            available: self.columns.clone(),
        })
    }
}
