//! Raw row readers for spreadsheet and CSV files

use crate::value::CellValue;
use crate::{RecordError, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

/// Read every row of the first worksheet
pub(crate) fn read_spreadsheet(path: &Path) -> Result<Vec<Vec<CellValue>>> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| RecordError::Spreadsheet(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(RecordError::EmptyWorkbook)?
        .map_err(|e| RecordError::Spreadsheet(e.to_string()))?;

    let rows = range
        .rows()
        .map(|row| row.iter().map(convert_cell).collect())
        .collect();
    Ok(rows)
}

/// Convert a calamine cell to a [`CellValue`]
///
/// Error cells (`#N/A`, `#DIV/0!`) count as absent. Date cells keep their
/// serial number.
fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => {
            if s.trim().is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(s.clone())
            }
        }
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

/// Read every row of a CSV file, header included
pub(crate) fn read_csv(path: &Path) -> Result<Vec<Vec<CellValue>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let row = record
            .iter()
            .map(|field| {
                // Header names are kept verbatim, data fields infer numbers
                if index == 0 {
                    CellValue::Text(field.trim_start_matches('\u{feff}').to_string())
                } else {
                    CellValue::parse_text(field)
                }
            })
            .collect();
        rows.push(row);
    }
    Ok(rows)
}
