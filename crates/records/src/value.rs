//! Cell values

/// Largest magnitude rendered as an integer without a decimal part
const INTEGRAL_DISPLAY_LIMIT: f64 = 1e15;

/// A single cell of the dataset
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Blank cell, blank string, or spreadsheet error
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// Build a value from raw text (CSV fields), inferring numbers
    pub fn parse_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => CellValue::Number(n),
            _ => CellValue::Text(raw.to_string()),
        }
    }

    /// Whether the value is absent
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(n) => n.is_nan(),
            CellValue::Bool(_) => false,
        }
    }

    /// Plain-text rendering, `None` when absent
    ///
    /// Integral numbers render without a decimal part.
    pub fn as_text(&self) -> Option<String> {
        match self {
            _ if self.is_empty() => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) => Some(format_number(*n)),
            CellValue::Bool(b) => Some(String::from(if *b { "TRUE" } else { "FALSE" })),
            CellValue::Empty => None,
        }
    }

    /// Integer rendering for numeric fields, `None` when absent
    ///
    /// Numbers are truncated toward zero. Text that is not a number is
    /// rendered as plain text.
    pub fn as_integer_text(&self) -> Option<String> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some((n.trunc() as i64).to_string()),
            CellValue::Number(_) => None,
            CellValue::Bool(b) => Some(i64::from(*b).to_string()),
            other => other.as_text(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < INTEGRAL_DISPLAY_LIMIT {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}
