//! Letter fields and per-record replacement maps

use crate::naming::format_current_date;
use chrono::NaiveDate;
use records::Record;

/// Token replaced by the generation date
pub const CURRENT_DATE_TOKEN: &str = "{{current_date}}";

/// Column holding the employee's display name
pub const DISPLAY_NAME_COLUMN: &str = "full_name";

/// How a column value is rendered into the letter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFormat {
    /// Plain text
    Text,
    /// Whole number, fractional part truncated
    Integer,
}

/// A dataset column that maps to a `{{column}}` token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LetterField {
    pub column: &'static str,
    pub format: FieldFormat,
}

const fn field(column: &'static str, format: FieldFormat) -> LetterField {
    LetterField { column, format }
}

/// Recognized fields, in substitution order
pub const FIELDS: &[LetterField] = &[
    field("full_name", FieldFormat::Text),
    field("first_name", FieldFormat::Text),
    field("job_description", FieldFormat::Text),
    field("branch", FieldFormat::Text),
    field("branch_grams_0000", FieldFormat::Integer),
    field("personal_grams_0000", FieldFormat::Integer),
    field("dinar", FieldFormat::Integer),
    field("value_18ct", FieldFormat::Integer),
    field("value_21ct", FieldFormat::Integer),
];

/// Placeholder token for a column name
pub fn token_for(column: &str) -> String {
    format!("{{{{{column}}}}}")
}

impl LetterField {
    /// Rendered value for a record; absent values become an empty string
    pub fn render(&self, record: &Record) -> String {
        let value = match self.format {
            FieldFormat::Text => record.text(self.column),
            FieldFormat::Integer => record.integer_text(self.column),
        };
        value.unwrap_or_default()
    }
}

/// Ordered token/value pairs for one letter
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReplacementMap {
    pairs: Vec<(String, String)>,
}

impl ReplacementMap {
    /// Build the map for one record
    ///
    /// The date token comes first, then every field in [`FIELDS`] order.
    pub fn for_record(record: &Record, today: NaiveDate) -> Self {
        let mut pairs = Vec::with_capacity(FIELDS.len() + 1);
        pairs.push((CURRENT_DATE_TOKEN.to_string(), format_current_date(today)));
        for field in FIELDS {
            pairs.push((token_for(field.column), field.render(record)));
        }
        Self { pairs }
    }

    /// Token/value pairs in substitution order
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Value for a token
    pub fn get(&self, token: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
