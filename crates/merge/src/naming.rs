//! Output folder and file naming

use chrono::NaiveDate;

/// Characters that cannot appear in a generated file name
const REPLACED_CHARS: &[char] = &[' ', '/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// English month name, e.g. `March`
pub fn month_name(date: NaiveDate) -> String {
    date.format("%B").to_string()
}

/// Date as written in the letter body, `DD/MM/YYYY`
pub fn format_current_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Batch subfolder, e.g. `March 2024 - Bonus Letters`
pub fn output_folder_name(date: NaiveDate) -> String {
    format!("{} {} - Bonus Letters", month_name(date), date.format("%Y"))
}

/// File name without extension, e.g. `Jane_Doe_March_2024`
///
/// Spaces and path separators in the display name become underscores.
pub fn output_base_name(display_name: &str, date: NaiveDate) -> String {
    let name: String = display_name
        .chars()
        .map(|c| if REPLACED_CHARS.contains(&c) { '_' } else { c })
        .collect();
    format!("{name}_{}_{}", month_name(date), date.format("%Y"))
}
