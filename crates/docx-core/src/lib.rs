//! DOCX Core - Low-level WordprocessingML manipulation
//!
//! This crate provides functionality for:
//! - Opening and saving DOCX packages (every part round-trips untouched
//!   unless it is edited)
//! - Walking body, header and footer paragraphs and their runs
//! - Replacing `{{token}}` placeholders, including tokens split across runs
//! - Forcing page margins and body font size
//!
//! # Example
//!
//! ```ignore
//! use docx_core::{DocxDocument, PageMargins};
//!
//! let mut doc = DocxDocument::open("template.docx")?;
//! let changes = doc.replace_placeholders_bold(&[("{{full_name}}", "Jane Doe")]);
//! doc.set_page_margins(PageMargins::new(0.5, 0.5, 0.7, 0.7));
//! doc.set_body_font_size(11.0);
//! doc.save("letter.docx")?;
//! ```

mod document;
mod layout;
mod names;
mod paragraph;
pub mod xml;

pub use document::{DocxDocument, ParagraphInfo, RunInfo};
pub use layout::PageMargins;
pub use xml::{XmlElement, XmlNode, XmlTree};

use thiserror::Error;

/// Errors that can occur during DOCX operations
#[derive(Debug, Error)]
pub enum DocxError {
    #[error("Failed to open DOCX: {0}")]
    OpenError(String),

    #[error("Failed to save DOCX: {0}")]
    SaveError(String),

    #[error("Missing package part: {0}")]
    MissingPart(String),

    #[error("XML error: {0}")]
    XmlError(String),

    #[error("Zip error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for DOCX operations
pub type Result<T> = std::result::Result<T, DocxError>;

/// Which story of the document a paragraph lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartKind {
    Body,
    Header,
    Footer,
}

impl PartKind {
    /// Suffix appended to change descriptions for this part
    pub fn change_suffix(self) -> &'static str {
        match self {
            PartKind::Body => "",
            PartKind::Header => " in header",
            PartKind::Footer => " in footer",
        }
    }
}
