//! Merge - bonus letter generation
//!
//! This crate provides:
//! - Per-record replacement maps for the letter tokens
//! - Output folder and file naming
//! - Rendering of a DOCX template into one document per employee
//! - PDF conversion through an ordered chain of converter strategies
//! - The batch orchestrator and its background worker
//!
//! # Example
//!
//! ```ignore
//! use merge::{spawn_batch, BatchEvent, ConverterChain, MergeConfig, MergeRequest};
//!
//! let config = MergeConfig::default();
//! let converters = ConverterChain::platform_default(&config.converter);
//! let request = MergeRequest::new("employees.xlsx", "letter.docx", "out");
//! let handle = spawn_batch(request, config, converters, today)?;
//! for event in handle.events() {
//!     if let BatchEvent::Log(line) = event {
//!         println!("{line}");
//!     }
//! }
//! let summary = handle.join()?;
//! ```

mod batch;
mod config;
mod converter;
mod fields;
mod naming;
mod renderer;

pub use batch::{
    run_batch, spawn_batch, BatchEvent, BatchHandle, BatchSummary, LogLine, MergeRequest,
    Severity,
};
pub use config::{
    ConverterConfig, LayoutConfig, MarginsConfig, MergeConfig, OutputConfig, OutputFormat,
};
pub use converter::{
    pdf_page_count, ConversionAttempt, ConversionOutcome, ConverterChain, ConverterStrategy,
    Executable, OfficeHeadless, WordAutomation,
};
pub use fields::{
    token_for, FieldFormat, LetterField, ReplacementMap, CURRENT_DATE_TOKEN, DISPLAY_NAME_COLUMN,
    FIELDS,
};
pub use naming::{format_current_date, month_name, output_base_name, output_folder_name};
pub use renderer::LetterRenderer;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while generating letters
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("Error loading template {}: {source}", path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: docx_core::DocxError,
    },

    #[error(transparent)]
    Records(#[from] records::RecordError),

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Render error: {0}")]
    Render(#[from] docx_core::DocxError),

    #[error("Conversion failed: {0}")]
    Conversion(String),

    #[error("Batch worker failed: {0}")]
    Worker(String),
}

impl MergeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MergeError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for merge operations
pub type Result<T> = std::result::Result<T, MergeError>;
