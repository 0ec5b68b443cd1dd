//! Letter rendering from a DOCX template

use crate::config::LayoutConfig;
use crate::fields::ReplacementMap;
use crate::{MergeError, Result};
use docx_core::DocxDocument;
use std::path::Path;

/// Renders one letter per record from a template
///
/// The template is read once; every render parses a fresh copy so no edits
/// leak between records.
#[derive(Debug, Clone)]
pub struct LetterRenderer {
    template: Vec<u8>,
    layout: LayoutConfig,
}

impl LetterRenderer {
    /// Load and validate a template file
    pub fn from_file<P: AsRef<Path>>(path: P, layout: LayoutConfig) -> Result<Self> {
        let path = path.as_ref();
        let template = std::fs::read(path).map_err(|e| MergeError::io(path, e))?;
        Self::from_bytes(template, layout).map_err(|e| match e {
            MergeError::Render(source) => MergeError::Template {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Use template bytes already in memory
    pub fn from_bytes(template: Vec<u8>, layout: LayoutConfig) -> Result<Self> {
        DocxDocument::open_from_bytes(&template)?;
        Ok(Self { template, layout })
    }

    /// Produce the filled-in document and the list of applied replacements
    pub fn render_document(&self, replacements: &ReplacementMap) -> Result<(DocxDocument, Vec<String>)> {
        let mut doc = DocxDocument::open_from_bytes(&self.template)?;
        let changes = doc.replace_placeholders_bold(replacements.pairs());
        doc.set_page_margins(self.layout.margins.into());
        doc.set_body_font_size(self.layout.font_size);
        Ok((doc, changes))
    }

    /// Render and save a letter
    pub fn render<P: AsRef<Path>>(&self, replacements: &ReplacementMap, output: P) -> Result<Vec<String>> {
        let (doc, changes) = self.render_document(replacements)?;
        doc.save(output)?;
        Ok(changes)
    }
}
