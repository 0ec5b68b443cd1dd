//! DOCX package wrapper

use crate::layout::{self, PageMargins};
use crate::names::WordNames;
use crate::paragraph::{
    for_each_paragraph, for_each_paragraph_mut, paragraph_runs, run_font_size, run_is_bold,
    run_text, substitute_paragraph,
};
use crate::xml::{XmlElement, XmlTree};
use crate::{DocxError, PartKind, Result};
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Package relationships part
const PACKAGE_RELS: &str = "_rels/.rels";

/// Main document part used when the package relationships do not name one
const DEFAULT_MAIN_PART: &str = "word/document.xml";

const REL_OFFICE_DOCUMENT: &str = "/officeDocument";
const REL_HEADER: &str = "/header";
const REL_FOOTER: &str = "/footer";

/// A raw zip entry of the package
#[derive(Debug, Clone)]
struct Entry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
}

/// A parsed WordprocessingML part
#[derive(Debug, Clone)]
struct Part {
    name: String,
    kind: PartKind,
    tree: XmlTree,
    names: WordNames,
}

impl Part {
    fn parse(name: &str, kind: PartKind, data: &[u8]) -> Result<Self> {
        let tree = XmlTree::parse_bytes(data)
            .map_err(|e| DocxError::OpenError(format!("{name}: {e}")))?;
        let names = WordNames::from_tree(&tree);
        Ok(Self {
            name: name.to_string(),
            kind,
            tree,
            names,
        })
    }
}

/// A run as seen by callers (text and the formatting this crate edits)
#[derive(Debug, Clone, PartialEq)]
pub struct RunInfo {
    pub text: String,
    pub bold: bool,
    /// Font size in points when set directly on the run
    pub font_size: Option<f32>,
}

/// A paragraph as seen by callers
#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphInfo {
    pub runs: Vec<RunInfo>,
}

impl ParagraphInfo {
    /// Concatenated text of all runs
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// DOCX document providing high-level operations
///
/// Every zip entry is kept in memory in its original order. Only the main
/// document part and its header and footer parts are parsed; all other parts
/// are written back byte-for-byte.
#[derive(Debug, Clone)]
pub struct DocxDocument {
    entries: Vec<Entry>,
    body: Part,
    headers: Vec<Part>,
    footers: Vec<Part>,
}

impl DocxDocument {
    /// Open a DOCX document from a file path
    ///
    /// # Example
    /// ```ignore
    /// let doc = DocxDocument::open("template.docx")?;
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| DocxError::OpenError(format!("{}: {}", path.display(), e)))?;
        Self::open_from_bytes(&data)
    }

    /// Open a DOCX document from bytes
    pub fn open_from_bytes(data: &[u8]) -> Result<Self> {
        let mut archive =
            ZipArchive::new(Cursor::new(data)).map_err(|e| DocxError::OpenError(e.to_string()))?;

        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut file = archive.by_index(index)?;
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            entries.push(Entry {
                name: file.name().to_string(),
                data,
                compression: file.compression(),
            });
        }

        let main_name = find_entry(&entries, PACKAGE_RELS)
            .and_then(|rels| relationship_targets(&rels.data, "", REL_OFFICE_DOCUMENT).ok())
            .and_then(|targets| targets.into_iter().next())
            .unwrap_or_else(|| DEFAULT_MAIN_PART.to_string());

        let main_entry = find_entry(&entries, &main_name)
            .ok_or_else(|| DocxError::MissingPart(main_name.clone()))?;
        let body = Part::parse(&main_name, PartKind::Body, &main_entry.data)?;

        let (dir, file) = split_part_name(&main_name);
        let rels_name = format!("{dir}_rels/{file}.rels");
        let mut headers = Vec::new();
        let mut footers = Vec::new();

        if let Some(rels) = find_entry(&entries, &rels_name) {
            for (kind, rel_type) in [(PartKind::Header, REL_HEADER), (PartKind::Footer, REL_FOOTER)] {
                for target in relationship_targets(&rels.data, dir, rel_type)? {
                    let Some(entry) = find_entry(&entries, &target) else {
                        log::warn!("Relationship target {target} is missing from the package");
                        continue;
                    };
                    let part = Part::parse(&target, kind, &entry.data)?;
                    match kind {
                        PartKind::Header => headers.push(part),
                        _ => footers.push(part),
                    }
                }
            }
        }

        log::debug!(
            "Opened DOCX: {} entries, main part {}, {} headers, {} footers",
            entries.len(),
            main_name,
            headers.len(),
            footers.len()
        );

        Ok(Self {
            entries,
            body,
            headers,
            footers,
        })
    }

    /// Name of the main document part (e.g., "word/document.xml")
    pub fn main_part_name(&self) -> &str {
        &self.body.name
    }

    /// Names of the parsed parts of a given kind
    pub fn part_names(&self, kind: PartKind) -> Vec<&str> {
        self.parts(kind).map(|p| p.name.as_str()).collect()
    }

    fn parts(&self, kind: PartKind) -> impl Iterator<Item = &Part> {
        let parts: &[Part] = match kind {
            PartKind::Body => std::slice::from_ref(&self.body),
            PartKind::Header => &self.headers,
            PartKind::Footer => &self.footers,
        };
        parts.iter()
    }

    fn all_parts_mut(&mut self) -> impl Iterator<Item = &mut Part> {
        std::iter::once(&mut self.body)
            .chain(self.headers.iter_mut())
            .chain(self.footers.iter_mut())
    }

    /// Paragraphs of every part of a given kind, with their runs
    pub fn paragraphs(&self, kind: PartKind) -> Vec<ParagraphInfo> {
        let mut out = Vec::new();
        for part in self.parts(kind) {
            let names = &part.names;
            for_each_paragraph(&part.tree.root, names, &mut |p: &XmlElement| {
                let runs = paragraph_runs(p, names)
                    .into_iter()
                    .map(|run| RunInfo {
                        text: run_text(run, names),
                        bold: run_is_bold(run, names),
                        font_size: run_font_size(run, names),
                    })
                    .collect();
                out.push(ParagraphInfo { runs });
            });
        }
        out
    }

    /// Concatenated text of each paragraph of a given kind
    pub fn paragraph_texts(&self, kind: PartKind) -> Vec<String> {
        self.paragraphs(kind).iter().map(ParagraphInfo::text).collect()
    }

    /// Replace placeholder tokens in body, header and footer paragraphs.
    ///
    /// For each paragraph, the text of all runs is concatenated and every
    /// token found as a literal substring is replaced by its value. A
    /// paragraph with at least one match is collapsed to a single bold run
    /// carrying the substituted text; paragraphs without matches keep their
    /// runs and formatting. Returns one human-readable line per applied token.
    pub fn replace_placeholders_bold<K, V>(&mut self, replacements: &[(K, V)]) -> Vec<String>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut changes = Vec::new();

        for part in self.all_parts_mut() {
            let suffix = part.kind.change_suffix();
            let names = &part.names;
            for_each_paragraph_mut(&mut part.tree.root, names, &mut |p: &mut XmlElement| {
                for (token, value) in substitute_paragraph(p, names, replacements) {
                    changes.push(format!("Replaced {token} with {value}{suffix}"));
                }
            });
        }

        changes
    }

    /// Force margins on the first section
    pub fn set_page_margins(&mut self, margins: PageMargins) {
        layout::set_page_margins(&mut self.body.tree.root, &self.body.names, margins);
    }

    /// Margins of the first section, if the document declares them
    pub fn page_margins(&self) -> Option<PageMargins> {
        layout::page_margins(&self.body.tree.root, &self.body.names)
    }

    /// Force a font size (points) on every run of every body paragraph
    pub fn set_body_font_size(&mut self, points: f32) {
        layout::set_body_font_size(&mut self.body.tree.root, &self.body.names, points);
    }

    /// Serialize the package to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        for entry in &self.entries {
            let compression = match entry.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = SimpleFileOptions::default().compression_method(compression);

            if entry.name.ends_with('/') {
                writer
                    .add_directory(entry.name.as_str(), options)
                    .map_err(|e| DocxError::SaveError(e.to_string()))?;
                continue;
            }

            writer
                .start_file(entry.name.as_str(), options)
                .map_err(|e| DocxError::SaveError(e.to_string()))?;

            match self.parsed_part(&entry.name) {
                Some(part) => writer.write_all(&part.tree.to_bytes()?)?,
                None => writer.write_all(&entry.data)?,
            }
        }

        let cursor = writer
            .finish()
            .map_err(|e| DocxError::SaveError(e.to_string()))?;
        Ok(cursor.into_inner())
    }

    /// Save the document to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)
            .map_err(|e| DocxError::SaveError(format!("{}: {}", path.display(), e)))
    }

    fn parsed_part(&self, name: &str) -> Option<&Part> {
        std::iter::once(&self.body)
            .chain(self.headers.iter())
            .chain(self.footers.iter())
            .find(|part| part.name == name)
    }
}

fn find_entry<'a>(entries: &'a [Entry], name: &str) -> Option<&'a Entry> {
    entries.iter().find(|e| e.name == name)
}

/// Split "word/document.xml" into ("word/", "document.xml")
fn split_part_name(name: &str) -> (&str, &str) {
    match name.rfind('/') {
        Some(pos) => (&name[..=pos], &name[pos + 1..]),
        None => ("", name),
    }
}

/// Targets of relationships whose type ends with `type_suffix`, resolved to
/// package part names relative to `base_dir`
fn relationship_targets(rels: &[u8], base_dir: &str, type_suffix: &str) -> Result<Vec<String>> {
    let tree = XmlTree::parse_bytes(rels)?;
    let mut targets = Vec::new();

    for rel in tree.root.child_elements() {
        if rel.local_name() != "Relationship" {
            continue;
        }
        if rel.attribute("TargetMode") == Some("External") {
            continue;
        }
        let (Some(rel_type), Some(target)) = (rel.attribute("Type"), rel.attribute("Target")) else {
            continue;
        };
        if rel_type.ends_with(type_suffix) {
            targets.push(resolve_target(base_dir, target));
        }
    }

    Ok(targets)
}

/// Resolve a relationship target against the source part's directory
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}
