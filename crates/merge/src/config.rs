//! Merge configuration
//!
//! Every field has a default, so an empty JSON object is a valid
//! configuration and reproduces the standard letter layout.

use crate::{MergeError, Result};
use docx_core::PageMargins;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for a merge run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MergeConfig {
    /// Columns the dataset must contain before any output is produced
    #[serde(default = "default_required_columns")]
    pub required_columns: Vec<String>,

    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub converter: ConverterConfig,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            required_columns: default_required_columns(),
            layout: LayoutConfig::default(),
            output: OutputConfig::default(),
            converter: ConverterConfig::default(),
        }
    }
}

impl MergeConfig {
    /// Parse a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| MergeError::Config(e.to_string()))
    }

    /// Load a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| MergeError::io(path, e))?;
        Self::from_json(&json)
    }
}

fn default_required_columns() -> Vec<String> {
    vec!["full_name".to_string(), "dinar".to_string()]
}

/// Page layout forced on every generated letter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutConfig {
    #[serde(default)]
    pub margins: MarginsConfig,

    /// Font size in points applied to body runs
    #[serde(default = "default_font_size")]
    pub font_size: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margins: MarginsConfig::default(),
            font_size: default_font_size(),
        }
    }
}

fn default_font_size() -> f32 {
    11.0
}

/// Page margins in inches
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MarginsConfig {
    #[serde(default = "default_vertical_margin")]
    pub top: f64,
    #[serde(default = "default_vertical_margin")]
    pub bottom: f64,
    #[serde(default = "default_horizontal_margin")]
    pub left: f64,
    #[serde(default = "default_horizontal_margin")]
    pub right: f64,
}

impl Default for MarginsConfig {
    fn default() -> Self {
        Self {
            top: default_vertical_margin(),
            bottom: default_vertical_margin(),
            left: default_horizontal_margin(),
            right: default_horizontal_margin(),
        }
    }
}

impl From<MarginsConfig> for PageMargins {
    fn from(m: MarginsConfig) -> Self {
        PageMargins::new(m.top, m.bottom, m.left, m.right)
    }
}

fn default_vertical_margin() -> f64 {
    0.5
}

fn default_horizontal_margin() -> f64 {
    0.7
}

/// Final artifact format
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pdf,
    Docx,
}

impl OutputFormat {
    /// File extension of the artifact
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Docx => "docx",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Keep the rendered .docx after a successful PDF conversion
    #[serde(default)]
    pub keep_intermediate: bool,
}

/// PDF converter settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConverterConfig {
    /// Office suite executable tried before the well-known locations
    #[serde(default)]
    pub office_path: Option<PathBuf>,

    /// Try Word automation first (Windows only)
    #[serde(default = "default_true")]
    pub native: bool,

    /// Warn when a converted letter spans more than one page
    #[serde(default = "default_true")]
    pub check_single_page: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            office_path: None,
            native: true,
            check_single_page: true,
        }
    }
}

fn default_true() -> bool {
    true
}
