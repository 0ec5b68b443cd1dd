//! DOCX to PDF conversion strategies
//!
//! Converters are tried in order until one succeeds. On Windows the chain
//! starts with Word automation; an office suite running headless is the
//! fallback everywhere.

use crate::config::ConverterConfig;
use crate::{MergeError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Well-known office suite install locations, tried after the configured one
const OFFICE_INSTALL_PATHS: &[&str] = &[
    r"C:\Program Files\LibreOffice\program\soffice.exe",
    r"C:\Program Files (x86)\LibreOffice\program\soffice.exe",
    "/Applications/LibreOffice.app/Contents/MacOS/soffice",
];

/// Office suite commands resolved through `PATH`
const OFFICE_COMMANDS: &[&str] = &["libreoffice", "soffice"];

/// Word's `wdFormatPDF` save format
const WORD_FORMAT_PDF: u32 = 17;

/// A way of turning a DOCX file into a PDF file
pub trait ConverterStrategy: Send {
    /// Display name used in logs and outcomes
    fn name(&self) -> &str;

    /// Whether the converter can run on this machine
    fn is_available(&self) -> bool;

    /// Convert `source` into `target`
    fn convert(&self, source: &Path, target: &Path) -> Result<()>;
}

/// Word driven through PowerShell COM automation (Windows only)
#[derive(Debug, Clone, Default)]
pub struct WordAutomation;

impl WordAutomation {
    pub fn new() -> Self {
        Self
    }

    fn script(source: &Path, target: &Path) -> String {
        format!(
            "$ErrorActionPreference = 'Stop'\n\
             $word = New-Object -ComObject Word.Application\n\
             $word.Visible = $false\n\
             $word.DisplayAlerts = 0\n\
             try {{\n\
             \x20 $doc = $word.Documents.Open({source}, $false, $true)\n\
             \x20 try {{ $doc.SaveAs([ref] {target}, [ref] {format}) }}\n\
             \x20 finally {{ $doc.Close([ref] $false) }}\n\
             }} finally {{\n\
             \x20 $word.Quit()\n\
             \x20 [void][System.Runtime.InteropServices.Marshal]::ReleaseComObject($word)\n\
             }}",
            source = powershell_quote(source),
            target = powershell_quote(target),
            format = WORD_FORMAT_PDF,
        )
    }
}

impl ConverterStrategy for WordAutomation {
    fn name(&self) -> &str {
        "Word automation"
    }

    fn is_available(&self) -> bool {
        cfg!(windows) && which::which("powershell").is_ok()
    }

    fn convert(&self, source: &Path, target: &Path) -> Result<()> {
        if !cfg!(windows) {
            return Err(MergeError::Conversion(
                "Word automation is only available on Windows".to_string(),
            ));
        }

        let source = absolute(source)?;
        let target = absolute(target)?;
        remove_stale_output(&target)?;
        let output = Command::new("powershell")
            .args(["-NoProfile", "-NonInteractive", "-ExecutionPolicy", "Bypass", "-Command"])
            .arg(Self::script(&source, &target))
            .output()
            .map_err(|e| MergeError::Conversion(format!("failed to start PowerShell: {e}")))?;

        if !output.status.success() {
            return Err(MergeError::Conversion(format!(
                "Word automation failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        ensure_output(&target)
    }
}

/// Single-quoted PowerShell string literal
fn powershell_quote(path: &Path) -> String {
    format!("'{}'", path.display().to_string().replace('\'', "''"))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| MergeError::io(path, e))?;
    Ok(cwd.join(path))
}

/// Where to find an office suite executable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Executable {
    /// A file at a fixed location
    Path(PathBuf),
    /// A command looked up on `PATH`
    OnPath(String),
}

impl Executable {
    /// Resolve to a runnable file, `None` when it does not exist
    pub fn resolve(&self) -> Option<PathBuf> {
        match self {
            Executable::Path(path) => path.is_file().then(|| path.clone()),
            Executable::OnPath(name) => which::which(name).ok(),
        }
    }
}

/// An office suite (LibreOffice) converting in headless mode
#[derive(Debug, Clone)]
pub struct OfficeHeadless {
    candidates: Vec<Executable>,
}

impl OfficeHeadless {
    /// Standard candidate list, preceded by an explicit executable if given
    pub fn new(explicit: Option<PathBuf>) -> Self {
        let mut candidates: Vec<Executable> = explicit.into_iter().map(Executable::Path).collect();
        candidates.extend(
            OFFICE_INSTALL_PATHS
                .iter()
                .map(|p| Executable::Path(PathBuf::from(p))),
        );
        candidates.extend(
            OFFICE_COMMANDS
                .iter()
                .map(|c| Executable::OnPath(c.to_string())),
        );
        Self { candidates }
    }

    /// Use exactly these candidates
    pub fn with_candidates(candidates: Vec<Executable>) -> Self {
        Self { candidates }
    }

    pub fn candidates(&self) -> &[Executable] {
        &self.candidates
    }

    /// First candidate that resolves
    pub fn locate(&self) -> Option<PathBuf> {
        self.candidates.iter().find_map(Executable::resolve)
    }
}

impl ConverterStrategy for OfficeHeadless {
    fn name(&self) -> &str {
        "LibreOffice"
    }

    fn is_available(&self) -> bool {
        self.locate().is_some()
    }

    fn convert(&self, source: &Path, target: &Path) -> Result<()> {
        let executable = self.locate().ok_or_else(|| {
            MergeError::Conversion("LibreOffice executable not found".to_string())
        })?;

        let outdir = match target.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let format = target
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("pdf");

        // The office suite names its output after the source file
        let stem = source
            .file_stem()
            .ok_or_else(|| MergeError::Conversion(format!("invalid source {}", source.display())))?;
        let mut produced = outdir.join(stem);
        produced.set_extension(format);

        remove_stale_output(target)?;
        if produced != target {
            remove_stale_output(&produced)?;
        }

        log::debug!("Running {} for {}", executable.display(), source.display());
        let output = Command::new(&executable)
            .args(["--headless", "--convert-to", format, "--outdir"])
            .arg(&outdir)
            .arg(source)
            .output()
            .map_err(|e| {
                MergeError::Conversion(format!("failed to run {}: {e}", executable.display()))
            })?;

        if !output.status.success() {
            return Err(MergeError::Conversion(format!(
                "LibreOffice conversion failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        if produced != target && produced.exists() {
            std::fs::rename(&produced, target).map_err(|e| MergeError::io(&produced, e))?;
        }
        ensure_output(target)
    }
}

/// Delete a file left at an output path by an earlier run
///
/// A converter that exits cleanly without writing must not leave an old
/// file behind that passes for fresh output.
fn remove_stale_output(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            log::debug!("Removed previous output {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(MergeError::io(path, e)),
    }
}

fn ensure_output(target: &Path) -> Result<()> {
    if target.exists() {
        Ok(())
    } else {
        Err(MergeError::Conversion(format!(
            "PDF not generated at {}",
            target.display()
        )))
    }
}

/// One failed or skipped converter in a chain run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionAttempt {
    pub strategy: String,
    /// Whether the converter was available at all
    pub available: bool,
    pub error: String,
}

/// Result of running a converter chain
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConversionOutcome {
    /// Name of the converter that produced the PDF
    pub converted: Option<String>,
    pub attempts: Vec<ConversionAttempt>,
}

impl ConversionOutcome {
    pub fn succeeded(&self) -> bool {
        self.converted.is_some()
    }

    /// Human-readable reason for a failed conversion
    pub fn failure_summary(&self) -> String {
        if self.attempts.iter().all(|a| !a.available) {
            return "No PDF converter found. Please install LibreOffice or Microsoft Word."
                .to_string();
        }
        self.attempts
            .iter()
            .filter(|a| a.available)
            .map(|a| format!("{}: {}", a.strategy, a.error))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Ordered list of converters
#[derive(Default)]
pub struct ConverterChain {
    strategies: Vec<Box<dyn ConverterStrategy>>,
}

impl ConverterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Converters for the current platform
    pub fn platform_default(config: &ConverterConfig) -> Self {
        let mut chain = Self::new();
        if cfg!(windows) && config.native {
            chain.push(WordAutomation::new());
        }
        chain.push(OfficeHeadless::new(config.office_path.clone()));
        chain
    }

    /// Append a converter
    pub fn push<S: ConverterStrategy + 'static>(&mut self, strategy: S) {
        self.strategies.push(Box::new(strategy));
    }

    /// Builder-style [`push`](Self::push)
    pub fn with<S: ConverterStrategy + 'static>(mut self, strategy: S) -> Self {
        self.push(strategy);
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Try each available converter in order until one succeeds
    pub fn convert(&self, source: &Path, target: &Path) -> ConversionOutcome {
        let mut outcome = ConversionOutcome::default();

        for strategy in &self.strategies {
            let name = strategy.name().to_string();
            if !strategy.is_available() {
                log::debug!("{name} is not available");
                outcome.attempts.push(ConversionAttempt {
                    strategy: name,
                    available: false,
                    error: "not available".to_string(),
                });
                continue;
            }

            log::debug!("Converting {} with {name}", source.display());
            let result = remove_stale_output(target).and_then(|()| strategy.convert(source, target));
            match result {
                Ok(()) => {
                    outcome.converted = Some(name);
                    return outcome;
                }
                Err(e) => {
                    log::warn!("{name} conversion failed: {e}");
                    outcome.attempts.push(ConversionAttempt {
                        strategy: name,
                        available: true,
                        error: e.to_string(),
                    });
                }
            }
        }

        outcome
    }
}

impl std::fmt::Debug for ConverterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConverterChain")
            .field("strategies", &self.names())
            .finish()
    }
}

/// Number of pages in a PDF file
pub fn pdf_page_count<P: AsRef<Path>>(path: P) -> Result<usize> {
    let path = path.as_ref();
    let document = lopdf::Document::load(path)
        .map_err(|e| MergeError::Conversion(format!("cannot read {}: {e}", path.display())))?;
    Ok(document.get_pages().len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Scripted {
        name: &'static str,
        available: bool,
        fail: bool,
    }

    impl Scripted {
        fn new(name: &'static str, available: bool, fail: bool) -> Self {
            Self {
                name,
                available,
                fail,
            }
        }
    }

    impl ConverterStrategy for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn convert(&self, _source: &Path, target: &Path) -> Result<()> {
            if self.fail {
                return Err(MergeError::Conversion("boom".to_string()));
            }
            std::fs::write(target, b"%PDF").map_err(|e| MergeError::io(target, e))
        }
    }

    #[test]
    fn test_chain_falls_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.pdf");
        let chain = ConverterChain::new()
            .with(Scripted::new("missing", false, false))
            .with(Scripted::new("broken", true, true))
            .with(Scripted::new("working", true, false));

        let outcome = chain.convert(Path::new("in.docx"), &target);

        assert!(outcome.succeeded());
        assert_eq!(outcome.converted.as_deref(), Some("working"));
        assert_eq!(
            outcome.attempts,
            vec![
                ConversionAttempt {
                    strategy: "missing".to_string(),
                    available: false,
                    error: "not available".to_string(),
                },
                ConversionAttempt {
                    strategy: "broken".to_string(),
                    available: true,
                    error: "Conversion failed: boom".to_string(),
                },
            ]
        );
        assert!(target.exists());
    }

    #[test]
    fn test_chain_stops_at_first_success() {
        let dir = tempfile::tempdir().unwrap();
        let mut chain = ConverterChain::new();
        chain.push(Scripted::new("first", true, false));
        chain.push(Scripted::new("second", true, false));

        let outcome = chain.convert(Path::new("in.docx"), &dir.path().join("out.pdf"));
        assert_eq!(outcome.converted.as_deref(), Some("first"));
        assert!(outcome.attempts.is_empty());
    }

    #[test]
    fn test_failure_summary() {
        let outcome = ConverterChain::new()
            .with(Scripted::new("missing", false, false))
            .convert(Path::new("in.docx"), Path::new("out.pdf"));
        assert!(!outcome.succeeded());
        assert_eq!(
            outcome.failure_summary(),
            "No PDF converter found. Please install LibreOffice or Microsoft Word."
        );

        let outcome = ConverterChain::new()
            .with(Scripted::new("broken", true, true))
            .convert(Path::new("in.docx"), Path::new("out.pdf"));
        assert_eq!(outcome.failure_summary(), "broken: Conversion failed: boom");

        assert_eq!(
            ConversionOutcome::default().failure_summary(),
            "No PDF converter found. Please install LibreOffice or Microsoft Word."
        );
    }

    #[test]
    fn test_office_candidates() {
        let office = OfficeHeadless::new(Some(PathBuf::from("/opt/office/soffice")));
        let candidates = office.candidates();
        assert_eq!(candidates[0], Executable::Path(PathBuf::from("/opt/office/soffice")));
        assert_eq!(
            candidates[1],
            Executable::Path(PathBuf::from(r"C:\Program Files\LibreOffice\program\soffice.exe"))
        );
        assert_eq!(candidates[4], Executable::OnPath("libreoffice".to_string()));
        assert_eq!(candidates[5], Executable::OnPath("soffice".to_string()));
        assert_eq!(candidates.len(), 6);

        assert_eq!(OfficeHeadless::new(None).candidates().len(), 5);
    }

    #[test]
    fn test_office_unavailable_without_executable() {
        let dir = tempfile::tempdir().unwrap();
        let office = OfficeHeadless::with_candidates(vec![
            Executable::Path(dir.path().join("soffice")),
            Executable::OnPath("definitely-not-an-office-suite".to_string()),
        ]);
        assert!(!office.is_available());
        assert!(matches!(
            office.convert(Path::new("a.docx"), &dir.path().join("a.pdf")),
            Err(MergeError::Conversion(_))
        ));
    }

    #[cfg(unix)]
    fn fake_office(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-soffice");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_office_headless_invocation() {
        let dir = tempfile::tempdir().unwrap();
        // args: --headless --convert-to pdf --outdir <dir> <source>
        let script = fake_office(
            dir.path(),
            r#"[ "$1" = "--headless" ] || exit 3
[ "$3" = "pdf" ] || exit 4
name=$(basename "$6")
printf '%%PDF' > "$5/${name%.*}.pdf""#,
        );
        let source = dir.path().join("Jane_Doe_March_2024.docx");
        std::fs::write(&source, b"docx").unwrap();
        let target = dir.path().join("Jane_Doe_March_2024.pdf");

        let office = OfficeHeadless::with_candidates(vec![Executable::Path(script)]);
        assert!(office.is_available());
        office.convert(&source, &target).unwrap();
        assert!(target.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_office_headless_failure_captures_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let script = fake_office(dir.path(), "echo 'source file could not be loaded' >&2\nexit 1");
        let office = OfficeHeadless::with_candidates(vec![Executable::Path(script)]);

        let err = office
            .convert(&dir.path().join("a.docx"), &dir.path().join("a.pdf"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Conversion failed: LibreOffice conversion failed: source file could not be loaded"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_office_headless_missing_output() {
        let dir = tempfile::tempdir().unwrap();
        let script = fake_office(dir.path(), "exit 0");
        let office = OfficeHeadless::with_candidates(vec![Executable::Path(script)]);

        let err = office
            .convert(&dir.path().join("a.docx"), &dir.path().join("a.pdf"))
            .unwrap_err();
        assert!(err.to_string().contains("PDF not generated"));
    }

    #[cfg(unix)]
    #[test]
    fn test_office_silent_exit_leaves_no_stale_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let script = fake_office(dir.path(), "exit 0");
        let source = dir.path().join("Jane_Doe_March_2024.docx");
        let target = dir.path().join("Jane_Doe_March_2024.pdf");
        std::fs::write(&source, b"docx").unwrap();
        std::fs::write(&target, b"letter from last run").unwrap();

        let outcome = ConverterChain::new()
            .with(OfficeHeadless::with_candidates(vec![Executable::Path(script)]))
            .convert(&source, &target);

        assert!(!outcome.succeeded());
        assert!(outcome.attempts[0].error.contains("PDF not generated"));
        assert!(!target.exists());
    }

    struct Silent;

    impl ConverterStrategy for Silent {
        fn name(&self) -> &str {
            "silent"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn convert(&self, _source: &Path, target: &Path) -> Result<()> {
            ensure_output(target)
        }
    }

    #[test]
    fn test_chain_clears_previous_output_before_each_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.pdf");
        std::fs::write(&target, b"old").unwrap();

        let outcome = ConverterChain::new()
            .with(Silent)
            .convert(Path::new("in.docx"), &target);

        assert!(!outcome.succeeded());
        assert_eq!(outcome.attempts.len(), 1);
        assert!(!target.exists());
    }

    #[test]
    fn test_chain_reports_undeletable_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in place of the output file cannot be removed as a file
        let target = dir.path().join("out.pdf");
        std::fs::create_dir(&target).unwrap();

        let outcome = ConverterChain::new()
            .with(Scripted::new("working", true, false))
            .convert(Path::new("in.docx"), &target);

        assert!(!outcome.succeeded());
        assert!(outcome.attempts[0].error.starts_with("IO error at"));
    }

    #[test]
    fn test_word_script_quotes_paths() {
        let script = WordAutomation::script(
            Path::new(r"C:\Letters\O'Neil.docx"),
            Path::new(r"C:\Letters\O'Neil.pdf"),
        );
        assert!(script.contains(r"Open('C:\Letters\O''Neil.docx', $false, $true)"));
        assert!(script.contains(r"SaveAs([ref] 'C:\Letters\O''Neil.pdf', [ref] 17)"));
        assert!(script.contains("$word.Quit()"));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_word_unavailable_off_windows() {
        assert!(!WordAutomation::new().is_available());
        let chain = ConverterChain::platform_default(&ConverterConfig::default());
        assert_eq!(chain.names(), vec!["LibreOffice"]);
    }

    #[test]
    fn test_pdf_page_count_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();
        assert!(pdf_page_count(&path).is_err());
    }
}
