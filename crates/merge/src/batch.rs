//! Batch orchestration
//!
//! A batch loads the dataset, validates its columns, renders one letter per
//! record and converts it. One bad record never stops the batch; only
//! dataset, template and output-folder problems abort it.

use crate::config::{MergeConfig, OutputFormat};
use crate::converter::{pdf_page_count, ConverterChain};
use crate::fields::{ReplacementMap, DISPLAY_NAME_COLUMN};
use crate::naming::{output_base_name, output_folder_name};
use crate::renderer::LetterRenderer;
use crate::{MergeError, Result};
use chrono::NaiveDate;
use records::{Dataset, Record};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

/// Name of the background worker thread
const WORKER_THREAD_NAME: &str = "bonus-letters";

/// Inputs of one batch run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequest {
    pub dataset: PathBuf,
    pub template: PathBuf,
    /// Parent directory; the dated subfolder is created inside it
    pub output_dir: PathBuf,
}

impl MergeRequest {
    pub fn new(
        dataset: impl Into<PathBuf>,
        template: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            dataset: dataset.into(),
            template: template.into(),
            output_dir: output_dir.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    /// Marker shown in front of a log line
    pub fn marker(self) -> &'static str {
        match self {
            Severity::Info => "•",
            Severity::Success => "✅",
            Severity::Warning => "⚠️",
            Severity::Error => "❌",
        }
    }
}

/// A progress message for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.severity.marker(), self.message)
    }
}

/// Counts and artifacts of a finished batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub total_rows: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    /// The dated subfolder holding the letters
    pub output_dir: PathBuf,
    /// Final files, in record order, each listed once
    pub artifacts: Vec<PathBuf>,
}

/// Messages sent from the worker while a batch runs
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    Log(LogLine),
    Progress { processed: usize, total: usize },
    Finished(BatchSummary),
    Aborted(String),
}

/// Forwards batch messages to the event channel and the `log` facade
struct Reporter<'a> {
    events: &'a Sender<BatchEvent>,
}

impl Reporter<'_> {
    fn log(&self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Error => log::error!("{message}"),
            Severity::Warning => log::warn!("{message}"),
            Severity::Info | Severity::Success => log::info!("{message}"),
        }
        self.send(BatchEvent::Log(LogLine { severity, message }));
    }

    fn send(&self, event: BatchEvent) {
        // A closed receiver only means nobody is listening any more
        let _ = self.events.send(event);
    }
}

enum RecordOutcome {
    Succeeded(PathBuf),
    Failed,
    Skipped,
}

/// Run a batch on the current thread
///
/// Ends with exactly one `Finished` or `Aborted` event. Fatal errors are
/// also returned.
pub fn run_batch(
    request: &MergeRequest,
    config: &MergeConfig,
    converters: &ConverterChain,
    today: NaiveDate,
    events: &Sender<BatchEvent>,
) -> Result<BatchSummary> {
    let reporter = Reporter { events };

    match execute(request, config, converters, today, &reporter) {
        Ok(summary) => {
            reporter.send(BatchEvent::Finished(summary.clone()));
            Ok(summary)
        }
        Err(e) => {
            reporter.log(Severity::Error, format!("Error: {e}"));
            reporter.send(BatchEvent::Aborted(e.to_string()));
            Err(e)
        }
    }
}

fn execute(
    request: &MergeRequest,
    config: &MergeConfig,
    converters: &ConverterChain,
    today: NaiveDate,
    reporter: &Reporter<'_>,
) -> Result<BatchSummary> {
    let dataset = Dataset::open(&request.dataset)?;
    reporter.log(
        Severity::Info,
        format!("Found {} employees in data file", dataset.len()),
    );

    dataset.require_columns(&config.required_columns)?;

    let renderer = LetterRenderer::from_file(&request.template, config.layout.clone())?;

    let folder_name = output_folder_name(today);
    let output_dir = request.output_dir.join(&folder_name);
    std::fs::create_dir_all(&output_dir).map_err(|e| MergeError::io(&output_dir, e))?;
    reporter.log(Severity::Info, format!("Created output folder: {folder_name}"));

    let total = dataset.len();
    let mut summary = BatchSummary {
        total_rows: total,
        succeeded: 0,
        failed: 0,
        skipped: 0,
        output_dir: output_dir.clone(),
        artifacts: Vec::new(),
    };

    for (index, record) in dataset.records().iter().enumerate() {
        let outcome = process_record(record, &renderer, converters, config, &output_dir, today, reporter);
        match outcome {
            RecordOutcome::Succeeded(path) => {
                summary.succeeded += 1;
                if summary.artifacts.contains(&path) {
                    // Same display name as an earlier row in this batch
                    let file = path.file_name().unwrap_or_default().to_string_lossy();
                    reporter.log(
                        Severity::Warning,
                        format!(
                            "Row {}: {file} replaced a letter generated earlier in this batch",
                            record.row
                        ),
                    );
                } else {
                    summary.artifacts.push(path);
                }
            }
            RecordOutcome::Failed => summary.failed += 1,
            RecordOutcome::Skipped => summary.skipped += 1,
        }
        reporter.send(BatchEvent::Progress {
            processed: index + 1,
            total,
        });
    }

    reporter.log(Severity::Success, "Generation complete!");
    reporter.log(
        Severity::Info,
        format!("Successfully generated: {} documents", summary.succeeded),
    );
    if summary.failed > 0 {
        reporter.log(Severity::Warning, format!("Errors: {} documents", summary.failed));
    }
    if summary.skipped > 0 {
        reporter.log(Severity::Warning, format!("Skipped: {} rows", summary.skipped));
    }
    reporter.log(
        Severity::Info,
        format!("Output location: {}", output_dir.display()),
    );

    Ok(summary)
}

fn process_record(
    record: &Record,
    renderer: &LetterRenderer,
    converters: &ConverterChain,
    config: &MergeConfig,
    output_dir: &Path,
    today: NaiveDate,
    reporter: &Reporter<'_>,
) -> RecordOutcome {
    let Some(display_name) = record.text(DISPLAY_NAME_COLUMN) else {
        reporter.log(
            Severity::Warning,
            format!("Skipping row {}: Missing {DISPLAY_NAME_COLUMN}", record.row),
        );
        return RecordOutcome::Skipped;
    };

    reporter.log(Severity::Info, format!("Processing: {display_name}"));

    let base_name = output_base_name(&display_name, today);
    let docx_path = output_dir.join(format!("{base_name}.docx"));
    let replacements = ReplacementMap::for_record(record, today);

    match renderer.render(&replacements, &docx_path) {
        Ok(changes) => {
            for change in changes {
                log::debug!("{display_name}: {change}");
            }
        }
        Err(e) => {
            reporter.log(
                Severity::Error,
                format!("Error processing {display_name}: {e}"),
            );
            return RecordOutcome::Failed;
        }
    }

    if config.output.format == OutputFormat::Docx {
        reporter.log(Severity::Success, format!("Generated: {base_name}.docx"));
        return RecordOutcome::Succeeded(docx_path);
    }

    let pdf_name = format!("{base_name}.{}", OutputFormat::Pdf.extension());
    let pdf_path = output_dir.join(&pdf_name);
    let outcome = converters.convert(&docx_path, &pdf_path);
    if !outcome.succeeded() {
        reporter.log(
            Severity::Warning,
            format!(
                "Word document created but PDF conversion failed for {display_name}: {}",
                outcome.failure_summary()
            ),
        );
        return RecordOutcome::Failed;
    }

    if config.converter.check_single_page {
        match pdf_page_count(&pdf_path) {
            Ok(pages) if pages > 1 => reporter.log(
                Severity::Warning,
                format!("{pdf_name} spans {pages} pages"),
            ),
            Ok(_) => {}
            Err(e) => log::warn!("Could not check page count of {pdf_name}: {e}"),
        }
    }

    if !config.output.keep_intermediate {
        if let Err(e) = std::fs::remove_file(&docx_path) {
            reporter.log(
                Severity::Warning,
                format!("Could not remove {}: {e}", docx_path.display()),
            );
        }
    }

    reporter.log(Severity::Success, format!("Generated: {pdf_name}"));
    RecordOutcome::Succeeded(pdf_path)
}

/// A batch running on the background worker
#[derive(Debug)]
pub struct BatchHandle {
    events: Receiver<BatchEvent>,
    worker: JoinHandle<Result<BatchSummary>>,
}

impl BatchHandle {
    /// Event stream; ends once the worker has finished
    pub fn events(&self) -> &Receiver<BatchEvent> {
        &self.events
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Wait for the worker and return its result
    pub fn join(self) -> Result<BatchSummary> {
        self.worker
            .join()
            .map_err(|_| MergeError::Worker("batch worker panicked".to_string()))?
    }
}

/// Start a batch on a dedicated background thread
pub fn spawn_batch(
    request: MergeRequest,
    config: MergeConfig,
    converters: ConverterChain,
    today: NaiveDate,
) -> Result<BatchHandle> {
    let (sender, events) = mpsc::channel();
    let worker = thread::Builder::new()
        .name(WORKER_THREAD_NAME.to_string())
        .spawn(move || run_batch(&request, &config, &converters, today, &sender))
        .map_err(|e| MergeError::Worker(e.to_string()))?;
    Ok(BatchHandle { events, worker })
}
