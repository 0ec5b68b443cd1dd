//! bonus-bot - generate bonus letters from a spreadsheet and a Word template
//!
//! Usage:
//!   bonus-bot --data employees.xlsx --template letter.docx --output letters/
//!   bonus-bot -d employees.csv -t letter.docx -o letters/ --format docx

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use merge::{spawn_batch, BatchEvent, BatchSummary, ConverterChain, MergeConfig, MergeRequest, OutputFormat};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "bonus-bot", version, about = "Generate personalised bonus letters")]
struct Cli {
    /// Employee data file (.xlsx, .xls, .ods or .csv)
    #[arg(short, long)]
    data: PathBuf,

    /// Word template (.docx) containing {{column}} placeholders
    #[arg(short, long)]
    template: PathBuf,

    /// Folder that receives the dated letters folder
    #[arg(short, long)]
    output: PathBuf,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format, overrides the configuration file
    #[arg(long, value_enum)]
    format: Option<Format>,

    /// LibreOffice executable to try first
    #[arg(long)]
    office_path: Option<PathBuf>,

    /// Keep the .docx next to each converted PDF
    #[arg(long)]
    keep_docx: bool,

    /// Show debug output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Pdf,
    Docx,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Pdf => OutputFormat::Pdf,
            Format::Docx => OutputFormat::Docx,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Logger filter used when `RUST_LOG` is unset
///
/// Batch messages are printed from the event stream, so the logger never
/// repeats them.
fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug,merge::batch=off"
    } else {
        "warn,merge::batch=off"
    }
}

fn init_logging(verbose: bool) {
    let default_filter = default_log_filter(verbose);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

/// Configuration file (or defaults) with command-line overrides applied
fn load_config(cli: &Cli) -> Result<MergeConfig> {
    let mut config = match &cli.config {
        Some(path) => MergeConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => MergeConfig::default(),
    };
    if let Some(format) = cli.format {
        config.output.format = format.into();
    }
    if let Some(path) = &cli.office_path {
        config.converter.office_path = Some(path.clone());
    }
    if cli.keep_docx {
        config.output.keep_intermediate = true;
    }
    Ok(config)
}

fn validate_inputs(cli: &Cli) -> Result<()> {
    if !cli.data.is_file() {
        bail!("Data file not found: {}", cli.data.display());
    }
    if !cli.template.is_file() {
        bail!("Template file not found: {}", cli.template.display());
    }
    if !cli.output.is_dir() {
        bail!("Output folder does not exist: {}", cli.output.display());
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<ExitCode> {
    validate_inputs(cli)?;
    let config = load_config(cli)?;
    let converters = ConverterChain::platform_default(&config.converter);
    log::debug!("Converters: {:?}", converters.names());

    let request = MergeRequest::new(&cli.data, &cli.template, &cli.output);
    let today = Local::now().date_naive();
    let handle = spawn_batch(request, config, converters, today)
        .context("Failed to start letter generation")?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed}]")
            .context("Invalid progress template")?
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    spinner.set_message("Generating letters...");
    spinner.enable_steady_tick(Duration::from_millis(80));

    let mut aborted = false;
    for event in handle.events() {
        match event {
            BatchEvent::Log(line) => spinner.println(line.to_string()),
            BatchEvent::Progress { processed, total } => {
                spinner.set_message(format!("Processed {processed}/{total} rows"))
            }
            BatchEvent::Finished(_) => {}
            BatchEvent::Aborted(_) => aborted = true,
        }
    }
    spinner.finish_and_clear();

    let result = handle.join();
    if aborted {
        // The error line has already been printed from the event stream
        return Ok(ExitCode::FAILURE);
    }
    print_completion(&result?);
    Ok(ExitCode::SUCCESS)
}

fn print_completion(summary: &BatchSummary) {
    println!();
    println!("Bonus letters generated!");
    println!("  Successfully generated: {}", summary.succeeded);
    println!("  Errors: {}", summary.failed);
    println!("  Skipped: {}", summary.skipped);
    println!("  Output location: {}", summary.output_dir.display());
}
