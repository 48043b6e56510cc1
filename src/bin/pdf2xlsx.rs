//! CLI binary for pdf2xlsx.
//!
//! A thin shim over the library crate: load `.env`, map flags and
//! environment variables to `ExtractionConfig`, set up logging to the
//! console and the log file, run the batch, print a summary.

use anyhow::{Context, Result};
use clap::Parser;
use pdf2xlsx::{convert_directory, inspect_directory, BatchReport, ExtractionConfig};
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Defaults: ./PDFs → ./ExcelFiles, key from ANTHROPIC_API_KEY (or .env)
  pdf2xlsx

  # Explicit directories and a smaller token ceiling
  pdf2xlsx --input reports --output sheets --max-tokens 2000

  # List what would be processed, no API calls
  pdf2xlsx --inspect-only

  # Four pages in flight per file, JSON summary on stdout
  pdf2xlsx --concurrency 4 --json > summary.json

ENVIRONMENT VARIABLES:
  ANTHROPIC_API_KEY       Anthropic API key (read by the provider)
  PDF_INPUT_FOLDER        Input directory            (default ./PDFs)
  EXCEL_OUTPUT_FOLDER     Output directory           (default ./ExcelFiles)
  MAX_TOKENS              Completion token ceiling   (default 4000)
  PDF2XLSX_PROVIDER       edgequake-llm provider     (default anthropic)
  PDF2XLSX_MODEL          Model id                   (default claude-3-opus-20240229)
  PDF2XLSX_LOG_FILE       Log file                   (default pdf2xlsx.log)
  PDFIUM_LIB_PATH         Path to an existing libpdfium
  RUST_LOG                Log filter override

OUTPUT:
  One spreadsheet per PDF, named after the PDF with '.pdf' removed,
  '+' and spaces replaced by '_', and ',' removed. Columns:
  Name | business ID | personnel. Existing files are overwritten.
"#;

/// Extract name, business ID and personnel count from PDFs into spreadsheets.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2xlsx",
    version,
    about = "Extract name, business ID and personnel count from PDFs into spreadsheets",
    long_about = "Reads every PDF in the input directory page by page, asks a language model \
to extract organization name, business ID and personnel count from each page's text, and \
writes one .xlsx per PDF to the output directory.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory scanned for *.pdf files (non-recursive).
    #[arg(short, long, env = "PDF_INPUT_FOLDER", default_value = "./PDFs")]
    input: PathBuf,

    /// Directory receiving one .xlsx per input PDF. Created if missing.
    #[arg(short, long, env = "EXCEL_OUTPUT_FOLDER", default_value = "./ExcelFiles")]
    output: PathBuf,

    /// Max completion tokens per page.
    #[arg(long, env = "MAX_TOKENS", default_value_t = 4000)]
    max_tokens: usize,

    /// LLM provider: anthropic, openai, gemini, ollama, …
    #[arg(long, env = "PDF2XLSX_PROVIDER", default_value = "anthropic")]
    provider: String,

    /// LLM model ID.
    #[arg(long, env = "PDF2XLSX_MODEL", default_value = "claude-3-opus-20240229")]
    model: String,

    /// LLM temperature (0.0–2.0). Provider default when unset.
    #[arg(long, env = "PDF2XLSX_TEMPERATURE")]
    temperature: Option<f32>,

    /// Pages of one file processed at once. Row order is unaffected.
    #[arg(short, long, env = "PDF2XLSX_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "PDF2XLSX_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Path to an existing pdfium library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Log file, appended to on every run.
    #[arg(long, env = "PDF2XLSX_LOG_FILE", default_value = "pdf2xlsx.log")]
    log_file: PathBuf,

    /// List the PDFs and page counts only; no API calls, nothing written.
    #[arg(long)]
    inspect_only: bool,

    /// Print the batch report as JSON on stdout.
    #[arg(long, env = "PDF2XLSX_JSON")]
    json: bool,

    /// Enable DEBUG-level logs.
    #[arg(short, long, env = "PDF2XLSX_VERBOSE")]
    verbose: bool,

    /// Console shows errors only (the log file is unaffected).
    #[arg(short, long, env = "PDF2XLSX_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // `.env` first so clap's env fallbacks see its values.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_logging(&cli)?;
    info!("pdf2xlsx {} is running", env!("CARGO_PKG_VERSION"));

    let config = build_config(&cli).await?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let entries = inspect_directory(&config)
            .await
            .context("Failed to inspect input directory")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&entries).context("Failed to serialise entries")?
            );
        } else {
            for e in &entries {
                println!(
                    "{:<48} {:>4} pages  →  {}",
                    e.source.display(),
                    e.page_count,
                    e.output.display()
                );
            }
            println!("{} PDF files", entries.len());
        }
        return Ok(());
    }

    if config.provider_name_or_default() == "anthropic" {
        let has_key = std::env::var("ANTHROPIC_API_KEY").is_ok_and(|k| !k.is_empty());
        if !has_key {
            warn!("ANTHROPIC_API_KEY is not set; completion requests will fail");
        }
    }

    // ── Run batch ────────────────────────────────────────────────────────
    let report = convert_directory(&config)
        .await
        .context("Batch conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&report);
    }

    Ok(())
}

/// Console + log-file logging. Both layers share the `RUST_LOG` filter
/// (default `info`, `debug` with `--verbose`); `--quiet` limits only the
/// console to errors.
fn init_logging(cli: &Cli) -> Result<()> {
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cli.log_file)
        .with_context(|| format!("Failed to open log file {:?}", cli.log_file))?;

    let console_level = if cli.quiet {
        LevelFilter::ERROR
    } else {
        LevelFilter::TRACE
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_filter(console_level),
        )
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(cli: &Cli) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .input_dir(&cli.input)
        .output_dir(&cli.output)
        .max_tokens(cli.max_tokens)
        .provider_name(&cli.provider)
        .model(&cli.model)
        .concurrency(cli.concurrency);

    if let Some(t) = cli.temperature {
        builder = builder.temperature(t);
    }

    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }

    if let Some(ref path) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(path);
    }

    builder.build().context("Invalid configuration")
}

fn print_summary(report: &BatchReport) {
    for file in &report.files {
        let mark = if file.has_failures() {
            red("✗")
        } else {
            green("✓")
        };
        eprintln!(
            "  {} {}  {} pages  {} rows  →  {}",
            mark,
            file.source.display(),
            file.page_count,
            file.rows.len(),
            bold(&file.output.display().to_string()),
        );
        for failure in &file.failed_pages {
            eprintln!("      {}", red(&failure.to_string()));
        }
    }
    eprintln!(
        "{} files, {} rows, {} failed pages in {}ms",
        report.files.len(),
        report.total_rows,
        report.total_failed_pages,
        report.duration_ms
    );
}
