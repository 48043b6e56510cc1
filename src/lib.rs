//! # pdf2xlsx
//!
//! Extract organization name, business ID and personnel count from PDF
//! reports with a large language model, and write one spreadsheet per PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDFs/
//!  │
//!  ├─ 1. Discover  *.pdf in the input directory, sorted by name
//!  ├─ 2. Extract   plain text of each page via pdfium
//!  ├─ 3. Request   one completion call per page (claude-3-opus by default)
//!  ├─ 4. Parse     reply lines → comma fields → rows (first three fields)
//!  └─ 5. Write     ExcelFiles/<sanitized name>.xlsx
//!                  columns: Name | business ID | personnel
//! ```
//!
//! Pages whose completion call fails contribute no rows; they are listed in
//! [`FileReport::failed_pages`]. Extraction and write failures abort the
//! batch.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2xlsx::{convert_directory, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider key read from ANTHROPIC_API_KEY
//!     let config = ExtractionConfig::builder()
//!         .input_dir("PDFs")
//!         .output_dir("ExcelFiles")
//!         .build()?;
//!     let report = convert_directory(&config).await?;
//!     eprintln!("{} files, {} rows", report.files.len(), report.total_rows);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2xlsx` binary (clap + anyhow + tracing-subscriber + dotenvy) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use convert::{
    convert_directory, convert_directory_with, convert_file_with, inspect_directory,
    inspect_directory_with,
};
pub use error::{CompletionError, PageError, Pdf2XlsxError};
pub use output::{BatchReport, FileReport, InspectEntry, Row, COLUMNS};
pub use pipeline::extract::{PageTextSource, PdfiumTextSource};
pub use pipeline::llm::{CompletionService, ProviderCompletion};
