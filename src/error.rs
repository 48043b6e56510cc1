//! Error types for the pdf2xlsx library.
//!
//! Three error types, one per failure scope:
//!
//! * [`Pdf2XlsxError`] — **Fatal**: the batch cannot continue (input
//!   directory missing, unreadable PDF, page index out of range, spreadsheet
//!   write failed). Returned as `Err(Pdf2XlsxError)` from the `convert_*`
//!   functions and aborts every remaining file.
//!
//! * [`PageError`] — **Non-fatal**: the completion call for one page failed.
//!   The page contributes no rows and the error is recorded in
//!   [`crate::output::FileReport::failed_pages`].
//!
//! * [`CompletionError`] — what a [`crate::pipeline::llm::CompletionService`]
//!   returns. The requester turns it into a [`PageError`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2xlsx library.
#[derive(Debug, Error)]
pub enum Pdf2XlsxError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The configured input directory does not exist.
    #[error("Input directory not found: '{path}'\nSet PDF_INPUT_FOLDER or pass --input.")]
    InputDirNotFound { path: PathBuf },

    /// The input directory exists but could not be listed.
    #[error("Failed to read input directory '{path}': {source}")]
    InputDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A PDF listed in the input directory disappeared before it was opened.
    #[error("PDF file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// pdfium could not parse the document.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// The document is encrypted; passwords are not supported.
    #[error("PDF '{path}' is encrypted and requires a password.")]
    PasswordRequired { path: PathBuf },

    /// Requested page index is past the end of the document (0-based).
    #[error("Page index {index} is out of range for '{path}' ({total} pages)")]
    PageOutOfRange {
        path: PathBuf,
        index: usize,
        total: usize,
    },

    /// pdfium returned an error while reading a page's text layer.
    #[error("Text extraction failed for page {page} of '{path}': {detail}")]
    TextExtractionFailed {
        path: PathBuf,
        page: usize,
        detail: String,
    },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium.\n\
  • Place libpdfium in the working directory.\n\
  • Install pdfium system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider could not be created (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create the output directory.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The spreadsheet could not be built or written.
    #[error("Failed to write spreadsheet '{path}': {detail}")]
    WorkbookWriteFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// Stored in [`crate::output::FileReport::failed_pages`]; the page's reply
/// never reaches the parser.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The completion call returned an error.
    #[error("Page {page}: completion call failed: {detail}")]
    CompletionFailed { page: usize, detail: String },
}

impl PageError {
    /// 1-indexed page number the error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::CompletionFailed { page, .. } => *page,
        }
    }
}

/// Error returned by a completion service.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct CompletionError(pub String);

impl CompletionError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_out_of_range_display() {
        let e = Pdf2XlsxError::PageOutOfRange {
            path: PathBuf::from("PDFs/report.pdf"),
            index: 7,
            total: 3,
        };
        let msg = e.to_string();
        assert!(msg.contains("index 7"), "got: {msg}");
        assert!(msg.contains("3 pages"), "got: {msg}");
    }

    #[test]
    fn completion_failed_display() {
        let e = PageError::CompletionFailed {
            page: 2,
            detail: "overloaded".into(),
        };
        assert_eq!(e.page(), 2);
        assert!(e.to_string().contains("Page 2"));
        assert!(e.to_string().contains("overloaded"));
    }

    #[test]
    fn provider_not_configured_display() {
        let e = Pdf2XlsxError::ProviderNotConfigured {
            provider: "anthropic".into(),
            hint: "Set ANTHROPIC_API_KEY".into(),
        };
        assert!(e.to_string().contains("anthropic"));
        assert!(e.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn page_error_serialises() {
        let e = PageError::CompletionFailed {
            page: 1,
            detail: "timeout".into(),
        };
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("CompletionFailed"));
        assert!(json.contains("\"page\":1"));
    }
}
