//! Page text extraction via pdfium.
//!
//! ## Why open the document per call?
//!
//! [`PageTextSource::page_text`] takes a path and an index and returns a
//! string; the pdfium document is opened inside the call and dropped before
//! it returns, on success or failure. Nothing pdfium-owned crosses an
//! `.await` or a thread boundary, which keeps the orchestrator free to run
//! the call on tokio's blocking pool.
//!
//! ## Binding order
//!
//! 1. `pdfium_lib_path` from the config (or `PDFIUM_LIB_PATH`)
//! 2. the platform library in the working directory
//! 3. the system library

use crate::error::Pdf2XlsxError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Source of page counts and per-page plain text.
///
/// Implemented by [`PdfiumTextSource`] for real documents. Tests substitute
/// a stub so the orchestrator can run without pdfium.
pub trait PageTextSource: Send + Sync {
    /// Number of pages in the document at `path`.
    fn page_count(&self, path: &Path) -> Result<usize, Pdf2XlsxError>;

    /// Plain text of the zero-based page `index` of the document at `path`.
    fn page_text(&self, path: &Path, index: usize) -> Result<String, Pdf2XlsxError>;
}

/// [`PageTextSource`] backed by the pdfium library.
#[derive(Debug, Clone, Default)]
pub struct PdfiumTextSource {
    lib_path: Option<PathBuf>,
}

impl PdfiumTextSource {
    /// Bind to the library at `lib_path` if given, otherwise fall back to
    /// `PDFIUM_LIB_PATH`, the working directory, then the system library.
    pub fn new(lib_path: Option<PathBuf>) -> Self {
        let lib_path =
            lib_path.or_else(|| std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));
        Self { lib_path }
    }

    /// Check that a pdfium library can be bound, without opening a document.
    pub fn check_binding(&self) -> Result<(), Pdf2XlsxError> {
        self.bind().map(|_| ())
    }

    fn bind(&self) -> Result<Pdfium, Pdf2XlsxError> {
        let bindings = match &self.lib_path {
            Some(path) => Pdfium::bind_to_library(path).map_err(|e| {
                Pdf2XlsxError::PdfiumBindingFailed(format!("{}: {}", path.display(), e))
            })?,
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library())
                .map_err(|e| Pdf2XlsxError::PdfiumBindingFailed(e.to_string()))?,
        };
        Ok(Pdfium::new(bindings))
    }

    fn open<'a>(&self, pdfium: &'a Pdfium, path: &Path) -> Result<PdfDocument<'a>, Pdf2XlsxError> {
        if !path.exists() {
            return Err(Pdf2XlsxError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        pdfium.load_pdf_from_file(path, None).map_err(|e| {
            let err_str = format!("{:?}", e);
            if err_str.contains("Password") || err_str.contains("password") {
                Pdf2XlsxError::PasswordRequired {
                    path: path.to_path_buf(),
                }
            } else {
                Pdf2XlsxError::CorruptPdf {
                    path: path.to_path_buf(),
                    detail: err_str,
                }
            }
        })
    }
}

impl PageTextSource for PdfiumTextSource {
    fn page_count(&self, path: &Path) -> Result<usize, Pdf2XlsxError> {
        let pdfium = self.bind()?;
        let document = self.open(&pdfium, path)?;
        let total = document.pages().len() as usize;
        debug!("PDF loaded: {} ({} pages)", path.display(), total);
        Ok(total)
    }

    fn page_text(&self, path: &Path, index: usize) -> Result<String, Pdf2XlsxError> {
        let pdfium = self.bind()?;
        let document = self.open(&pdfium, path)?;
        let pages = document.pages();
        let total = pages.len() as usize;

        if index >= total {
            return Err(Pdf2XlsxError::PageOutOfRange {
                path: path.to_path_buf(),
                index,
                total,
            });
        }

        let extraction_failed = |detail: String| Pdf2XlsxError::TextExtractionFailed {
            path: path.to_path_buf(),
            page: index + 1,
            detail,
        };

        let page = pages
            .get(index as u16)
            .map_err(|e| extraction_failed(format!("{:?}", e)))?;
        let text = page
            .text()
            .map_err(|e| extraction_failed(format!("{:?}", e)))?
            .all();

        Ok(text)
    }
}

/// First `max_chars` characters of `text`, for debug logging.
pub fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
