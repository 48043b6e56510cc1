//! Batch orchestration: every PDF in the input directory → one spreadsheet.
//!
//! ## Order
//!
//! Files are processed one at a time in sorted file-name order; pages of a
//! file in increasing index order; rows in the order their lines appear in
//! each reply. With `concurrency > 1` several pages of the same file may be
//! in flight, but results are consumed through an ordered buffer
//! ([`StreamExt::buffered`]), so the row order is unchanged.
//!
//! ## Failure policy
//!
//! | Failure | Effect |
//! |---------|--------|
//! | page text extraction | fatal, aborts the whole batch |
//! | completion call | page skipped, recorded in [`FileReport::failed_pages`] |
//! | empty reply | page contributes zero rows |
//! | spreadsheet write | fatal, aborts the whole batch |

use crate::config::ExtractionConfig;
use crate::error::{PageError, Pdf2XlsxError};
use crate::output::{BatchReport, FileReport, InspectEntry};
use crate::pipeline::extract::{self, PageTextSource, PdfiumTextSource};
use crate::pipeline::llm::{self, CompletionService, ProviderCompletion};
use crate::pipeline::{discover, parse, sheet};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Length of the page-text preview written to the DEBUG log.
const PREVIEW_CHARS: usize = 50;

/// Convert every PDF in `config.input_dir` into a spreadsheet in
/// `config.output_dir`.
///
/// This is the primary entry point. It binds pdfium and resolves the LLM
/// provider from the config, then delegates to [`convert_directory_with`].
///
/// # Errors
/// Returns `Err(Pdf2XlsxError)` for fatal errors only; completion failures
/// are recorded per page in the returned [`BatchReport`].
pub async fn convert_directory(config: &ExtractionConfig) -> Result<BatchReport, Pdf2XlsxError> {
    let source = Arc::new(PdfiumTextSource::new(config.pdfium_lib_path.clone()));
    let service = ProviderCompletion::from_config(config)?;
    convert_directory_with(&source, &service, config).await
}

/// [`convert_directory`] with explicit text source and completion service.
pub async fn convert_directory_with<S, C>(
    source: &Arc<S>,
    service: &C,
    config: &ExtractionConfig,
) -> Result<BatchReport, Pdf2XlsxError>
where
    S: PageTextSource + 'static,
    C: CompletionService,
{
    let start = Instant::now();

    ensure_output_dir(&config.output_dir).await?;
    let pdfs = discover::list_pdfs(&config.input_dir).await?;
    info!(
        "Found {} PDF files in {}",
        pdfs.len(),
        config.input_dir.display()
    );

    let mut batch = BatchReport::default();
    for pdf in &pdfs {
        let report = convert_file_with(source, service, pdf, config).await?;
        batch.push(report);
    }
    batch.duration_ms = start.elapsed().as_millis() as u64;

    info!(
        "Batch complete: {} files, {} rows, {} failed pages, {}ms",
        batch.files.len(),
        batch.total_rows,
        batch.total_failed_pages,
        batch.duration_ms
    );
    Ok(batch)
}

/// Convert one PDF into one spreadsheet in `config.output_dir`.
///
/// The output directory must already exist.
pub async fn convert_file_with<S, C>(
    source: &Arc<S>,
    service: &C,
    pdf_path: &Path,
    config: &ExtractionConfig,
) -> Result<FileReport, Pdf2XlsxError>
where
    S: PageTextSource + 'static,
    C: CompletionService,
{
    let file_name = display_name(pdf_path);
    info!("Processing PDF file: {}", file_name);

    let page_count = count_pages(source, pdf_path).await?;

    let replies: Vec<Result<String, PageError>> = stream::iter(0..page_count)
        .map(move |index| process_page(source, service, pdf_path, index, page_count, config))
        .buffered(config.concurrency.max(1))
        .try_collect()
        .await?;

    let mut rows = Vec::new();
    let mut irregular_lines = 0;
    let mut failed_pages = Vec::new();

    for reply in replies {
        match reply {
            Ok(text) => {
                let stats = parse::append_rows(&text, &mut rows);
                irregular_lines += stats.irregular;
            }
            Err(e) => failed_pages.push(e),
        }
    }

    let output = sheet::output_path_for(pdf_path, &config.output_dir);
    sheet::write_workbook(&output, &rows).await?;

    if !failed_pages.is_empty() {
        warn!(
            "{}: {}/{} pages failed and contributed no rows",
            file_name,
            failed_pages.len(),
            page_count
        );
    }
    info!(
        "Processed {} and saved Excel file to {}",
        file_name,
        output.display()
    );

    Ok(FileReport {
        source: pdf_path.to_path_buf(),
        output,
        page_count,
        rows,
        irregular_lines,
        failed_pages,
    })
}

/// List the PDFs a run would process, with page counts and output names.
///
/// Does not require an LLM provider or API key.
pub async fn inspect_directory(
    config: &ExtractionConfig,
) -> Result<Vec<InspectEntry>, Pdf2XlsxError> {
    let source = Arc::new(PdfiumTextSource::new(config.pdfium_lib_path.clone()));
    inspect_directory_with(&source, config).await
}

/// [`inspect_directory`] with an explicit text source.
pub async fn inspect_directory_with<S>(
    source: &Arc<S>,
    config: &ExtractionConfig,
) -> Result<Vec<InspectEntry>, Pdf2XlsxError>
where
    S: PageTextSource + 'static,
{
    let pdfs = discover::list_pdfs(&config.input_dir).await?;
    let mut entries = Vec::with_capacity(pdfs.len());
    for pdf in pdfs {
        let page_count = count_pages(source, &pdf).await?;
        let output = sheet::output_path_for(&pdf, &config.output_dir);
        entries.push(InspectEntry {
            source: pdf,
            page_count,
            output,
        });
    }
    Ok(entries)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Extract one page and run the completion call on its text.
///
/// The outer `Result` is fatal (extraction); the inner one is the page's
/// completion outcome.
async fn process_page<S, C>(
    source: &Arc<S>,
    service: &C,
    pdf_path: &Path,
    index: usize,
    page_count: usize,
    config: &ExtractionConfig,
) -> Result<Result<String, PageError>, Pdf2XlsxError>
where
    S: PageTextSource + 'static,
    C: CompletionService,
{
    let text = {
        let source = Arc::clone(source);
        let path = pdf_path.to_path_buf();
        tokio::task::spawn_blocking(move || source.page_text(&path, index))
            .await
            .map_err(|e| Pdf2XlsxError::Internal(format!("Extraction task panicked: {}", e)))??
    };
    info!("Extracting text from page {}/{}", index + 1, page_count);
    debug!("Extracted text: {}", extract::preview(&text, PREVIEW_CHARS));

    Ok(llm::request_extraction(
        service,
        index + 1,
        &text,
        config.system_prompt.as_deref(),
        config.max_tokens,
    )
    .await)
}

async fn count_pages<S>(source: &Arc<S>, pdf_path: &Path) -> Result<usize, Pdf2XlsxError>
where
    S: PageTextSource + 'static,
{
    let source = Arc::clone(source);
    let path = pdf_path.to_path_buf();
    tokio::task::spawn_blocking(move || source.page_count(&path))
        .await
        .map_err(|e| Pdf2XlsxError::Internal(format!("Page count task panicked: {}", e)))?
}

/// Create the output directory if it is missing. Idempotent.
async fn ensure_output_dir(dir: &Path) -> Result<(), Pdf2XlsxError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| Pdf2XlsxError::OutputDirFailed {
            path: dir.to_path_buf(),
            source: e,
        })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
